//! JSON and CSV export of decision packs.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::decision::{CandidateSummary, DecisionPack};
use crate::dispatch::DispatchStep;

/// Column header for the dispatch trace export.
const TRACE_HEADER: &str = "timestamp,period_id,price_per_kwh,load_kw,adjusted_kw,\
                            action,energy_kwh,stored_kwh";

/// Column header for the ranked candidate table.
const CANDIDATE_HEADER: &str = "rank,candidate_id,kw,kwh,duration_h,score,accepted,\
                                rejections,confidence_tier,capex_usd,savings_annual_usd,\
                                net_annual_usd,npv_usd,simple_payback_years";

fn opt(v: Option<f64>, dp: usize) -> String {
    v.map_or_else(String::new, |x| format!("{x:.dp$}"))
}

/// Writes the pack as pretty JSON to a file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation, serialisation or writing fails.
pub fn export_pack_json(pack: &DecisionPack, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_pack_json(pack, io::BufWriter::new(file))
}

/// Writes the pack as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns an `io::Error` if serialisation or writing fails.
pub fn write_pack_json(pack: &DecisionPack, mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, pack)?;
    writeln!(writer)?;
    writer.flush()
}

/// Exports a dispatch trace to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_trace_csv(steps: &[DispatchStep], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_trace_csv(steps, io::BufWriter::new(file))
}

/// Writes one row per dispatched interval. Output is deterministic.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_trace_csv(steps: &[DispatchStep], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(TRACE_HEADER.split(',').map(str::trim))?;
    for s in steps {
        wtr.write_record(&[
            s.timestamp.to_rfc3339(),
            s.period_id.clone(),
            opt(s.price_per_kwh, 5),
            format!("{:.4}", s.load_kw),
            format!("{:.4}", s.adjusted_kw),
            s.action.to_string(),
            format!("{:.4}", s.energy_kwh),
            format!("{:.4}", s.stored_kwh),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports the ranked candidate table to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_candidates_csv(rows: &[CandidateSummary], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_candidates_csv(rows, io::BufWriter::new(file))
}

/// Writes one row per ranked candidate; unknown figures are empty cells.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_candidates_csv(rows: &[CandidateSummary], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(CANDIDATE_HEADER.split(',').map(str::trim))?;
    for c in rows {
        wtr.write_record(&[
            c.rank.to_string(),
            c.candidate_id.clone(),
            c.kw.to_string(),
            c.kwh.to_string(),
            c.duration_h.to_string(),
            format!("{:.6}", c.score),
            c.accepted.to_string(),
            c.rejections.join(";"),
            c.confidence_tier.to_string(),
            opt(c.capex_usd, 2),
            opt(c.savings_annual.total, 2),
            opt(c.net_annual_usd, 2),
            opt(c.npv_usd, 2),
            opt(c.simple_payback_years, 3),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
