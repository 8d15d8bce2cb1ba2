//! `storage-sizer` entry point: load a scenario, run the sizing pipeline, write outputs.

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;

use storage_sizer::cli::Args;
use storage_sizer::config::ScenarioConfig;
use storage_sizer::decision;
use storage_sizer::io::export::{export_candidates_csv, export_pack_json, export_trace_csv};
use storage_sizer::telemetry::init_tracing;

fn load_scenario(args: &Args) -> anyhow::Result<ScenarioConfig> {
    // --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(path) = &args.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(name) = &args.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };
    if let Some(seed) = args.seed {
        scenario.site.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("scenario has {} invalid field(s)", errors.len());
    }
    Ok(scenario)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let scenario = load_scenario(&args)?;
    let mut request = scenario.to_request();
    request.record_trace = args.dispatch_out.is_some();
    let pack = decision::run(&request);

    if args.json {
        println!("{}", pack.to_json().context("serialising decision pack")?);
    } else {
        println!("{pack}");
    }

    if let Some(path) = &args.pack_out {
        export_pack_json(&pack, path)
            .with_context(|| format!("writing decision pack to {}", path.display()))?;
        info!(path = %path.display(), "decision pack written");
    }
    if let Some(path) = &args.dispatch_out {
        export_trace_csv(&pack.selected_trace, path)
            .with_context(|| format!("writing dispatch trace to {}", path.display()))?;
        info!(path = %path.display(), rows = pack.selected_trace.len(), "dispatch trace written");
    }
    if let Some(path) = &args.candidates_out {
        export_candidates_csv(&pack.ranked, path)
            .with_context(|| format!("writing candidate table to {}", path.display()))?;
        info!(path = %path.display(), rows = pack.ranked.len(), "candidate table written");
    }
    Ok(())
}
