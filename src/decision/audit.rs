//! Size-bounded audit trail for the decision pack.

use serde::Serialize;

use crate::economics::audit::{NAMED_SUMS, ids, reconcile_sum};
use crate::economics::{AuditLineItem, Reconciliation};

/// Default line-item cap.
pub const DEFAULT_AUDIT_CAP: usize = 40;

/// Ids kept regardless of the cap.
pub const MUST_INCLUDE: [&str; 8] = [
    ids::CAPEX_TOTAL,
    ids::OPEX_TOTAL,
    ids::SAVINGS_DEMAND,
    ids::SAVINGS_ENERGY,
    ids::SAVINGS_TOTAL,
    ids::YEAR0,
    ids::NET_ANNUAL,
    ids::NPV,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundedAudit {
    pub cap: usize,
    /// Kept items, sorted by id.
    pub items: Vec<AuditLineItem>,
    /// Size of the full audit.
    pub total_items: usize,
    pub truncated: bool,
    /// Reconciliation over the full audit, when any named sum is known.
    pub reconcile: Option<Reconciliation>,
}

fn magnitude(item: &AuditLineItem) -> f64 {
    item.amount_usd_raw.map_or(0.0, f64::abs)
}

/// Bounds `items` to `cap`.
///
/// Must-include ids are always kept; the rest fill by largest absolute amount,
/// ties broken by id.
pub fn bound(items: &[AuditLineItem], cap: usize) -> BoundedAudit {
    let (mut kept, mut rest): (Vec<&AuditLineItem>, Vec<&AuditLineItem>) =
        items.iter().partition(|i| MUST_INCLUDE.contains(&i.id));
    rest.sort_by(|a, b| {
        magnitude(b)
            .total_cmp(&magnitude(a))
            .then_with(|| a.id.cmp(b.id))
    });
    let room = cap.saturating_sub(kept.len());
    kept.extend(rest.into_iter().take(room));
    kept.sort_by(|a, b| a.id.cmp(b.id));

    // Savings is the headline sum; fall back to the others in order.
    let reconcile = [NAMED_SUMS[2], NAMED_SUMS[0], NAMED_SUMS[1]]
        .into_iter()
        .find_map(|(total, parts)| reconcile_sum(items, total, parts));

    BoundedAudit {
        cap,
        truncated: kept.len() < items.len(),
        total_items: items.len(),
        items: kept.into_iter().cloned().collect(),
        reconcile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &'static str, amount: Option<f64>) -> AuditLineItem {
        AuditLineItem::new(id, "x", amount, "test", "test")
    }

    fn full() -> Vec<AuditLineItem> {
        vec![
            item(ids::CAPEX_HARDWARE, Some(100_000.0)),
            item(ids::CAPEX_INSTALL, Some(15_000.0)),
            item(ids::CAPEX_TOTAL, Some(115_000.0)),
            item(ids::ITC, Some(34_500.0)),
            item(ids::SGIP, None),
            item(ids::SAVINGS_DEMAND, Some(24_000.0)),
            item(ids::SAVINGS_ENERGY, Some(3_000.0)),
            item(ids::SAVINGS_TOTAL, Some(27_000.0)),
            item(ids::NPV, Some(50_000.0)),
        ]
    }

    #[test]
    fn keeps_must_include_then_largest() {
        let b = bound(&full(), 6);
        let ids_kept: Vec<&str> = b.items.iter().map(|i| i.id).collect();
        assert!(ids_kept.contains(&ids::SAVINGS_ENERGY));
        assert!(ids_kept.contains(&ids::CAPEX_HARDWARE));
        assert!(!ids_kept.contains(&ids::CAPEX_INSTALL));
        assert!(b.truncated);
        assert_eq!(b.total_items, 9);
        assert!(b.items.windows(2).all(|w| w[0].id <= w[1].id));
    }

    #[test]
    fn must_include_survives_tiny_cap() {
        let b = bound(&full(), 1);
        assert_eq!(b.items.len(), 5);
    }

    #[test]
    fn reconcile_uses_full_audit() {
        let b = bound(&full(), 40);
        assert!(!b.truncated);
        let r = b.reconcile.unwrap();
        assert_eq!(r.id, ids::SAVINGS_TOTAL);
        assert!(r.ok);
        assert!(r.delta <= r.tolerance);
    }
}
