use crate::aggregate::{rank_by, GroupAggregate, RankMetric};
use serde::Serialize;

/// A supplier's slice of the filtered market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareEntry {
    pub supplier: String,
    pub total_value: f64,
    pub contract_count: usize,
    pub share_pct: f64,
    pub cumulative_share_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConcentrationRatios {
    pub cr4: f64,
    pub cr10: f64,
    pub hhi: f64,
    pub structure: MarketStructure,
}

/// Reading of the HHI using the usual antitrust thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketStructure {
    Unconcentrated,
    ModeratelyConcentrated,
    HighlyConcentrated,
}

impl MarketStructure {
    pub fn from_hhi(hhi: f64) -> Self {
        if hhi < 1500.0 {
            MarketStructure::Unconcentrated
        } else if hhi <= 2500.0 {
            MarketStructure::ModeratelyConcentrated
        } else {
            MarketStructure::HighlyConcentrated
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketStructure::Unconcentrated => "Não concentrado",
            MarketStructure::ModeratelyConcentrated => "Moderadamente concentrado",
            MarketStructure::HighlyConcentrated => "Altamente concentrado",
        }
    }
}

/// `value / total * 100`, or 0 when the total is 0.
pub fn share_pct(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value / total * 100.0
    }
}

/// Mean contract value; 0 for an empty group.
pub fn average_ticket(total_value: f64, contract_count: usize) -> f64 {
    if contract_count == 0 {
        0.0
    } else {
        total_value / contract_count as f64
    }
}

/// Share and running cumulative share per supplier, largest first.
pub fn market_share(groups: &[GroupAggregate<String>], grand_total: f64) -> Vec<ShareEntry> {
    let ranked = rank_by(groups.to_vec(), RankMetric::TotalValue);
    let mut cumulative = 0.0;
    ranked
        .into_iter()
        .map(|g| {
            let share = share_pct(g.total_value, grand_total);
            cumulative += share;
            ShareEntry {
                supplier: g.key,
                total_value: g.total_value,
                contract_count: g.contract_count,
                share_pct: share,
                cumulative_share_pct: cumulative,
            }
        })
        .collect()
}

/// The first `n` groups by `metric`, or all of them if there are fewer.
pub fn top_n<K: Ord + Clone>(groups: &[GroupAggregate<K>], metric: RankMetric, n: usize) -> Vec<GroupAggregate<K>> {
    let mut ranked = rank_by(groups.to_vec(), metric);
    ranked.truncate(n);
    ranked
}

/// CRk: summed share of the `k` largest suppliers. Expects entries in the
/// order [`market_share`] returns them.
pub fn concentration_ratio(shares: &[ShareEntry], k: usize) -> f64 {
    shares.iter().take(k).map(|s| s.share_pct).sum()
}

/// Herfindahl–Hirschman index on percentage shares (0 to 10 000).
pub fn herfindahl_index(shares: &[ShareEntry]) -> f64 {
    shares.iter().map(|s| s.share_pct * s.share_pct).sum()
}

pub fn concentration(shares: &[ShareEntry]) -> ConcentrationRatios {
    let hhi = herfindahl_index(shares);
    ConcentrationRatios {
        cr4: concentration_ratio(shares, 4),
        cr10: concentration_ratio(shares, 10),
        hhi,
        structure: MarketStructure::from_hhi(hhi),
    }
}

/// How many of the largest suppliers it takes to reach `threshold_pct` of
/// the spend. `None` when the threshold is never reached (e.g. no spend).
pub fn suppliers_to_reach(shares: &[ShareEntry], threshold_pct: f64) -> Option<usize> {
    shares
        .iter()
        .position(|s| s.cumulative_share_pct + 1e-9 >= threshold_pct)
        .map(|idx| idx + 1)
}
