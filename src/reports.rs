use crate::aggregate::{
    aggregate, aggregate_by_supplier, by_start_year, grand_total, DateSpan, GroupAggregate, RankMetric,
};
use crate::analysis::{
    average_ticket, concentration, market_share, share_pct, suppliers_to_reach, top_n, ConcentrationRatios,
    ShareEntry,
};
use crate::config::AnalysisConfig;
use crate::filters::{ContractFilter, FilterSet};
use crate::types::{
    ContractRecord, MarketShareRow, ScatterRow, SupplierCountRow, SupplierDetailRow, SupplierValueRow, YearRow,
};
use crate::util::{format_currency, format_date, format_int, format_pct};
use chrono::{Days, NaiveDate};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Window for the "expiring soon" KPI.
pub const EXPIRING_WINDOW_DAYS: u64 = 90;

/// Spend share used for the Pareto headline.
pub const PARETO_THRESHOLD_PCT: f64 = 80.0;

/// Headline figures for the globally filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_value: f64,
    pub contract_count: usize,
    pub supplier_count: usize,
    pub average_ticket: f64,
    pub active_today: usize,
    pub expiring_soon: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSupplier {
    pub rank: usize,
    pub supplier: String,
    pub total_value: f64,
    pub contract_count: usize,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierDetail {
    pub supplier: String,
    pub total_value: f64,
    pub contract_count: usize,
    pub earliest_start: Option<NaiveDate>,
    pub latest_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub supplier: String,
    pub contract_count: usize,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub total_value: f64,
    pub contract_count: usize,
}

/// The yearly series, or an explicit signal that no filtered contract has a
/// start year to plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "points", rename_all = "snake_case")]
pub enum TimeSeries {
    Ready(Vec<YearTotal>),
    InsufficientData,
}

/// Every result set the presentation layer draws from one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardResults {
    pub kpis: Kpis,
    pub top_by_value: Vec<RankedSupplier>,
    pub top_by_count: Vec<RankedSupplier>,
    pub top_details: Vec<SupplierDetail>,
    pub market_share: Vec<ShareEntry>,
    pub concentration: ConcentrationRatios,
    /// Suppliers needed to cover [`PARETO_THRESHOLD_PCT`] of spend.
    pub pareto_suppliers: Option<usize>,
    pub scatter: Vec<ScatterPoint>,
    pub time_series: TimeSeries,
}

/// Shape of the loaded dataset within one currency; the shell uses it for
/// default filter selections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetProfile {
    pub total_rows: usize,
    pub currency_rows: usize,
    pub statuses: BTreeSet<String>,
    pub first_end_date: Option<NaiveDate>,
    pub last_end_date: Option<NaiveDate>,
}

pub fn profile(records: &[ContractRecord], currency: &str) -> DatasetProfile {
    let scoped = FilterSet::new()
        .with(ContractFilter::Currency(currency.to_string()))
        .apply(records);
    let statuses = scoped.iter().map(|r| r.status.clone()).collect();
    let first_end_date = scoped.iter().filter_map(|r| r.end_date).min();
    let last_end_date = scoped.iter().filter_map(|r| r.end_date).max();
    DatasetProfile {
        total_rows: records.len(),
        currency_rows: scoped.len(),
        statuses,
        first_end_date,
        last_end_date,
    }
}

/// Recompute every result set from scratch for one configuration.
///
/// KPIs use the global filters only; rankings, shares, scatter and the time
/// series also apply the category keyword.
pub fn recompute(records: &[ContractRecord], config: &AnalysisConfig) -> DashboardResults {
    let global = FilterSet::global(config).apply(records);
    let scoped = FilterSet::category(config).refine(&global);
    debug!(
        "recompute: {} records, {} after global filters, {} in category",
        records.len(),
        global.len(),
        scoped.len()
    );

    let kpis = compute_kpis(&global, config.as_of);

    let total = grand_total(&scoped);
    let suppliers = aggregate_by_supplier(&scoped);
    let shares = market_share(&suppliers, total);

    let top_by_value = ranked(&suppliers, RankMetric::TotalValue, config.top_n, total);
    let top_by_count = ranked(&suppliers, RankMetric::ContractCount, config.top_n, total);
    let top_details = top_n(&suppliers, RankMetric::TotalValue, config.top_n)
        .into_iter()
        .map(|g| SupplierDetail {
            supplier: g.key,
            total_value: g.total_value,
            contract_count: g.contract_count,
            earliest_start: g.earliest,
            latest_end: g.latest,
        })
        .collect();
    let scatter = suppliers
        .iter()
        .map(|g| ScatterPoint {
            supplier: g.key.clone(),
            contract_count: g.contract_count,
            total_value: g.total_value,
        })
        .collect();

    DashboardResults {
        kpis,
        top_by_value,
        top_by_count,
        top_details,
        concentration: concentration(&shares),
        pareto_suppliers: suppliers_to_reach(&shares, PARETO_THRESHOLD_PCT),
        market_share: shares,
        scatter,
        time_series: yearly_series(&scoped),
    }
}

pub fn compute_kpis(records: &[&ContractRecord], as_of: NaiveDate) -> Kpis {
    let total_value = grand_total(records);
    let contract_count = records.len();
    let supplier_count = records.iter().map(|r| r.supplier.as_str()).collect::<HashSet<_>>().len();
    let horizon = as_of.checked_add_days(Days::new(EXPIRING_WINDOW_DAYS)).unwrap_or(NaiveDate::MAX);
    let active_today = records
        .iter()
        .filter(|r| matches!((r.start_date, r.end_date), (Some(s), Some(e)) if s <= as_of && as_of <= e))
        .count();
    let expiring_soon = records
        .iter()
        .filter(|r| r.end_date.is_some_and(|e| as_of <= e && e <= horizon))
        .count();
    Kpis {
        total_value,
        contract_count,
        supplier_count,
        average_ticket: average_ticket(total_value, contract_count),
        active_today,
        expiring_soon,
    }
}

pub fn yearly_series(records: &[&ContractRecord]) -> TimeSeries {
    let years = aggregate(records, by_start_year, DateSpan::VIGENCIA);
    if years.is_empty() {
        return TimeSeries::InsufficientData;
    }
    TimeSeries::Ready(
        years
            .into_iter()
            .map(|g| YearTotal {
                year: g.key,
                total_value: g.total_value,
                contract_count: g.contract_count,
            })
            .collect(),
    )
}

fn ranked(groups: &[GroupAggregate<String>], metric: RankMetric, n: usize, total: f64) -> Vec<RankedSupplier> {
    top_n(groups, metric, n)
        .into_iter()
        .enumerate()
        .map(|(idx, g)| RankedSupplier {
            rank: idx + 1,
            share_pct: share_pct(g.total_value, total),
            supplier: g.key,
            total_value: g.total_value,
            contract_count: g.contract_count,
        })
        .collect()
}

// Display conversion. Everything below produces strings only.

pub fn value_rows(rows: &[RankedSupplier], currency: &str) -> Vec<SupplierValueRow> {
    rows.iter()
        .map(|r| SupplierValueRow {
            rank: r.rank,
            supplier: r.supplier.clone(),
            total_value: format_currency(currency, r.total_value),
            share: format_pct(r.share_pct),
        })
        .collect()
}

pub fn count_rows(rows: &[RankedSupplier], currency: &str) -> Vec<SupplierCountRow> {
    rows.iter()
        .map(|r| SupplierCountRow {
            rank: r.rank,
            supplier: r.supplier.clone(),
            contract_count: format_int(r.contract_count),
            total_value: format_currency(currency, r.total_value),
        })
        .collect()
}

pub fn detail_rows(rows: &[SupplierDetail], currency: &str) -> Vec<SupplierDetailRow> {
    rows.iter()
        .map(|r| SupplierDetailRow {
            supplier: r.supplier.clone(),
            total_value: format_currency(currency, r.total_value),
            contract_count: format_int(r.contract_count),
            average_ticket: format_currency(currency, average_ticket(r.total_value, r.contract_count)),
            earliest_start: format_date(r.earliest_start),
            latest_end: format_date(r.latest_end),
        })
        .collect()
}

pub fn market_share_rows(rows: &[ShareEntry], currency: &str) -> Vec<MarketShareRow> {
    rows.iter()
        .enumerate()
        .map(|(idx, r)| MarketShareRow {
            rank: idx + 1,
            supplier: r.supplier.clone(),
            total_value: format_currency(currency, r.total_value),
            share: format_pct(r.share_pct),
            cumulative_share: format_pct(r.cumulative_share_pct),
        })
        .collect()
}

pub fn scatter_rows(rows: &[ScatterPoint], currency: &str) -> Vec<ScatterRow> {
    rows.iter()
        .map(|r| ScatterRow {
            supplier: r.supplier.clone(),
            contract_count: r.contract_count,
            total_value: format_currency(currency, r.total_value),
        })
        .collect()
}

pub fn year_rows(series: &TimeSeries, currency: &str) -> Vec<YearRow> {
    match series {
        TimeSeries::Ready(points) => points
            .iter()
            .map(|p| YearRow {
                year: p.year,
                total_value: format_currency(currency, p.total_value),
                contract_count: p.contract_count,
            })
            .collect(),
        TimeSeries::InsufficientData => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(supplier: &str, value: f64, start: Option<NaiveDate>, end: Option<NaiveDate>) -> ContractRecord {
        ContractRecord {
            supplier: supplier.into(),
            currency: "R$".into(),
            status: "Ativo".into(),
            contract_value: value,
            start_date: start,
            end_date: end,
            ..Default::default()
        }
    }

    #[test]
    fn active_and_expiring_counts() {
        let as_of = d(2024, 6, 1);
        let records = vec![
            rec("A", 1.0, Some(d(2024, 1, 1)), Some(d(2024, 6, 1))),
            rec("B", 1.0, Some(d(2024, 1, 1)), Some(d(2024, 8, 30))),
            rec("C", 1.0, Some(d(2024, 1, 1)), Some(d(2024, 8, 31))),
            rec("D", 1.0, Some(d(2023, 1, 1)), Some(d(2024, 5, 31))),
            rec("E", 1.0, None, Some(d(2024, 7, 1))),
            rec("F", 1.0, Some(d(2024, 7, 1)), None),
        ];
        let view: Vec<&ContractRecord> = records.iter().collect();
        let kpis = compute_kpis(&view, as_of);
        assert_eq!(kpis.active_today, 3);
        // 2024-06-01 + 90 days = 2024-08-30
        assert_eq!(kpis.expiring_soon, 3);
        assert_eq!(kpis.supplier_count, 6);
        assert_eq!(kpis.average_ticket, 1.0);
    }

    #[test]
    fn category_keyword_narrows_rankings_not_kpis() {
        let mut a = rec("A", 100.0, None, None);
        a.object_description = "Fornecimento de tubos".into();
        let mut b = rec("B", 900.0, None, None);
        b.object_description = "Serviço de sondagem".into();
        let records = vec![a, b];
        let config = AnalysisConfig::new(d(2024, 1, 1)).with_category("TUBOS");
        let results = recompute(&records, &config);
        assert_eq!(results.kpis.total_value, 1000.0);
        assert_eq!(results.top_by_value.len(), 1);
        assert_eq!(results.top_by_value[0].supplier, "A");
        assert_eq!(results.top_by_value[0].share_pct, 100.0);
    }

    #[test]
    fn series_reports_insufficient_data() {
        let records = vec![rec("A", 10.0, None, None)];
        let view: Vec<&ContractRecord> = records.iter().collect();
        assert_eq!(yearly_series(&view), TimeSeries::InsufficientData);
        assert!(year_rows(&TimeSeries::InsufficientData, "R$").is_empty());
    }

    #[test]
    fn profile_lists_statuses_and_end_bounds() {
        let mut records = vec![
            rec("A", 1.0, None, Some(d(2022, 1, 1))),
            rec("B", 1.0, None, Some(d(2025, 3, 1))),
            rec("C", 1.0, None, None),
        ];
        records[1].status = "Encerrado".into();
        records[2].currency = "US$".into();
        records[2].status = "Suspenso".into();
        let p = profile(&records, "R$");
        assert_eq!(p.total_rows, 3);
        assert_eq!(p.currency_rows, 2);
        assert_eq!(
            p.statuses.into_iter().collect::<Vec<_>>(),
            vec!["Ativo".to_string(), "Encerrado".to_string()]
        );
        assert_eq!(p.first_end_date, Some(d(2022, 1, 1)));
        assert_eq!(p.last_end_date, Some(d(2025, 3, 1)));
    }

    #[test]
    fn display_rows_are_pt_br() {
        let ranked = vec![RankedSupplier {
            rank: 1,
            supplier: "A".into(),
            total_value: 1234.5,
            contract_count: 1500,
            share_pct: 60.0,
        }];
        let rows = value_rows(&ranked, "R$");
        assert_eq!(rows[0].total_value, "R$ 1.234,50");
        assert_eq!(rows[0].share, "60,00%");
        let rows = count_rows(&ranked, "R$");
        assert_eq!(rows[0].contract_count, "1.500");
    }
}
