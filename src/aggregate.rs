use crate::types::{ContractRecord, DateField};
use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Which date fields feed a group's `earliest` and `latest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub earliest_of: DateField,
    pub latest_of: DateField,
}

impl DateSpan {
    /// First start date and last end date: the contract coverage of a group.
    pub const VIGENCIA: DateSpan = DateSpan {
        earliest_of: DateField::Start,
        latest_of: DateField::End,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregate<K> {
    pub key: K,
    pub total_value: f64,
    pub contract_count: usize,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

impl<K> GroupAggregate<K> {
    fn new(key: K) -> Self {
        Self {
            key,
            total_value: 0.0,
            contract_count: 0,
            earliest: None,
            latest: None,
        }
    }

    fn add(&mut self, record: &ContractRecord, span: DateSpan) {
        self.total_value += record.contract_value;
        self.contract_count += 1;
        if let Some(d) = record.date(span.earliest_of) {
            self.earliest = Some(self.earliest.map_or(d, |cur| cur.min(d)));
        }
        if let Some(d) = record.date(span.latest_of) {
            self.latest = Some(self.latest.map_or(d, |cur| cur.max(d)));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    TotalValue,
    ContractCount,
}

/// Group records by `key_fn` and accumulate sum, count and date bounds.
///
/// Records for which `key_fn` returns `None` are left out. Output is in key
/// order; every group has at least one member.
pub fn aggregate<K, F>(records: &[&ContractRecord], key_fn: F, span: DateSpan) -> Vec<GroupAggregate<K>>
where
    K: Ord + Clone,
    F: Fn(&ContractRecord) -> Option<K>,
{
    let mut map: BTreeMap<K, GroupAggregate<K>> = BTreeMap::new();
    for r in records {
        let Some(key) = key_fn(*r) else { continue };
        map.entry(key.clone())
            .or_insert_with(|| GroupAggregate::new(key))
            .add(*r, span);
    }
    map.into_values().collect()
}

pub fn by_supplier(record: &ContractRecord) -> Option<String> {
    Some(record.supplier.clone())
}

pub fn by_start_year(record: &ContractRecord) -> Option<i32> {
    record.start_date.map(|d| d.year())
}

pub fn by_supplier_and_start_year(record: &ContractRecord) -> Option<(String, i32)> {
    record.start_date.map(|d| (record.supplier.clone(), d.year()))
}

pub fn aggregate_by_supplier(records: &[&ContractRecord]) -> Vec<GroupAggregate<String>> {
    aggregate(records, by_supplier, DateSpan::VIGENCIA)
}

/// Sort descending by `metric`; equal metrics fall back to ascending key
/// order whatever order the groups arrive in.
pub fn rank_by<K: Ord>(mut groups: Vec<GroupAggregate<K>>, metric: RankMetric) -> Vec<GroupAggregate<K>> {
    groups.sort_by(|a, b| compare_desc(a, b, metric));
    groups
}

fn compare_desc<K: Ord>(a: &GroupAggregate<K>, b: &GroupAggregate<K>, metric: RankMetric) -> Ordering {
    let by_metric = match metric {
        RankMetric::TotalValue => b
            .total_value
            .partial_cmp(&a.total_value)
            .unwrap_or(Ordering::Equal),
        RankMetric::ContractCount => b.contract_count.cmp(&a.contract_count),
    };
    by_metric.then_with(|| a.key.cmp(&b.key))
}

pub fn grand_total(records: &[&ContractRecord]) -> f64 {
    records.iter().map(|r| r.contract_value).sum()
}
