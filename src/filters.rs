use crate::config::AnalysisConfig;
use crate::types::ContractRecord;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;

/// A single predicate over a contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractFilter {
    /// Exact match on `currency`.
    Currency(String),
    /// `end_date` within `[start, end]`. Contracts without an end date never
    /// match.
    EndDateRange { start: NaiveDate, end: NaiveDate },
    /// `status` is one of the accepted values. An empty set accepts all.
    StatusIn(BTreeSet<String>),
    /// Case-insensitive substring of `object_description`. An empty needle
    /// accepts all; an empty description never matches a non-empty needle.
    Keyword(String),
}

impl ContractFilter {
    pub fn keyword(needle: &str) -> Self {
        ContractFilter::Keyword(needle.trim().to_lowercase())
    }

    pub fn matches(&self, record: &ContractRecord) -> bool {
        match self {
            ContractFilter::Currency(target) => record.currency == *target,
            ContractFilter::EndDateRange { start, end } => record
                .end_date
                .is_some_and(|d| *start <= d && d <= *end),
            ContractFilter::StatusIn(accepted) => {
                accepted.is_empty() || accepted.contains(&record.status)
            }
            ContractFilter::Keyword(needle) => {
                let needle = needle.trim().to_lowercase();
                needle.is_empty()
                    || (!record.object_description.is_empty()
                        && record.object_description.to_lowercase().contains(&needle))
            }
        }
    }

    fn is_noop(&self) -> bool {
        match self {
            ContractFilter::StatusIn(accepted) => accepted.is_empty(),
            ContractFilter::Keyword(needle) => needle.trim().is_empty(),
            _ => false,
        }
    }
}

/// An ordered AND of filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    stages: Vec<ContractFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The global filters of a configuration: currency, then end-date range,
    /// status set and keyword. The category keyword is not included.
    pub fn global(config: &AnalysisConfig) -> Self {
        let mut set = FilterSet::new().with(ContractFilter::Currency(config.currency.clone()));
        if let Some((start, end)) = config.date_range {
            set = set.with(ContractFilter::EndDateRange { start, end });
        }
        set.with(ContractFilter::StatusIn(config.status_set.clone()))
            .with(ContractFilter::keyword(&config.keyword))
    }

    /// The page-level category refinement, if the configuration has one.
    pub fn category(config: &AnalysisConfig) -> Self {
        match config.category_keyword.as_deref() {
            Some(category) => FilterSet::new().with(ContractFilter::keyword(category)),
            None => FilterSet::new(),
        }
    }

    /// Append a stage. No-op stages are dropped.
    pub fn with(mut self, filter: ContractFilter) -> Self {
        if !filter.is_noop() {
            self.stages.push(filter);
        }
        self
    }

    pub fn stages(&self) -> &[ContractFilter] {
        &self.stages
    }

    pub fn matches(&self, record: &ContractRecord) -> bool {
        self.stages.iter().all(|f| f.matches(record))
    }

    /// Borrow the matching records, in input order.
    pub fn apply<'a>(&self, records: &'a [ContractRecord]) -> Vec<&'a ContractRecord> {
        let view: Vec<&ContractRecord> = records.iter().collect();
        self.refine(&view)
    }

    /// Narrow an existing view further, stage by stage.
    pub fn refine<'a>(&self, view: &[&'a ContractRecord]) -> Vec<&'a ContractRecord> {
        let mut current: Vec<&'a ContractRecord> = view.to_vec();
        for stage in &self.stages {
            let before = current.len();
            current.retain(|r| stage.matches(r));
            debug!("filter {:?}: {} -> {} rows", stage, before, current.len());
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(supplier: &str, currency: &str, status: &str, desc: &str, end: Option<NaiveDate>) -> ContractRecord {
        ContractRecord {
            supplier: supplier.into(),
            currency: currency.into(),
            status: status.into(),
            object_description: desc.into(),
            end_date: end,
            ..Default::default()
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn status_filter_keeps_only_accepted() {
        let records = vec![
            rec("A", "R$", "Ativo", "", None),
            rec("B", "R$", "Encerrado", "", None),
        ];
        let set = FilterSet::new().with(ContractFilter::StatusIn(["Ativo".to_string()].into()));
        let out = set.apply(&records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].supplier, "A");
    }

    #[test]
    fn empty_status_set_is_no_restriction() {
        let records = vec![rec("A", "R$", "Ativo", "", None), rec("B", "R$", "", "", None)];
        let set = FilterSet::new().with(ContractFilter::StatusIn(BTreeSet::new()));
        assert!(set.stages().is_empty());
        assert_eq!(set.apply(&records).len(), 2);
    }

    #[test]
    fn date_range_is_inclusive_and_drops_undated() {
        let records = vec![
            rec("A", "R$", "", "", Some(d(2023, 1, 1))),
            rec("B", "R$", "", "", Some(d(2023, 12, 31))),
            rec("C", "R$", "", "", Some(d(2024, 1, 1))),
            rec("D", "R$", "", "", None),
        ];
        let set = FilterSet::new().with(ContractFilter::EndDateRange {
            start: d(2023, 1, 1),
            end: d(2023, 12, 31),
        });
        let names: Vec<&str> = set.apply(&records).iter().map(|r| r.supplier.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn keyword_is_case_insensitive_substring() {
        let records = vec![
            rec("A", "R$", "", "Manutenção de DUTOS", None),
            rec("B", "R$", "", "", None),
            rec("C", "R$", "", "Sondagem", None),
        ];
        let set = FilterSet::new().with(ContractFilter::keyword("dutos"));
        let out = set.apply(&records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].supplier, "A");
        let accented = FilterSet::new().with(ContractFilter::keyword("MANUTENÇÃO"));
        assert_eq!(accented.apply(&records).len(), 1);
    }

    #[test]
    fn global_filters_preserve_order_and_input() {
        let records = vec![
            rec("C", "R$", "Ativo", "x", None),
            rec("X", "US$", "Ativo", "x", None),
            rec("A", "R$", "Ativo", "x", None),
        ];
        let snapshot = records.clone();
        let config = AnalysisConfig::new(d(2024, 1, 1)).with_statuses(["Ativo"]);
        let out = FilterSet::global(&config).apply(&records);
        let names: Vec<&str> = out.iter().map(|r| r.supplier.as_str()).collect();
        assert_eq!(names, vec!["C", "A"]);
        assert_eq!(records, snapshot);
    }

    #[test]
    fn keyword_built_directly_still_ignores_case() {
        let records = vec![
            rec("A", "R$", "Ativo", "dutos de aço", None),
            rec("B", "R$", "Ativo", "válvulas", None),
        ];
        let filter = ContractFilter::Keyword("  Dutos ".to_string());
        assert!(filter.matches(&records[0]));
        assert!(!filter.matches(&records[1]));

        let set = FilterSet::new().with(ContractFilter::Keyword("   ".to_string()));
        assert!(set.stages().is_empty());
        assert_eq!(set.apply(&records).len(), 2);
    }
}
