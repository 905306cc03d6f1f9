use crate::error::ConfigError;
use crate::util::parse_date_dayfirst;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

pub const DEFAULT_CURRENCY: &str = "R$";
pub const DEFAULT_TOP_N: usize = 10;

/// Everything one recomputation depends on. The core never looks at the
/// clock or any other ambient state; `as_of` is the "today" used by the
/// active/expiring KPIs.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub currency: String,
    /// Inclusive bounds on `end_date`.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Accepted statuses. Empty means no restriction.
    pub status_set: BTreeSet<String>,
    pub keyword: String,
    /// Page-level refinement applied after the global filters.
    pub category_keyword: Option<String>,
    pub top_n: usize,
    pub as_of: NaiveDate,
}

impl AnalysisConfig {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            date_range: None,
            status_set: BTreeSet::new(),
            keyword: String::new(),
            category_keyword: None,
            top_n: DEFAULT_TOP_N,
            as_of,
        }
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvalidRange { start, end });
        }
        self.date_range = Some((start, end));
        Ok(self)
    }

    pub fn with_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.status_set = statuses.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_keyword = Some(category.into());
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// JSON config file. Every field is optional; command-line flags override it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigFile {
    pub currency: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub statuses: Option<Vec<String>>,
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub top_n: Option<usize>,
    pub as_of: Option<String>,
}

impl ConfigFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Layer `overrides` on top of `self`; fields set in `overrides` win.
    pub fn merge(self, overrides: ConfigFile) -> ConfigFile {
        ConfigFile {
            currency: overrides.currency.or(self.currency),
            start: overrides.start.or(self.start),
            end: overrides.end.or(self.end),
            statuses: overrides.statuses.or(self.statuses),
            keyword: overrides.keyword.or(self.keyword),
            category: overrides.category.or(self.category),
            top_n: overrides.top_n.or(self.top_n),
            as_of: overrides.as_of.or(self.as_of),
        }
    }

    /// Resolve into an `AnalysisConfig`.
    ///
    /// `today` is used when no `as_of` is given; `default_range` fills in a
    /// missing start or end bound when only one side was supplied.
    pub fn resolve(
        self,
        today: NaiveDate,
        default_range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<AnalysisConfig, ConfigError> {
        let as_of = match self.as_of.as_deref() {
            Some(s) => parse_config_date(s)?,
            None => today,
        };
        let mut config = AnalysisConfig::new(as_of);
        if let Some(currency) = self.currency {
            config.currency = currency;
        }
        let start = self.start.as_deref().map(parse_config_date).transpose()?;
        let end = self.end.as_deref().map(parse_config_date).transpose()?;
        let range = match (start, end, default_range) {
            (None, None, _) => None,
            (Some(s), Some(e), _) => Some((s, e)),
            (Some(s), None, Some((_, e))) | (None, Some(e), Some((s, _))) => Some((s, e)),
            (Some(s), None, None) => Some((s, NaiveDate::MAX)),
            (None, Some(e), None) => Some((NaiveDate::MIN, e)),
        };
        if let Some((s, e)) = range {
            config = config.with_date_range(s, e)?;
        }
        if let Some(statuses) = self.statuses {
            config = config.with_statuses(statuses);
        }
        if let Some(keyword) = self.keyword {
            config = config.with_keyword(keyword);
        }
        if let Some(category) = self.category.filter(|c| !c.trim().is_empty()) {
            config = config.with_category(category);
        }
        if let Some(top_n) = self.top_n {
            config = config.with_top_n(top_n);
        }
        Ok(config)
    }
}

fn parse_config_date(s: &str) -> Result<NaiveDate, ConfigError> {
    parse_date_dayfirst(Some(s)).ok_or_else(|| ConfigError::InvalidDate(s.to_string()))
}
