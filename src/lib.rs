//! Supplier spending and market concentration over public procurement
//! contracts.
//!
//! The pipeline is a chain of pure functions:
//! raw `;`-separated rows → [`loader::normalize`] → [`filters::FilterSet`] →
//! [`aggregate::aggregate`] → [`analysis`] → display rows in [`reports`].
//! [`reports::recompute`] runs the whole chain for one
//! [`config::AnalysisConfig`].
pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod error;
pub mod filters;
pub mod loader;
pub mod logging;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use config::AnalysisConfig;
pub use error::{AppError, ConfigError, LoadError, OutputError};
pub use reports::{recompute, DashboardResults, TimeSeries};
pub use types::ContractRecord;
