//! Statistics and metrics

pub mod metrics;

pub(crate) use metrics::RegistryCounters;
pub use metrics::RegistryStats;
