//! Metrics that are not derived from application objectives

pub mod builtin;

pub use builtin::{
    builtin_metrics, cpu_utilization_metric, flush, flush_at, prometheus_address,
    CPU_UTILIZATION_METRIC, CPU_UTILIZATION_QUERY, FLUSHED_SERIES, PROMETHEUS_PORT,
    PROMETHEUS_SERVICE_NAME,
};
