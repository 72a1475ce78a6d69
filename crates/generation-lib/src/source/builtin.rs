//! Built-in metric source

use super::{MetricSource, Selection};
use crate::error::Result;
use crate::metric::builtin_metrics;
use crate::models::Metric;

/// Adds the metrics backed by the bundled Prometheus instance
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMetricSource;

impl MetricSource for BuiltinMetricSource {
    fn metrics(&self) -> Result<Vec<Metric>> {
        Ok(builtin_metrics())
    }
}

impl Selection for BuiltinMetricSource {
    fn as_metric_source(&self) -> Option<&dyn MetricSource> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::CPU_UTILIZATION_METRIC;

    #[test]
    fn test_builtin_metrics() {
        let metrics = BuiltinMetricSource.metrics().unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name, CPU_UTILIZATION_METRIC);
    }
}
