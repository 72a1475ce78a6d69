//! Datadog goal source

use super::{MetricSource, Selection};
use crate::application::{Application, Objective};
use crate::error::Result;
use crate::models::{Metric, MetricType};

/// Turns an objective with a Datadog goal into a Datadog metric
#[derive(Debug, Clone, Default)]
pub struct DatadogSource {
    pub goal: Option<Objective>,
}

impl DatadogSource {
    pub fn new(goal: Objective) -> Self {
        Self { goal: Some(goal) }
    }

    /// One source per objective carrying a Datadog goal
    pub fn from_application(application: &Application) -> Vec<Self> {
        application
            .objectives
            .iter()
            .filter(|objective| objective.datadog.is_some())
            .cloned()
            .map(Self::new)
            .collect()
    }
}

impl MetricSource for DatadogSource {
    fn metrics(&self) -> Result<Vec<Metric>> {
        let Some(goal) = self.goal.as_ref().filter(|g| !g.implemented) else {
            return Ok(Vec::new());
        };
        let Some(datadog) = &goal.datadog else {
            return Ok(Vec::new());
        };

        let mut metric = goal.new_metric(datadog.query.clone());
        metric.metric_type = Some(MetricType::Datadog);
        metric.minimize = !datadog.maximize;
        if let Some(aggregator) = datadog.aggregator.as_deref().filter(|a| !a.is_empty()) {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("aggregator", aggregator)
                .finish();
            metric.url = Some(format!("?{query}"));
        }

        Ok(vec![metric])
    }
}

impl Selection for DatadogSource {
    fn as_metric_source(&self) -> Option<&dyn MetricSource> {
        Some(self)
    }
}
