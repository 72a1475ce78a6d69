//! Built-in metrics backed by the bundled Prometheus instance

use crate::error::MetricError;
use crate::models::{Metric, MetricType};
use crate::observability::{GenerationMetrics, StructuredLogger};
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use std::time::Duration;

/// Service name of the bundled Prometheus instance
pub const PROMETHEUS_SERVICE_NAME: &str = "rso-prometheus";

/// Port the bundled Prometheus instance listens on
pub const PROMETHEUS_PORT: u16 = 9090;

/// Name of the built-in CPU utilization metric
pub const CPU_UTILIZATION_METRIC: &str = "rso cpu utilization";

/// Ratio of CPU used by the trial's target pods to their CPU limits
pub const CPU_UTILIZATION_QUERY: &str = r#"
scalar(
  sum(
    sum(
      sum(kube_pod_container_status_running == 1) by (pod)
      *
      on (pod) group_left kube_pod_labels{{rsoTargetLabel .Trial}}
    ) by (pod)
    *
    on (pod) group_right max(container_cpu_usage_seconds_total{container="", image=""}) by (pod)
  )
  /
  sum(
    sum(
      sum(kube_pod_container_status_running == 1) by (pod)
      *
      on (pod) group_left kube_pod_labels{{rsoTargetLabel .Trial}}
    ) by (pod)
    *
    on (pod) group_left sum_over_time(kube_pod_container_resource_limits_cpu_cores[1h:1s])
  )
)
"#;

/// Series read by the built-in queries; deleting them resets Prometheus
pub const FLUSHED_SERIES: [&str; 3] = [
    "kube_pod_labels",
    "container_cpu_usage_seconds_total",
    "kube_pod_container_resource_limits_cpu_cores",
];

const DELETE_SERIES_PATH: &str = "/api/v1/admin/tsdb/delete_series";

/// Address of the bundled Prometheus instance in a namespace
///
/// The namespace may itself be a template expression such as
/// `{{ .Trial.Namespace }}`.
pub fn prometheus_address(namespace: &str) -> String {
    format!("http://{PROMETHEUS_SERVICE_NAME}.{namespace}:{PROMETHEUS_PORT}")
}

pub fn cpu_utilization_metric() -> Metric {
    Metric {
        name: CPU_UTILIZATION_METRIC.to_string(),
        metric_type: Some(MetricType::BuiltIn),
        query: CPU_UTILIZATION_QUERY.to_string(),
        url: Some(prometheus_address("{{ .Trial.Namespace }}")),
        ..Default::default()
    }
}

/// Every built-in metric
pub fn builtin_metrics() -> Vec<Metric> {
    vec![cpu_utilization_metric()]
}

/// Delete the series used by the built-in queries from the Prometheus
/// instance of a namespace
pub async fn flush(namespace: &str) -> Result<(), MetricError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    flush_at(&client, &prometheus_address(namespace)).await
}

/// Delete the built-in series from the Prometheus instance at `address`
///
/// Only an end time is sent so every sample up to now is removed.
pub async fn flush_at(client: &Client, address: &str) -> Result<(), MetricError> {
    let url = format!("{}{}", address.trim_end_matches('/'), DELETE_SERIES_PATH);
    let end = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut query: Vec<(&str, &str)> = FLUSHED_SERIES.iter().map(|s| ("match[]", *s)).collect();
    query.push(("end", end.as_str()));

    let response = client.post(&url).query(&query).send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(MetricError::Status { status, body });
    }

    GenerationMetrics::new().inc_series_flushes();
    StructuredLogger::new().log_series_flush(address, FLUSHED_SERIES.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_cpu_utilization_metric() {
        let metric = cpu_utilization_metric();
        assert_eq!(metric.name, "rso cpu utilization");
        assert_eq!(metric.metric_type, Some(MetricType::BuiltIn));
        assert_eq!(
            metric.url.as_deref(),
            Some("http://rso-prometheus.{{ .Trial.Namespace }}:9090")
        );
        assert!(metric.query.contains("kube_pod_labels{{rsoTargetLabel .Trial}}"));
        assert!(!metric.minimize);
    }

    #[test]
    fn test_prometheus_address() {
        assert_eq!(prometheus_address("perf"), "http://rso-prometheus.perf:9090");
    }

    #[tokio::test]
    async fn test_flush_deletes_builtin_series() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", DELETE_SERIES_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("match%5B%5D=kube_pod_labels(&|$)".into()),
                Matcher::Regex("match%5B%5D=container_cpu_usage_seconds_total(&|$)".into()),
                Matcher::Regex(
                    "match%5B%5D=kube_pod_container_resource_limits_cpu_cores(&|$)".into(),
                ),
                Matcher::Regex("end=".into()),
            ]))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        flush_at(&Client::new(), &server.url()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_flush_reports_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", DELETE_SERIES_PATH)
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("admin APIs disabled")
            .create_async()
            .await;

        let err = flush_at(&Client::new(), &server.url()).await.unwrap_err();
        match err {
            MetricError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "admin APIs disabled");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
