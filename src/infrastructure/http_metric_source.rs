// HTTP metric source - Fetches one category from the metrics API
use crate::application::error::FetchError;
use crate::application::metric_source::{MachineSeries, MetricSource};
use crate::domain::metric::{MetricCategory, MetricSeries, Sample};
use crate::domain::range::RangeSelection;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpMetricSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpMetricSource {
    pub fn new(base_url: String, timeout: Duration, token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn endpoint(&self, category: MetricCategory, range: RangeSelection) -> String {
        format!(
            "{}/{}?range={}",
            self.base_url,
            urlencoding::encode(category.as_str()),
            urlencoding::encode(range.as_str())
        )
    }
}

#[async_trait]
impl MetricSource for HttpMetricSource {
    async fn fetch_metric(
        &self,
        category: MetricCategory,
        range: RangeSelection,
    ) -> Result<MachineSeries, FetchError> {
        let url = self.endpoint(category, range);
        tracing::debug!("Fetching {} metrics from {}", category, url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|source| FetchError::Transport { category, source })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                category,
                status,
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport { category, source })?;
        let payload: Value =
            serde_json::from_str(&body).map_err(|source| FetchError::Decode { category, source })?;

        parse_payload(category, payload)
    }
}

#[derive(Debug, Deserialize)]
struct RawSample {
    #[serde(default)]
    timestamp: Option<RawTimestamp>,
    #[serde(default)]
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
    // Any other JSON type; the sample is dropped rather than failing the category.
    Unreadable(IgnoredAny),
}

/// Turn `{ machine: [{timestamp, value}, ...] }` into per-machine series.
///
/// Anything other than an object of arrays of samples with numeric or null
/// values is a shape failure for the whole category. Samples with an
/// unreadable timestamp are dropped.
pub fn parse_payload(category: MetricCategory, payload: Value) -> Result<MachineSeries, FetchError> {
    let machines: BTreeMap<String, Vec<RawSample>> =
        serde_json::from_value(payload).map_err(|e| FetchError::Shape {
            category,
            reason: e.to_string(),
        })?;

    let mut result = MachineSeries::new();
    for (machine, samples) in machines {
        let mut series: MetricSeries = Vec::with_capacity(samples.len());
        for sample in samples {
            let Some(timestamp) = sample.timestamp.as_ref().and_then(parse_timestamp) else {
                tracing::warn!(
                    category = %category,
                    machine = %machine,
                    "Dropping sample with unreadable timestamp: {:?}",
                    sample.timestamp
                );
                continue;
            };
            series.push(Sample::new(timestamp, sample.value));
        }
        result.insert(machine, series);
    }

    Ok(result)
}

/// Accepts RFC 3339 strings, offset-less ISO-8601 strings (read as UTC) and
/// epoch milliseconds.
fn parse_timestamp(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(|naive| naive.and_utc())
            }),
        RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
        RawTimestamp::FractionalMillis(ms) => DateTime::from_timestamp_millis(*ms as i64),
        RawTimestamp::Unreadable(_) => None,
    }
}
