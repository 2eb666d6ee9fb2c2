use crate::application::scheduler::DEFAULT_REFRESH_INTERVAL;
use crate::domain::metric::MetricCategory;
use crate::domain::range::RangeSelection;
use serde::Deserialize;
use std::time::Duration;

const CONFIG_FILE: &str = "config/dashboard";
const ENV_PREFIX: &str = "DASHBOARD";

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub api: ApiSettings,
    pub refresh: RefreshSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshSettings {
    pub interval_secs: u64,
    pub initial_range: String,
    pub categories: Vec<MetricCategory>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RefreshSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn initial_range(&self) -> RangeSelection {
        RangeSelection::parse_lenient(&self.initial_range)
    }
}

/// Load `config/dashboard.*` (optional) overlaid by `DASHBOARD__SECTION__KEY`
/// environment variables.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    load_from(config::File::with_name(CONFIG_FILE).required(false))
}

fn load_from<S>(file: S) -> anyhow::Result<DashboardConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let categories: Vec<&str> = MetricCategory::ALL.iter().map(|c| c.as_str()).collect();

    let settings = config::Config::builder()
        .set_default("api.base_url", "http://127.0.0.1:5000/api/metrics")?
        .set_default("api.timeout_secs", 10)?
        .set_default("refresh.interval_secs", DEFAULT_REFRESH_INTERVAL.as_secs())?
        .set_default("refresh.initial_range", RangeSelection::default().as_str())?
        .set_default("refresh.categories", categories)?
        .set_default("server.bind", "0.0.0.0:8080")?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("refresh.categories"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
