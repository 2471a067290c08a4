//! Static client configuration, fixed once at startup.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Base address used in production, relative to the page origin.
pub const PRODUCTION_BASE_URL: &str = "/api";
/// Base address used in development.
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:8000/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_FIXTURE_LATENCY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Production,
    Development,
}

impl DeploymentMode {
    pub fn base_url(self) -> &'static str {
        match self {
            DeploymentMode::Production => PRODUCTION_BASE_URL,
            DeploymentMode::Development => DEVELOPMENT_BASE_URL,
        }
    }
}

/// Artificial delay applied to fixture responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyPolicy {
    Disabled,
    Fixed(Duration),
    /// Uniformly random delay in `[min, max]`.
    Jitter { min: Duration, max: Duration },
}

impl LatencyPolicy {
    /// Pick the delay for one fixture response.
    pub fn sample(self) -> Option<Duration> {
        use rand::Rng;

        match self {
            LatencyPolicy::Disabled => None,
            LatencyPolicy::Fixed(delay) if delay.is_zero() => None,
            LatencyPolicy::Fixed(delay) => Some(delay),
            LatencyPolicy::Jitter { min, max } => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                let lo_ms = u64::try_from(lo.as_millis()).unwrap_or(u64::MAX);
                let hi_ms = u64::try_from(hi.as_millis()).unwrap_or(u64::MAX);
                let ms = rand::thread_rng().gen_range(lo_ms..=hi_ms);
                Some(Duration::from_millis(ms))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub mode: DeploymentMode,
    /// Versioned endpoint paths are appended to this, e.g. `{base}/v1/reports`.
    pub base_url: String,
    /// Absolute origin a native transport resolves a path-relative base
    /// against. Unused when `base_url` is absolute.
    pub origin: Option<Url>,
    pub timeout: Duration,
    /// Route requests through the fixture registry first.
    pub simulated: bool,
    pub fixture_latency: LatencyPolicy,
    /// Directory for the persisted session; `None` keeps it in memory.
    pub storage_dir: Option<PathBuf>,
    /// Seed the development test identity when nothing was restored.
    pub seed_identity: bool,
}

impl ClientConfig {
    pub fn new(mode: DeploymentMode) -> Self {
        Self {
            mode,
            base_url: mode.base_url().to_string(),
            origin: None,
            timeout: DEFAULT_TIMEOUT,
            simulated: mode == DeploymentMode::Development,
            fixture_latency: LatencyPolicy::Fixed(DEFAULT_FIXTURE_LATENCY),
            storage_dir: None,
            seed_identity: false,
        }
    }

    pub fn production() -> Self {
        Self::new(DeploymentMode::Production)
    }

    pub fn development() -> Self {
        Self::new(DeploymentMode::Development)
    }

    /// Live, latency-free configuration against an explicit base URL.
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            simulated: false,
            fixture_latency: LatencyPolicy::Disabled,
            ..Self::development()
        }
    }

    /// Read configuration from `INSIGHT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("INSIGHT_ENV").as_deref() {
            None | Some("development") | Some("dev") => DeploymentMode::Development,
            Some("production") | Some("prod") => DeploymentMode::Production,
            Some(other) => {
                return Err(invalid("INSIGHT_ENV", other, "expected production or development"))
            }
        };
        let mut config = Self::new(mode);

        if let Some(base) = lookup("INSIGHT_API_BASE_URL") {
            config.base_url = base.trim_end_matches('/').to_string();
        }
        if let Some(origin) = lookup("INSIGHT_API_ORIGIN") {
            let parsed = Url::parse(&origin)
                .map_err(|e| invalid("INSIGHT_API_ORIGIN", &origin, &e.to_string()))?;
            config.origin = Some(parsed);
        }
        if let Some(secs) = lookup("INSIGHT_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| invalid("INSIGHT_TIMEOUT_SECS", &secs, "expected whole seconds"))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(flag) = lookup("INSIGHT_SIMULATED") {
            config.simulated = parse_flag("INSIGHT_SIMULATED", &flag)?;
        }
        if let Some(ms) = lookup("INSIGHT_FIXTURE_LATENCY_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                invalid("INSIGHT_FIXTURE_LATENCY_MS", &ms, "expected milliseconds")
            })?;
            config.fixture_latency = if ms == 0 {
                LatencyPolicy::Disabled
            } else {
                LatencyPolicy::Fixed(Duration::from_millis(ms))
            };
        }
        config.storage_dir = lookup("INSIGHT_STORAGE_DIR").map(PathBuf::from);
        if let Some(flag) = lookup("INSIGHT_SEED_TEST_USER") {
            config.seed_identity = parse_flag("INSIGHT_SEED_TEST_USER", &flag)?;
        }
        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(invalid(var, other, "expected a boolean")),
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
