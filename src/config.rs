use std::{env, fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::domain::order::TransitionPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "order_view.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub access_token: Option<String>,
    pub strict_forward_transitions: bool,
    pub log_filter: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:7000".into(),
            access_token: None,
            strict_forward_transitions: false,
            log_filter: "info,order_view=debug".into(),
            request_timeout_secs: 10,
        }
    }
}

/// Every key is optional; absent keys keep their defaults
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    access_token: Option<String>,
    strict_forward_transitions: Option<bool>,
    log_filter: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn transition_policy(&self) -> TransitionPolicy {
        if self.strict_forward_transitions {
            TransitionPolicy::ForwardOnly
        } else {
            TransitionPolicy::Permissive
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Overlay keys from a TOML document
    pub fn merge_toml(&mut self, raw: &str) -> anyhow::Result<()> {
        let file: FileSettings = toml::from_str(raw).context("invalid settings file")?;

        if let Some(v) = file.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file.access_token {
            self.access_token = Some(v);
        }
        if let Some(v) = file.strict_forward_transitions {
            self.strict_forward_transitions = v;
        }
        if let Some(v) = file.log_filter {
            self.log_filter = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        Ok(())
    }

    /// Overlay values from `lookup`, normally the process environment
    pub fn merge_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = lookup("ORDER_VIEW_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("ORDER_VIEW_ACCESS_TOKEN") {
            self.access_token = Some(v);
        }
        if let Some(v) = lookup("ORDER_VIEW_STRICT_TRANSITIONS") {
            self.strict_forward_transitions = v
                .parse()
                .with_context(|| format!("ORDER_VIEW_STRICT_TRANSITIONS={v:?} is not a bool"))?;
        }
        if let Some(v) = lookup("ORDER_VIEW_LOG") {
            self.log_filter = v;
        }
        if let Some(v) = lookup("ORDER_VIEW_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v
                .parse()
                .with_context(|| format!("ORDER_VIEW_REQUEST_TIMEOUT_SECS={v:?} is not a number"))?;
        }
        Ok(())
    }
}

/// Defaults, then the settings file, then the environment.
///
/// An explicit `path` must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            settings.merge_toml(&raw)?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                settings
                    .merge_toml(&raw)
                    .with_context(|| format!("failed to load {DEFAULT_CONFIG_FILE}"))?;
            }
        }
    }

    settings.merge_env(|key| env::var(key).ok())?;
    Ok(settings)
}
