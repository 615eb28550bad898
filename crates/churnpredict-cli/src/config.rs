// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "churnpredict";
pub const CONFIG_PATH_ENV: &str = "CHURNPREDICT_CONFIG_PATH";
pub const API_BASE_ENV: &str = "CHURNPREDICT_API_BASE";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_THEME: &str = "default";
const DEFAULT_REPORT_PATH: &str = "churn.pdf";
const THEMES: [&str; 2] = ["default", "mono"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_API_BASE_URL.to_owned()),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub theme: Option<String>,
    pub report_path: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            theme: Some(DEFAULT_THEME.to_owned()),
            report_path: Some(DEFAULT_REPORT_PATH.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub filter: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [api], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.api.base_url
            && base_url.trim().is_empty()
        {
            bail!(
                "api.base_url in {} must not be empty; remove it to use {DEFAULT_API_BASE_URL}",
                path.display()
            );
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(theme) = &self.ui.theme
            && !THEMES.contains(&theme.as_str())
        {
            bail!(
                "ui.theme in {} must be one of {}, got {:?}",
                path.display(),
                THEMES.join(", "),
                theme
            );
        }

        Ok(())
    }

    /// API base URL: the flag wins, then `CHURNPREDICT_API_BASE`, then the
    /// config file, then the built-in default.
    pub fn resolve_api_base(&self, cli_override: Option<&str>) -> String {
        if let Some(value) = cli_override {
            return value.to_owned();
        }
        if let Ok(value) = env::var(API_BASE_ENV)
            && !value.trim().is_empty()
        {
            return value;
        }
        self.api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .to_owned()
    }

    pub fn api_timeout(&self) -> Result<Option<Duration>> {
        self.api.timeout.as_deref().map(parse_duration).transpose()
    }

    pub fn theme_name(&self) -> &str {
        self.ui.theme.as_deref().unwrap_or(DEFAULT_THEME)
    }

    pub fn report_path(&self) -> PathBuf {
        PathBuf::from(
            self.ui
                .report_path
                .as_deref()
                .unwrap_or(DEFAULT_REPORT_PATH),
        )
    }

    pub fn log_filter(&self) -> Option<&str> {
        self.log.filter.as_deref()
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# churnpredict config\n# Place this file at: {}\n\nversion = 1\n\n[api]\n# Overridden by --api-base or {}\nbase_url = \"{}\"\n# Optional. Unset keeps the HTTP client default.\n# timeout = \"10s\"\n\n[ui]\n# default or mono\ntheme = \"{}\"\nreport_path = \"{}\"\n\n[log]\n# Overridden by CHURNPREDICT_LOG\n# filter = \"churnpredict=debug\"\n",
            path.display(),
            API_BASE_ENV,
            DEFAULT_API_BASE_URL,
            DEFAULT_THEME,
            DEFAULT_REPORT_PATH,
        )
    }
}

/// Durations are written `<N>ms`, `<N>s` or `<N>m`.
fn parse_duration(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    let unit_start = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(unit_start);
    let amount: u64 = digits.parse().with_context(|| {
        format!("duration {raw:?} has no leading number; write it like 500ms, 5s or 2m")
    })?;

    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount.saturating_mul(60))),
        _ => bail!("duration {raw:?} has unknown unit {unit:?}; use ms, s or m"),
    }
}

#[cfg(test)]
mod tests {
    use super::{API_BASE_ENV, CONFIG_PATH_ENV, Config, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn absent_file_yields_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load(&dir.path().join("absent.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.theme_name(), "default");
        assert_eq!(config.report_path(), PathBuf::from("churn.pdf"));
        assert_eq!(config.api_timeout()?, None);
        assert_eq!(config.log_filter(), None);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[api]\nbase_url = \"http://churn:8000\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[api], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn broken_toml_reports_parse_step() -> Result<()> {
        let (_temp, path) = write_config("version = = 1")?;
        let error = Config::load(&path).expect_err("broken TOML");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[api]\nbase_url = \"https://churn.example\"\ntimeout = \"750ms\"\n[ui]\ntheme = \"mono\"\nreport_path = \"/srv/reports/q3.pdf\"\n[log]\nfilter = \"debug\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.api_timeout()?, Some(Duration::from_millis(750)));
        assert_eq!(config.theme_name(), "mono");
        assert_eq!(config.report_path(), PathBuf::from("/srv/reports/q3.pdf"));
        assert_eq!(config.log_filter(), Some("debug"));
        Ok(())
    }

    #[test]
    fn unknown_theme_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\ntheme = \"neon\"\n")?;
        let error = Config::load(&path).expect_err("unknown theme should fail");
        let message = error.to_string();
        assert!(message.contains("ui.theme"));
        assert!(message.contains("default, mono"));
        Ok(())
    }

    #[test]
    fn empty_base_url_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\nbase_url = \"  \"\n")?;
        let error = Config::load(&path).expect_err("blank base url should fail");
        assert!(error.to_string().contains("must not be empty"));
        Ok(())
    }

    #[test]
    fn timeout_rejects_non_positive_values_in_config() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn parse_duration_reads_each_unit() -> Result<()> {
        assert_eq!(parse_duration("250ms")?, Duration::from_millis(250));
        assert_eq!(parse_duration(" 30s ")?, Duration::from_secs(30));
        assert_eq!(parse_duration("3m")?, Duration::from_secs(180));
        Ok(())
    }

    #[test]
    fn parse_duration_rejects_missing_number_and_unknown_unit() {
        let error = parse_duration("soon").expect_err("no number");
        assert!(error.to_string().contains("no leading number"));

        let error = parse_duration("3h").expect_err("hours are not supported");
        assert!(error.to_string().contains("unknown unit \"h\""));

        assert!(parse_duration("15").is_err());
    }

    #[test]
    fn api_base_prefers_flag_then_env_then_file() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) =
            write_config("version = 1\n[api]\nbase_url = \"http://from-config:8000\"\n")?;
        let config = Config::load(&path)?;

        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(API_BASE_ENV, "http://from-env:8000");
        }
        let with_flag = config.resolve_api_base(Some("http://from-flag:8000"));
        let with_env = config.resolve_api_base(None);
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(API_BASE_ENV);
        }
        let from_file = config.resolve_api_base(None);

        assert_eq!(with_flag, "http://from-flag:8000");
        assert_eq!(with_env, "http://from-env:8000");
        assert_eq!(from_file, "http://from-config:8000");
        Ok(())
    }

    #[test]
    fn api_base_defaults_to_localhost() {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(API_BASE_ENV);
        }
        assert_eq!(
            Config::default().resolve_api_base(None),
            "http://localhost:8000"
        );
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[api]"));
        assert!(example.contains("[ui]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.theme_name(), "default");
        Ok(())
    }
}
