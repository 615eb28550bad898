// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! File-only tracing setup. The terminal UI owns stdout, so every launch
//! writes to its own timestamped file under the data directory.

use crate::config::APP_NAME;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

pub const LOG_FILTER_ENV: &str = "CHURNPREDICT_LOG";

const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "churnpredict";
const DEFAULT_FILTER: &str = "info";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("no data directory available for logs")]
    NoDataDir,
    #[error("prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("read log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("remove old log file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("create log file {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("format log file name: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("invalid log filter {filter:?} -- fix [log].filter or CHURNPREDICT_LOG: {source}")]
    InvalidFilter {
        filter: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs the global subscriber and returns the log file path. Later calls
/// are no-ops that return `None`.
pub fn init(config_filter: Option<&str>) -> Result<Option<PathBuf>, LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(None);
    }

    let env_filter = build_env_filter(std::env::var(LOG_FILTER_ENV).ok(), config_filter)?;
    let log_dir = log_directory()?;
    let log_file_name = format_log_file_name(OffsetDateTime::now_utc())?;
    let log_path = log_dir.join(&log_file_name);
    ensure_file_exists(&log_path)?;

    let file_appender = rolling::never(&log_dir, &log_file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    prune_old_logs(&log_dir, MAX_LOG_FILES)?;

    let file_layer = fmt::layer().with_ansi(false).with_writer(file_writer);
    let subscriber = Registry::default().with(env_filter).with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOG_GUARD.set(guard);

    tracing::info!(path = %log_path.display(), "logging initialized");
    Ok(Some(log_path))
}

fn build_env_filter(
    env_filter: Option<String>,
    config_filter: Option<&str>,
) -> Result<EnvFilter, LoggingError> {
    let directive = env_filter
        .filter(|value| !value.trim().is_empty())
        .or_else(|| config_filter.map(str::to_owned))
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned());
    EnvFilter::try_new(&directive).map_err(|source| LoggingError::InvalidFilter {
        filter: directive,
        source,
    })
}

fn log_directory() -> Result<PathBuf, LoggingError> {
    let data_dir = dirs::data_dir().ok_or(LoggingError::NoDataDir)?;
    let path = data_dir.join(APP_NAME).join("logs");
    fs::create_dir_all(&path).map_err(|source| LoggingError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn ensure_file_exists(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn prune_old_logs(dir: &Path, max_files: usize) -> Result<(), LoggingError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("log"))
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect::<Vec<_>>();

    entries.sort_by(|left, right| right.cmp(left));
    for (_, path) in entries.into_iter().skip(max_files) {
        fs::remove_file(&path).map_err(|source| LoggingError::RemoveFile { path, source })?;
    }
    Ok(())
}

fn format_log_file_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[BorrowedFormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    let name = now.format(NAME_FORMAT)?;
    Ok(format!("{LOG_FILE_PREFIX}-{name}.log"))
}
