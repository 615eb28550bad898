// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use churnpredict_app::{LabelCatalog, PredictionRequest, RawPrediction, ServiceError};
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Option<Duration>,
    http: HttpClient,
}

impl Client {
    /// `timeout` of `None` keeps the transport default.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        validate_base_url(&base_url)?;

        let mut builder = HttpClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Fetches the option lists once. Any failure degrades to `None` so the
    /// form keeps working with its built-in choices.
    pub fn load_catalog(&self) -> Option<LabelCatalog> {
        match self.fetch_catalog() {
            Ok(catalog) => {
                info!(fields = catalog.len(), "label catalog loaded");
                Some(catalog)
            }
            Err(error) => {
                warn!(%error, "using built-in option lists");
                None
            }
        }
    }

    pub fn fetch_catalog(&self) -> Result<LabelCatalog, ServiceError> {
        let unavailable = |reason: String| ServiceError::CatalogUnavailable { reason };

        let response = self
            .http
            .get(format!("{}/labels", self.base_url))
            .send()
            .map_err(|error| unavailable(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("server returned {}", status.as_u16())));
        }

        response
            .json::<LabelCatalog>()
            .map_err(|error| unavailable(format!("decode labels: {error}")))
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<RawPrediction, ServiceError> {
        debug!(fields = request.len(), "sending prediction request");
        let response = self
            .http
            .post(format!("{}/predict", self.base_url))
            .json(request)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "prediction rejected");
            return Err(ServiceError::PredictionFailed {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|error| malformed(format!("read body: {error}")))?;
        let prediction = decode_prediction(&body)?;
        info!(
            churn = prediction.churn.as_str(),
            probability = prediction.probability,
            "prediction received"
        );
        Ok(prediction)
    }

    pub fn ping(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .map_err(|error| anyhow::Error::new(connection_error(&self.base_url, error)))?;

        let status = response.status();
        if !status.is_success() {
            bail!(
                "health check at {} returned {} -- verify the service is the churn API",
                self.base_url,
                status.as_u16()
            );
        }

        let health: HealthResponse = response
            .json()
            .with_context(|| format!("decode health response from {}", self.base_url))?;
        if health.status != "ok" {
            bail!(
                "service at {} reports status {:?}",
                self.base_url,
                health.status
            );
        }
        Ok(())
    }
}

pub fn decode_prediction(body: &str) -> Result<RawPrediction, ServiceError> {
    let prediction: RawPrediction =
        serde_json::from_str(body).map_err(|error| malformed(error.to_string()))?;
    if !prediction.probability.is_finite() || !(0.0..=1.0).contains(&prediction.probability) {
        return Err(malformed(format!(
            "probability {} outside [0, 1]",
            prediction.probability
        )));
    }
    Ok(prediction)
}

fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = Url::parse(base_url).with_context(|| {
        format!("api.base_url {base_url:?} is not a URL -- use e.g. http://localhost:8000")
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "api.base_url {base_url:?} must use http or https, got {:?}",
            parsed.scheme()
        );
    }
    Ok(())
}

fn connection_error(base_url: &str, error: reqwest::Error) -> ServiceError {
    ServiceError::Unreachable {
        base_url: base_url.to_owned(),
        reason: error.to_string(),
    }
}

fn malformed(reason: String) -> ServiceError {
    ServiceError::MalformedResponse { reason }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}
