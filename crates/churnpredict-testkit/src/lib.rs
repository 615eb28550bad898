// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use churnpredict_app::{FieldInput, FormState};
use std::io::Read;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

/// Loopback address nothing listens on.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:1";

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

const LABELS_BODY: &str = r#"{
  "YesNo": ["Yes", "No"],
  "PaymentMethod": ["Electronic check", "Mailed check", "Bank transfer (automatic)", "Credit card (automatic)"],
  "Contract": ["Month-to-month", "One year", "Two year"],
  "gender": ["Male", "Female"],
  "InternetService": ["DSL", "Fiber optic", "No"]
}"#;

/// `/labels` body in the shape the churn service publishes.
pub fn labels_body() -> String {
    LABELS_BODY.to_owned()
}

pub fn prediction_body(churn: &str, probability: f64) -> String {
    serde_json::json!({ "churn": churn, "probability": probability }).to_string()
}

/// Fully filled form with the three inputs the key factors look at.
pub fn customer_form(contract: &str, online_security: &str, tenure: &str) -> Result<FormState> {
    let form = FormState::reset()
        .update("TotalCharges", FieldInput::Text("420.5".to_owned()))?
        .update("MonthlyCharges", FieldInput::Text("84.1".to_owned()))?
        .update("tenure", FieldInput::Text(tenure.to_owned()))?
        .update("Contract", FieldInput::Text(contract.to_owned()))?
        .update("OnlineSecurity", FieldInput::Text(online_security.to_owned()))?;
    Ok(form)
}

pub fn new_month_to_month_customer() -> Result<FormState> {
    customer_form("Month-to-month", "No", "5")
}

pub fn loyal_two_year_customer() -> Result<FormState> {
    customer_form("Two year", "Yes", "48")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::json(200, body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json_body(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.body).with_context(|| format!("decode body of {}", self.path))
    }
}

/// Loopback HTTP server that answers requests with scripted replies, in
/// order, and records what it received.
pub struct MockService {
    base_url: String,
    handle: JoinHandle<Result<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn start(replies: Vec<Reply>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || serve(&server, replies));
        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits until every scripted reply was served (or the server gave up
    /// waiting) and returns the recorded requests.
    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock service thread panicked"))?
    }
}

fn serve(server: &Server, replies: Vec<Reply>) -> Result<Vec<RecordedRequest>> {
    let mut recorded = Vec::with_capacity(replies.len());
    for reply in replies {
        let Some(mut request) = server
            .recv_timeout(RECV_TIMEOUT)
            .context("receive mock request")?
        else {
            break;
        };

        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .context("read mock request body")?;
        let content_type = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Content-Type"))
            .map(|header| header.value.as_str().to_owned());
        recorded.push(RecordedRequest {
            method: request.method().to_string(),
            path: request.url().to_owned(),
            content_type,
            body,
        });

        let header = Header::from_bytes("Content-Type", "application/json")
            .map_err(|()| anyhow!("build content type header"))?;
        let response = Response::from_string(reply.body)
            .with_status_code(reply.status)
            .with_header(header);
        request.respond(response).context("send mock response")?;
    }
    Ok(recorded)
}
