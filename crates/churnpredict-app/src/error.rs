// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

pub const PREDICTION_FAILED_MESSAGE: &str = "Prediction failed - please check your inputs";

/// Classified failures of the prediction service. None of them ends the
/// session; the view controller turns them into an inline message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("label catalog unavailable: {reason}")]
    CatalogUnavailable { reason: String },
    #[error("prediction request rejected with HTTP {status}")]
    PredictionFailed { status: u16 },
    #[error("cannot reach prediction service at {base_url} ({reason})")]
    Unreachable { base_url: String, reason: String },
    #[error("prediction response could not be decoded: {reason}")]
    MalformedResponse { reason: String },
}

impl ServiceError {
    /// Text shown to the user. Rejected and undecodable predictions read the
    /// same; the detail stays in the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::PredictionFailed { .. } | Self::MalformedResponse { .. } => {
                PREDICTION_FAILED_MESSAGE.to_owned()
            }
            Self::Unreachable { base_url, .. } => {
                format!("Prediction service unreachable at {base_url} - start it and retry")
            }
            Self::CatalogUnavailable { .. } => {
                "Option lists unavailable - using built-in defaults".to_owned()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown form field {0:?}")]
    UnknownField(String),
    #[error("field {0:?} is not a checkbox")]
    NotAFlag(String),
}
