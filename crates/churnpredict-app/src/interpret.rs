// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::form::{FieldValue, FormState};
use crate::model::{ConfidenceTier, PredictionResult, RawPrediction, RiskTier};

const HIGH_RISK_ABOVE: f64 = 0.7;
const MEDIUM_RISK_ABOVE: f64 = 0.4;
const HIGH_CONFIDENCE_ABOVE: f64 = 0.8;
const MEDIUM_CONFIDENCE_ABOVE: f64 = 0.5;
const NEW_CUSTOMER_MONTHS: f64 = 12.0;

/// Enriches a raw prediction. `submitted` must be the form exactly as it was
/// sent, not whatever the user has typed since.
pub fn interpret(raw: &RawPrediction, submitted: &FormState) -> PredictionResult {
    PredictionResult {
        churn: raw.churn,
        probability: raw.probability,
        risk_tier: risk_tier(raw.probability),
        confidence_tier: confidence_tier(raw.probability),
        factors: key_factors(submitted),
    }
}

pub fn risk_tier(probability: f64) -> RiskTier {
    if probability > HIGH_RISK_ABOVE {
        RiskTier::High
    } else if probability > MEDIUM_RISK_ABOVE {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

pub fn confidence_tier(probability: f64) -> ConfidenceTier {
    if probability > HIGH_CONFIDENCE_ABOVE {
        ConfidenceTier::High
    } else if probability > MEDIUM_CONFIDENCE_ABOVE {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

pub fn key_factors(form: &FormState) -> Vec<String> {
    let contract = if form.text("Contract") == "Month-to-month" {
        "Month-to-month contract increases risk"
    } else {
        "Long-term contract reduces risk"
    };
    let security = if form.text("OnlineSecurity") == "No" {
        "Lack of online security increases risk"
    } else {
        "Online security reduces risk"
    };

    let tenure_text = form.text("tenure");
    let tenure = if is_new_customer(form.get("tenure")) {
        "New customer (under 1 year)".to_owned()
    } else {
        format!("Loyal customer ({tenure_text} months)")
    };

    vec![contract.to_owned(), security.to_owned(), tenure]
}

// Blank tenure counts as zero months; text that is not a number never
// compares below the threshold.
fn is_new_customer(tenure: Option<&FieldValue>) -> bool {
    let months = match tenure {
        Some(FieldValue::Number(value)) => *value,
        Some(FieldValue::Text(text)) if text.trim().is_empty() => 0.0,
        Some(FieldValue::Text(text)) => text.trim().parse::<f64>().unwrap_or(f64::NAN),
        None => f64::NAN,
    };
    months < NEW_CUSTOMER_MONTHS
}
