// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;
use std::collections::BTreeMap;

use crate::form::{FieldValue, FormState};
use crate::schema::FieldKind;

/// One payload value. JSON has no NaN, so a number that failed to parse goes
/// out as `null` and the service rejects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireValue {
    Number(f64),
    Text(String),
}

impl WireValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// `/predict` body keyed by schema field name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredictionRequest(BTreeMap<&'static str, WireValue>);

impl PredictionRequest {
    pub fn get(&self, name: &str) -> Option<&WireValue> {
        self.0.get(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Coerces numeric fields and passes every other field through. Range checks
/// are the service's job.
pub fn normalize(form: &FormState) -> PredictionRequest {
    let payload = form
        .iter()
        .map(|(spec, value)| {
            let wire = match spec.kind {
                FieldKind::Numeric => WireValue::Number(parse_number(value)),
                FieldKind::Categorical => WireValue::Text(value.display()),
            };
            (spec.name, wire)
        })
        .collect();
    PredictionRequest(payload)
}

/// Number parse for a form value; blank or non-numeric text is NaN.
pub fn parse_number(value: &FieldValue) -> f64 {
    match value {
        FieldValue::Number(number) => *number,
        FieldValue::Text(text) => text.trim().parse::<f64>().unwrap_or(f64::NAN),
    }
}
