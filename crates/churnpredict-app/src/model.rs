// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server-provided option lists keyed by field name. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelCatalog(BTreeMap<String, Vec<String>>);

impl LabelCatalog {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self(entries.into_iter().collect())
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChurnLabel {
    Yes,
    No,
}

impl ChurnLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Yes" => Some(Self::Yes),
            "No" => Some(Self::No),
            _ => None,
        }
    }
}

/// `/predict` response body as the service sends it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    pub churn: ChurnLabel,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub churn: ChurnLabel,
    pub probability: f64,
    pub risk_tier: RiskTier,
    pub confidence_tier: ConfidenceTier,
    pub factors: Vec<String>,
}

impl PredictionResult {
    pub const fn verdict_label(&self) -> &'static str {
        match self.churn {
            ChurnLabel::Yes => "High Churn Risk",
            ChurnLabel::No => "Low Churn Risk",
        }
    }

    pub const fn recommended_action(&self) -> &'static str {
        match self.churn {
            ChurnLabel::Yes => "Offer retention package",
            ChurnLabel::No => "Standard monitoring",
        }
    }

    pub fn probability_percent(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    Dashboard,
    PredictorForm,
    PredictorResult,
}

impl ViewKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::PredictorForm => "predictor",
            Self::PredictorResult => "result",
        }
    }

    pub const fn is_predictor(self) -> bool {
        matches!(self, Self::PredictorForm | Self::PredictorResult)
    }
}
