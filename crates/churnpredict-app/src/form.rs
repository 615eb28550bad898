// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::error::FormError;
use crate::schema::{FIELDS, FieldDefault, FieldSpec, FieldWidget, field_index};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// Literal form of the value as the user would see it.
    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(value) => format_number(*value),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }
}

/// Raw input delivered by a form widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text(String),
    Checked(bool),
}

/// Immutable snapshot of every schema field, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    values: Vec<FieldValue>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::reset()
    }
}

impl FormState {
    pub fn reset() -> Self {
        Self {
            values: FIELDS.iter().map(default_value).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        field_index(name).and_then(|index| self.values.get(index))
    }

    /// Display text for `name`, empty when the field does not exist.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(FieldValue::display).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, &FieldValue)> {
        FIELDS.iter().zip(self.values.iter())
    }

    /// New snapshot with one field replaced. Checkbox input is stored as the
    /// number 1 or 0, which is what the model expects on the wire.
    pub fn update(&self, name: &str, input: FieldInput) -> Result<Self, FormError> {
        let index = field_index(name).ok_or_else(|| FormError::UnknownField(name.to_owned()))?;
        let value = match input {
            FieldInput::Checked(checked) => {
                if FIELDS[index].widget != FieldWidget::Checkbox {
                    return Err(FormError::NotAFlag(name.to_owned()));
                }
                FieldValue::Number(if checked { 1.0 } else { 0.0 })
            }
            FieldInput::Text(text) => FieldValue::Text(text),
        };

        let mut values = self.values.clone();
        values[index] = value;
        Ok(Self { values })
    }
}

fn default_value(spec: &FieldSpec) -> FieldValue {
    match spec.default {
        FieldDefault::Empty => FieldValue::Text(String::new()),
        FieldDefault::Flag(flag) => FieldValue::Number(f64::from(flag)),
        FieldDefault::Text(text) => FieldValue::Text(text.to_owned()),
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
