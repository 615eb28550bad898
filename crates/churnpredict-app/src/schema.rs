// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::LabelCatalog;

pub const YES_NO: &[&str] = &["Yes", "No"];
pub const GENDERS: &[&str] = &["Male", "Female"];
pub const PAYMENT_METHODS: &[&str] = &[
    "Electronic check",
    "Mailed check",
    "Bank transfer (automatic)",
    "Credit card (automatic)",
];
pub const CONTRACTS: &[&str] = &["Month-to-month", "One year", "Two year"];
pub const INTERNET_SERVICES: &[&str] = &["DSL", "Fiber optic", "No"];
pub const FLAG_VALUES: &[&str] = &["0", "1"];

/// Fields whose option lists the service publishes through `/labels`.
pub const CATALOG_FIELDS: [&str; 3] = ["PaymentMethod", "Contract", "InternetService"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidget {
    Entry,
    Checkbox,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Empty,
    Flag(u8),
    Text(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSection {
    Financial,
    Profile,
    ContractPayment,
    Services,
}

impl FormSection {
    pub const ALL: [Self; 4] = [
        Self::Financial,
        Self::Profile,
        Self::ContractPayment,
        Self::Services,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Financial => "Financial Information",
            Self::Profile => "Customer Profile",
            Self::ContractPayment => "Contract & Payment",
            Self::Services => "Services",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub widget: FieldWidget,
    pub section: FormSection,
    pub default: FieldDefault,
    pub allowed_values: Option<&'static [&'static str]>,
}

const fn entry(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Numeric,
        widget: FieldWidget::Entry,
        section: FormSection::Financial,
        default: FieldDefault::Empty,
        allowed_values: None,
    }
}

const fn select(
    name: &'static str,
    label: &'static str,
    section: FormSection,
    default: &'static str,
    allowed: &'static [&'static str],
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Categorical,
        widget: FieldWidget::Select,
        section,
        default: FieldDefault::Text(default),
        allowed_values: Some(allowed),
    }
}

/// Every input the prediction endpoint accepts, in form order.
pub const FIELDS: [FieldSpec; 19] = [
    entry("TotalCharges", "Total Charges ($)"),
    entry("MonthlyCharges", "Monthly Charges ($)"),
    entry("tenure", "Tenure (months)"),
    select("gender", "Gender", FormSection::Profile, "Male", GENDERS),
    FieldSpec {
        name: "SeniorCitizen",
        label: "Senior Citizen",
        kind: FieldKind::Numeric,
        widget: FieldWidget::Checkbox,
        section: FormSection::Profile,
        default: FieldDefault::Flag(0),
        allowed_values: Some(FLAG_VALUES),
    },
    select("Partner", "Partner", FormSection::Profile, "No", YES_NO),
    select("Dependents", "Dependents", FormSection::Profile, "No", YES_NO),
    select("PhoneService", "Phone Service", FormSection::Services, "Yes", YES_NO),
    select("MultipleLines", "Multiple Lines", FormSection::Services, "No", YES_NO),
    select("OnlineSecurity", "Online Security", FormSection::Services, "No", YES_NO),
    select("OnlineBackup", "Online Backup", FormSection::Services, "No", YES_NO),
    select("DeviceProtection", "Device Protection", FormSection::Services, "No", YES_NO),
    select("TechSupport", "Tech Support", FormSection::Services, "No", YES_NO),
    select("StreamingTV", "Streaming TV", FormSection::Services, "No", YES_NO),
    select("StreamingMovies", "Streaming Movies", FormSection::Services, "No", YES_NO),
    select("PaperlessBilling", "Paperless Billing", FormSection::Services, "Yes", YES_NO),
    select(
        "PaymentMethod",
        "Payment Method",
        FormSection::ContractPayment,
        "Electronic check",
        PAYMENT_METHODS,
    ),
    select(
        "Contract",
        "Contract",
        FormSection::ContractPayment,
        "Month-to-month",
        CONTRACTS,
    ),
    select(
        "InternetService",
        "Internet Service",
        FormSection::ContractPayment,
        "Fiber optic",
        INTERNET_SERVICES,
    ),
];

pub fn field_index(name: &str) -> Option<usize> {
    FIELDS.iter().position(|field| field.name == name)
}

pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|field| field.name == name)
}

pub fn field_names() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|field| field.name)
}

/// Fields of one section, keeping declaration order.
pub fn section_fields(section: FormSection) -> impl Iterator<Item = (usize, &'static FieldSpec)> {
    FIELDS
        .iter()
        .enumerate()
        .filter(move |(_, field)| field.section == section)
}

/// Option list for a choice field: the server catalog wins when it carries a
/// non-empty list, otherwise the built-in defaults apply.
pub fn options_for(spec: &FieldSpec, catalog: Option<&LabelCatalog>) -> Vec<String> {
    if let Some(values) = catalog.and_then(|catalog| catalog.get(spec.name))
        && !values.is_empty()
    {
        return values.to_vec();
    }

    spec.allowed_values
        .unwrap_or(&[])
        .iter()
        .map(|value| (*value).to_owned())
        .collect()
}
