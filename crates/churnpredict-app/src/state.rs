// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::error::{FormError, ServiceError};
use crate::form::{FieldInput, FormState};
use crate::interpret::interpret;
use crate::model::{LabelCatalog, PredictionResult, RawPrediction, ViewKind};
use crate::normalize::{PredictionRequest, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStatus {
    Pending,
    Loaded,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub view: ViewKind,
    pub form: FormState,
    pub catalog: Option<LabelCatalog>,
    pub catalog_status: CatalogStatus,
    pub loading: bool,
    pub submitted_form: Option<FormState>,
    pub result: Option<PredictionResult>,
    pub error: Option<String>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view: ViewKind::Dashboard,
            form: FormState::reset(),
            catalog: None,
            catalog_status: CatalogStatus::Pending,
            loading: false,
            submitted_form: None,
            result: None,
            error: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    ShowDashboard,
    ShowPredictor,
    BackToForm,
    UpdateField { name: String, input: FieldInput },
    Submit,
    PredictionCompleted(Result<RawPrediction, ServiceError>),
    CatalogLoaded(Option<LabelCatalog>),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    ViewChanged(ViewKind),
    FieldUpdated(String),
    FieldRejected(FormError),
    SubmissionStarted(PredictionRequest),
    SubmissionIgnored,
    ResultReady,
    PredictionFailed(String),
    CatalogApplied,
    CatalogUnavailable,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ShowDashboard => self.set_view(ViewKind::Dashboard),
            AppCommand::ShowPredictor => self.set_view(ViewKind::PredictorForm),
            AppCommand::BackToForm => {
                if self.view != ViewKind::PredictorResult {
                    return Vec::new();
                }
                self.set_view(ViewKind::PredictorForm)
            }
            AppCommand::UpdateField { name, input } => match self.form.update(&name, input) {
                Ok(form) => {
                    self.form = form;
                    vec![AppEvent::FieldUpdated(name)]
                }
                Err(error) => {
                    let status = self.set_status(&error.to_string());
                    vec![AppEvent::FieldRejected(error), status]
                }
            },
            AppCommand::Submit => self.begin_submission(),
            AppCommand::PredictionCompleted(outcome) => self.complete_submission(outcome),
            AppCommand::CatalogLoaded(catalog) => self.apply_catalog(catalog),
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn showing_result(&self) -> bool {
        self.view == ViewKind::PredictorResult && self.result.is_some()
    }

    fn set_view(&mut self, view: ViewKind) -> Vec<AppEvent> {
        if self.view == view {
            return Vec::new();
        }
        // A result only lives as long as its view.
        if self.view == ViewKind::PredictorResult {
            self.result = None;
        }
        self.view = view;
        vec![AppEvent::ViewChanged(view)]
    }

    fn begin_submission(&mut self) -> Vec<AppEvent> {
        if self.loading || self.view != ViewKind::PredictorForm {
            return vec![AppEvent::SubmissionIgnored];
        }

        self.loading = true;
        self.error = None;
        self.result = None;
        self.submitted_form = Some(self.form.clone());
        vec![AppEvent::SubmissionStarted(normalize(&self.form))]
    }

    fn complete_submission(
        &mut self,
        outcome: Result<RawPrediction, ServiceError>,
    ) -> Vec<AppEvent> {
        if !self.loading {
            return Vec::new();
        }
        self.loading = false;

        match outcome {
            Ok(raw) => {
                let submitted = self.submitted_form.take().unwrap_or_else(|| self.form.clone());
                self.result = Some(interpret(&raw, &submitted));
                let mut events = vec![AppEvent::ResultReady];
                if self.view == ViewKind::PredictorForm {
                    events.extend(self.set_view(ViewKind::PredictorResult));
                }
                events
            }
            Err(error) => {
                self.submitted_form = None;
                let message = error.user_message();
                self.error = Some(message.clone());
                vec![AppEvent::PredictionFailed(message)]
            }
        }
    }

    fn apply_catalog(&mut self, catalog: Option<LabelCatalog>) -> Vec<AppEvent> {
        if self.catalog_status != CatalogStatus::Pending {
            return Vec::new();
        }

        match catalog {
            Some(catalog) => {
                self.catalog = Some(catalog);
                self.catalog_status = CatalogStatus::Loaded;
                vec![AppEvent::CatalogApplied]
            }
            None => {
                self.catalog_status = CatalogStatus::Unavailable;
                let status = self.set_status("option lists unavailable; using built-in defaults");
                vec![AppEvent::CatalogUnavailable, status]
            }
        }
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, CatalogStatus};
    use crate::error::{FormError, PREDICTION_FAILED_MESSAGE, ServiceError};
    use crate::form::FieldInput;
    use crate::model::{ChurnLabel, LabelCatalog, RawPrediction, RiskTier, ViewKind};

    fn predictor_state() -> AppState {
        let mut state = AppState::default();
        state.dispatch(AppCommand::ShowPredictor);
        state
    }

    fn set_field(state: &mut AppState, name: &str, value: &str) {
        state.dispatch(AppCommand::UpdateField {
            name: name.to_owned(),
            input: FieldInput::Text(value.to_owned()),
        });
    }

    fn raw(churn: ChurnLabel, probability: f64) -> RawPrediction {
        RawPrediction { churn, probability }
    }

    #[test]
    fn starts_on_dashboard() {
        let state = AppState::default();
        assert_eq!(state.view, ViewKind::Dashboard);
        assert!(!state.loading);
        assert_eq!(state.catalog_status, CatalogStatus::Pending);
    }

    #[test]
    fn selecting_predictor_opens_form() {
        let mut state = AppState::default();
        let events = state.dispatch(AppCommand::ShowPredictor);
        assert_eq!(state.view, ViewKind::PredictorForm);
        assert_eq!(events, vec![AppEvent::ViewChanged(ViewKind::PredictorForm)]);
    }

    #[test]
    fn field_edit_keeps_view() {
        let mut state = predictor_state();
        let events = state.dispatch(AppCommand::UpdateField {
            name: "tenure".to_owned(),
            input: FieldInput::Text("7".to_owned()),
        });
        assert_eq!(state.view, ViewKind::PredictorForm);
        assert_eq!(state.form.text("tenure"), "7");
        assert_eq!(events, vec![AppEvent::FieldUpdated("tenure".to_owned())]);
    }

    #[test]
    fn unknown_field_is_reported_without_touching_form() {
        let mut state = predictor_state();
        let before = state.form.clone();
        let events = state.dispatch(AppCommand::UpdateField {
            name: "bogus".to_owned(),
            input: FieldInput::Text("x".to_owned()),
        });
        assert_eq!(state.form, before);
        assert_eq!(
            events[0],
            AppEvent::FieldRejected(FormError::UnknownField("bogus".to_owned()))
        );
    }

    #[test]
    fn submit_sets_loading_and_emits_request() {
        let mut state = predictor_state();
        set_field(&mut state, "tenure", "5");

        let events = state.dispatch(AppCommand::Submit);
        assert!(state.loading);
        match &events[..] {
            [AppEvent::SubmissionStarted(request)] => {
                assert_eq!(
                    request.get("tenure").and_then(|value| value.as_number()),
                    Some(5.0)
                );
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn second_submit_is_ignored_while_loading() {
        let mut state = predictor_state();
        state.dispatch(AppCommand::Submit);
        let events = state.dispatch(AppCommand::Submit);
        assert_eq!(events, vec![AppEvent::SubmissionIgnored]);
        assert!(state.loading);
    }

    #[test]
    fn submit_outside_form_view_is_ignored() {
        let mut state = AppState::default();
        assert_eq!(
            state.dispatch(AppCommand::Submit),
            vec![AppEvent::SubmissionIgnored]
        );
        assert!(!state.loading);
    }

    #[test]
    fn success_switches_to_result_view() {
        let mut state = predictor_state();
        set_field(&mut state, "tenure", "5");
        state.dispatch(AppCommand::Submit);

        let events = state.dispatch(AppCommand::PredictionCompleted(Ok(raw(
            ChurnLabel::Yes,
            0.82,
        ))));
        assert_eq!(
            events,
            vec![
                AppEvent::ResultReady,
                AppEvent::ViewChanged(ViewKind::PredictorResult),
            ]
        );
        assert!(!state.loading);
        assert!(state.showing_result());
        let result = state.result.as_ref().expect("result stored");
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn interpretation_uses_form_as_submitted() {
        let mut state = predictor_state();
        set_field(&mut state, "tenure", "5");
        state.dispatch(AppCommand::Submit);
        set_field(&mut state, "tenure", "60");

        state.dispatch(AppCommand::PredictionCompleted(Ok(raw(ChurnLabel::Yes, 0.9))));
        let result = state.result.as_ref().expect("result stored");
        assert_eq!(result.factors[2], "New customer (under 1 year)");
        assert_eq!(state.form.text("tenure"), "60");
    }

    #[test]
    fn failure_keeps_form_and_surfaces_message() {
        let mut state = predictor_state();
        set_field(&mut state, "tenure", "5");
        let before = state.form.clone();
        state.dispatch(AppCommand::Submit);

        let events = state.dispatch(AppCommand::PredictionCompleted(Err(
            ServiceError::PredictionFailed { status: 500 },
        )));
        assert_eq!(
            events,
            vec![AppEvent::PredictionFailed(
                PREDICTION_FAILED_MESSAGE.to_owned()
            )]
        );
        assert!(!state.loading);
        assert_eq!(state.view, ViewKind::PredictorForm);
        assert_eq!(state.form, before);
        assert_eq!(state.error.as_deref(), Some(PREDICTION_FAILED_MESSAGE));
    }

    #[test]
    fn retry_after_failure_clears_error() {
        let mut state = predictor_state();
        state.dispatch(AppCommand::Submit);
        state.dispatch(AppCommand::PredictionCompleted(Err(
            ServiceError::MalformedResponse {
                reason: "eof".to_owned(),
            },
        )));
        assert!(state.error.is_some());

        state.dispatch(AppCommand::Submit);
        assert!(state.error.is_none());
        assert!(state.loading);
    }

    #[test]
    fn back_from_result_keeps_inputs() {
        let mut state = predictor_state();
        set_field(&mut state, "MonthlyCharges", "70.35");
        state.dispatch(AppCommand::Submit);
        state.dispatch(AppCommand::PredictionCompleted(Ok(raw(ChurnLabel::No, 0.2))));

        let events = state.dispatch(AppCommand::BackToForm);
        assert_eq!(events, vec![AppEvent::ViewChanged(ViewKind::PredictorForm)]);
        assert!(!state.showing_result());
        assert!(state.result.is_none());
        assert_eq!(state.form.text("MonthlyCharges"), "70.35");
    }

    #[test]
    fn back_is_a_no_op_outside_result_view() {
        let mut state = predictor_state();
        assert!(state.dispatch(AppCommand::BackToForm).is_empty());
        assert_eq!(state.view, ViewKind::PredictorForm);
    }

    #[test]
    fn dashboard_then_predictor_starts_at_form() {
        let mut state = predictor_state();
        state.dispatch(AppCommand::Submit);
        state.dispatch(AppCommand::PredictionCompleted(Ok(raw(ChurnLabel::No, 0.2))));
        assert_eq!(state.view, ViewKind::PredictorResult);

        state.dispatch(AppCommand::ShowDashboard);
        assert_eq!(state.view, ViewKind::Dashboard);
        assert!(state.result.is_none());
        state.dispatch(AppCommand::ShowPredictor);
        assert_eq!(state.view, ViewKind::PredictorForm);
    }

    #[test]
    fn completion_while_on_dashboard_does_not_steal_view() {
        let mut state = predictor_state();
        state.dispatch(AppCommand::Submit);
        state.dispatch(AppCommand::ShowDashboard);

        let events = state.dispatch(AppCommand::PredictionCompleted(Ok(raw(
            ChurnLabel::Yes,
            0.75,
        ))));
        assert_eq!(events, vec![AppEvent::ResultReady]);
        assert_eq!(state.view, ViewKind::Dashboard);
        assert!(!state.loading);
    }

    #[test]
    fn stray_completion_without_submission_is_ignored() {
        let mut state = predictor_state();
        let events = state.dispatch(AppCommand::PredictionCompleted(Ok(raw(
            ChurnLabel::Yes,
            0.75,
        ))));
        assert!(events.is_empty());
        assert!(state.result.is_none());
    }

    #[test]
    fn catalog_is_applied_once() {
        let mut state = AppState::default();
        let first = LabelCatalog::from_entries([(
            "Contract".to_owned(),
            vec!["Two year".to_owned()],
        )]);
        assert_eq!(
            state.dispatch(AppCommand::CatalogLoaded(Some(first.clone()))),
            vec![AppEvent::CatalogApplied]
        );

        let second = LabelCatalog::from_entries([("Contract".to_owned(), Vec::new())]);
        assert!(state.dispatch(AppCommand::CatalogLoaded(Some(second))).is_empty());
        assert_eq!(state.catalog, Some(first));
    }

    #[test]
    fn missing_catalog_degrades_to_defaults_and_stays_submittable() {
        let mut state = predictor_state();
        let events = state.dispatch(AppCommand::CatalogLoaded(None));
        assert_eq!(events[0], AppEvent::CatalogUnavailable);
        assert_eq!(state.catalog_status, CatalogStatus::Unavailable);
        assert!(state.catalog.is_none());

        let submit = state.dispatch(AppCommand::Submit);
        assert!(matches!(submit[..], [AppEvent::SubmissionStarted(_)]));
    }

    #[test]
    fn status_can_be_set_and_cleared() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SetStatus("hello".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("hello"));
        assert_eq!(
            state.dispatch(AppCommand::ClearStatus),
            vec![AppEvent::StatusCleared]
        );
        assert!(state.status_line.is_none());
    }
}
