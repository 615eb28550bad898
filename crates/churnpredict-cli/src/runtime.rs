// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use churnpredict_app::{LabelCatalog, PredictionRequest, RawPrediction, ServiceError};
use churnpredict_client::Client;
use churnpredict_tui::{AppRuntime, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

/// Runtime backed by the churn prediction service. Network calls made from
/// the UI run on short-lived worker threads so the event loop never blocks.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for HttpRuntime {
    fn load_catalog(&mut self) -> Option<LabelCatalog> {
        self.client.load_catalog()
    }

    fn predict(&mut self, request: &PredictionRequest) -> Result<RawPrediction, ServiceError> {
        self.client.predict(request)
    }

    fn spawn_catalog_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("catalog-load".to_owned())
            .spawn(move || {
                let catalog = client.load_catalog();
                if tx.send(InternalEvent::CatalogLoaded(catalog)).is_err() {
                    debug!("ui closed before catalog arrived");
                }
            })
            .context("spawn catalog loader thread")?;
        Ok(())
    }

    fn spawn_prediction(
        &mut self,
        request_id: u64,
        request: PredictionRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("predict-{request_id}"))
            .spawn(move || {
                let outcome = client.predict(&request);
                let event = InternalEvent::Prediction {
                    request_id,
                    outcome,
                };
                if tx.send(event).is_err() {
                    debug!(request_id, "ui closed before prediction arrived");
                }
            })
            .context("spawn prediction thread")?;
        Ok(())
    }
}
