use std::{pin::Pin, time::Duration};

use color_eyre::{
    Result,
    eyre::{ensure, eyre},
};
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::sleep;

use crate::{
    error::PredictionError,
    image_model::{ImageModel, Provider},
};

#[derive(Clone)]
pub struct Replicate {
    client: Client,
    api_key: String,
    api_base: String,
    poll_interval: Duration,
}

impl Replicate {
    pub fn new(api_key: String, api_base: String, poll_interval: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            poll_interval,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: String,
}

impl PredictionResponse {
    fn error_message(&self) -> String {
        match &self.error {
            Value::Null => "no error details".into(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Splits `owner/name:version` into the model name and the version id.
pub fn split_model_ref(model: &str) -> Result<(&str, &str)> {
    model
        .split_once(':')
        .filter(|(name, version)| !name.is_empty() && !version.is_empty())
        .ok_or_else(|| eyre!("Expected a model reference like owner/name:version, got {model}"))
}

impl ImageModel for Replicate {
    fn run<'a>(
        &'a self,
        model: &'a str,
        input: &'a Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>> {
        Box::pin(async move {
            let (name, version) = split_model_ref(model)?;
            info!("Starting Replicate prediction for {name}");

            // 1. Create prediction
            let create_resp = self
                .client
                .post(format!("{}/v1/predictions", self.api_base))
                .bearer_auth(&self.api_key)
                .json(&json!({
                    "version": version,
                    "input": input,
                }))
                .send()
                .await?;

            let status = create_resp.status();
            let body = create_resp.text().await?;
            ensure!(
                status.is_success(),
                "Prediction request error: {status} - {body}"
            );

            let mut prediction = serde_json::from_str::<PredictionResponse>(&body)?;
            let poll_url = prediction.urls.as_ref().map(|urls| urls.get.clone());

            // 2. Poll until finished
            loop {
                match prediction.status.as_str() {
                    "succeeded" => return Ok(prediction.output),
                    "failed" | "canceled" => {
                        return Err(PredictionError::Failed {
                            message: prediction.error_message(),
                            status: prediction.status,
                        }
                        .into());
                    }
                    _ => {}
                }

                let url = poll_url
                    .as_deref()
                    .ok_or_else(|| eyre!("Missing prediction get URL:\n{prediction:#?}"))?;
                sleep(self.poll_interval).await;

                prediction = self
                    .client
                    .get(url)
                    .bearer_auth(&self.api_key)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<PredictionResponse>()
                    .await?;
                debug!("Prediction status: {}", prediction.status);
            }
        })
    }

    fn provider(&self) -> Provider {
        Provider::Replicate
    }
}
