use std::time::Duration;

use async_stream::try_stream;
use color_eyre::{
    Result,
    eyre::{ensure, eyre},
};
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tokio_stream::Stream;

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub request_id: String,
    pub status_url: String,
    pub response_url: String,
}

#[derive(Debug, Deserialize)]
pub struct QueueStatus {
    pub status: String,
    pub queue_position: Option<u64>,
    // missing or null until the job wrote something
    #[serde(default)]
    logs: Option<Vec<LogLine>>,
}

impl QueueStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self.status.as_str(), "IN_QUEUE" | "IN_PROGRESS")
    }

    /// The full job log so far
    pub fn logs(&self) -> &[LogLine] {
        self.logs.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogLine {
    pub message: String,
}

fn auth(api_key: &str) -> String {
    format!("Key {api_key}")
}

/// Puts a job for `model` on the fal queue
pub async fn submit(
    model: &str,
    input: &Value,
    api_key: &str,
    queue_base: &str,
    client: &Client,
) -> Result<SubmitResponse> {
    let resp = client
        .post(format!("{queue_base}/{model}"))
        .header(ACCEPT, "application/json")
        .header(AUTHORIZATION, auth(api_key))
        .json(input)
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;

    ensure!(
        status.is_success(),
        "Failed to submit fal job: {} - {}",
        status,
        text
    );

    Ok(serde_json::from_str(&text)?)
}

/// Polls the job status (with logs) until it leaves the queue. The last item is the final
/// status.
pub fn status_updates<'a>(
    status_url: &'a str,
    api_key: &'a str,
    client: &'a Client,
    poll_interval: Duration,
) -> impl Stream<Item = Result<QueueStatus>> + Send + 'a {
    try_stream! {
        loop {
            let resp = client
                .get(status_url)
                .query(&[("logs", "1")])
                .header(ACCEPT, "application/json")
                .header(AUTHORIZATION, auth(api_key))
                .send()
                .await?;

            let status = resp.status();
            let text = resp.text().await?;
            if !status.is_success() {
                Err(eyre!("fal status poll failed {}: {}", status, text))?;
            }

            let update = serde_json::from_str::<QueueStatus>(&text)?;
            let pending = update.is_pending();
            yield update;

            if !pending {
                break;
            }
            sleep(poll_interval).await;
        }
    }
}

pub async fn fetch_result(response_url: &str, api_key: &str, client: &Client) -> Result<Value> {
    let resp = client
        .get(response_url)
        .header(ACCEPT, "application/json")
        .header(AUTHORIZATION, auth(api_key))
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;
    ensure!(
        status.is_success(),
        "Failed to fetch fal result: {} - {}",
        status,
        text
    );

    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_logs_read_as_empty() -> Result<()> {
        let update: QueueStatus = serde_json::from_value(json!({
            "status": "IN_QUEUE",
            "queue_position": 0,
            "logs": null,
        }))?;
        assert!(update.is_pending());
        assert!(update.logs().is_empty());

        let update: QueueStatus = serde_json::from_value(json!({"status": "COMPLETED"}))?;
        assert!(!update.is_pending());
        assert!(update.logs().is_empty());
        Ok(())
    }
}
