use std::{pin::Pin, time::Duration};

use color_eyre::Result;
use log::{debug, info};
use serde_json::Value;
use tokio::pin;
use tokio_stream::StreamExt;

use crate::{
    error::PredictionError,
    image_model::{ImageModel, Provider},
};

pub mod queue_api;
use queue_api::LogLine;

/// The status endpoint returns the full log every time. Returns the lines after the first
/// `seen` and moves `seen` past them.
fn unseen<'a>(logs: &'a [LogLine], seen: &mut usize) -> &'a [LogLine] {
    let new = logs.get(*seen..).unwrap_or_default();
    *seen = (*seen).max(logs.len());
    new
}

#[derive(Clone)]
pub struct Fal {
    api_key: String,
    queue_base: String,
    poll_interval: Duration,
    client: reqwest::Client,
}

impl Fal {
    pub fn new(api_key: String, queue_base: String, poll_interval: Duration) -> Self {
        Self {
            api_key,
            queue_base: queue_base.trim_end_matches('/').to_string(),
            poll_interval,
            client: reqwest::Client::new(),
        }
    }
}

impl ImageModel for Fal {
    fn run<'a>(
        &'a self,
        model: &'a str,
        input: &'a Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>> {
        Box::pin(async move {
            let submitted =
                queue_api::submit(model, input, &self.api_key, &self.queue_base, &self.client)
                    .await?;
            debug!("Queue submission: {submitted:#?}");

            let updates = queue_api::status_updates(
                &submitted.status_url,
                &self.api_key,
                &self.client,
                self.poll_interval,
            );
            pin!(updates);

            let mut seen_logs = 0;
            let mut last_status = None;
            while let Some(update) = updates.try_next().await? {
                if let Some(position) = update.queue_position {
                    debug!("Queue position: {position}");
                }
                for line in unseen(update.logs(), &mut seen_logs) {
                    info!("{}", line.message);
                }
                last_status = Some(update.status);
            }

            match last_status.as_deref() {
                Some("COMPLETED") => {
                    queue_api::fetch_result(&submitted.response_url, &self.api_key, &self.client)
                        .await
                }
                other => Err(PredictionError::QueueFailed {
                    request_id: submitted.request_id.clone(),
                    status: other.unwrap_or("no status").to_string(),
                }
                .into()),
            }
        })
    }

    fn provider(&self) -> Provider {
        Provider::Fal
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, query_param},
    };

    use super::*;

    const MODEL: &str = "fal-ai/flux-pro/v1.1";

    fn backend(server: &MockServer) -> Fal {
        Fal::new("fal_key".into(), server.uri(), Duration::from_millis(1))
    }

    /// Accepts the job and hands out `/q/status` and `/q/result` as its URLs
    async fn mount_submit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/fal-ai/flux-pro/v1.1"))
            .and(header("authorization", "Key fal_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "request_id": "r1",
                "status_url": format!("{}/q/status", server.uri()),
                "response_url": format!("{}/q/result", server.uri()),
            })))
            .mount(server)
            .await;
    }

    async fn mount_status(server: &MockServer, body: Value, times: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path("/q/status"))
            .and(query_param("logs", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body));
        match times {
            Some(n) => mock.up_to_n_times(n).mount(server).await,
            None => mock.mount(server).await,
        }
    }

    fn lines(messages: &[&str]) -> Vec<LogLine> {
        messages
            .iter()
            .map(|m| LogLine {
                message: m.to_string(),
            })
            .collect()
    }

    #[test]
    fn only_new_log_lines_are_reported() {
        let mut seen = 0;
        let first = lines(&["step 1"]);
        let second = lines(&["step 1", "step 2", "done"]);

        assert_eq!(unseen(&[], &mut seen).len(), 0);
        assert_eq!(unseen(&first, &mut seen)[0].message, "step 1");
        let new: Vec<_> = unseen(&second, &mut seen)
            .iter()
            .map(|l| l.message.as_str())
            .collect();
        assert_eq!(new, ["step 2", "done"]);
        assert!(unseen(&second, &mut seen).is_empty());
        // a shorter log than before reports nothing
        assert!(unseen(&first, &mut seen).is_empty());
        assert_eq!(seen, 3);
    }

    #[tokio::test]
    async fn subscribes_until_completed() -> Result<()> {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        mount_status(
            &server,
            json!({"status": "IN_QUEUE", "queue_position": 2, "logs": null}),
            Some(1),
        )
        .await;
        mount_status(
            &server,
            json!({"status": "IN_PROGRESS", "logs": [{"message": "step 1"}]}),
            Some(1),
        )
        .await;
        mount_status(
            &server,
            json!({"status": "COMPLETED", "logs": [{"message": "step 1"}, {"message": "done"}]}),
            None,
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/q/result"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"images": [{"url": "https://fal.media/a.jpg"}], "seed": 7}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let input = json!({"prompt": "a lighthouse"});
        let output = backend(&server).run(MODEL, &input).await?;
        assert_eq!(output["images"][0]["url"], "https://fal.media/a.jpg");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 5);
        assert_eq!(requests[0].body_json::<Value>()?, input);
        assert_eq!(requests[1].url.query(), Some("logs=1"));
        Ok(())
    }

    #[tokio::test]
    async fn error_status_ends_the_subscription() -> Result<()> {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        mount_status(&server, json!({"status": "ERROR"}), None).await;

        let err = backend(&server).run(MODEL, &json!({})).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PredictionError>(),
            Some(PredictionError::QueueFailed { status, .. }) if status == "ERROR"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_submit_is_an_error() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fal-ai/flux-pro/v1.1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "bad key"})))
            .mount(&server)
            .await;

        let err = backend(&server).run(MODEL, &json!({})).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to submit fal job: 401"), "{msg}");
        assert!(msg.contains("bad key"), "{msg}");
        Ok(())
    }

    #[tokio::test]
    async fn failed_status_poll_is_an_error() -> Result<()> {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/q/status"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/q/result"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let err = backend(&server).run(MODEL, &json!({})).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("fal status poll failed 503"), "{msg}");
        assert!(msg.contains("overloaded"), "{msg}");
        Ok(())
    }

    #[tokio::test]
    async fn failed_result_fetch_is_an_error() -> Result<()> {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        mount_status(&server, json!({"status": "COMPLETED"}), None).await;
        Mock::given(method("GET"))
            .and(path("/q/result"))
            .respond_with(ResponseTemplate::new(500).set_body_string("lost"))
            .mount(&server)
            .await;

        let err = backend(&server).run(MODEL, &json!({})).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to fetch fal result: 500"), "{err}");
        Ok(())
    }
}
