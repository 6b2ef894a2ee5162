use std::path::PathBuf;

use color_eyre::{Result, eyre::WrapErr as _};
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{
    ImgModBox,
    config::{Credentials, Settings},
    download,
    error::{PredictionError, SetupError},
    image_model::Provider,
    output,
    request_log::RequestLog,
    tools::Tool,
};

/// One provider backend plus everything needed to save and log its results.
pub struct Studio {
    model: ImgModBox,
    client: Client,
    settings: Settings,
}

impl Studio {
    pub fn connect(
        provider: Provider,
        settings: Settings,
        credentials: &Credentials,
    ) -> Result<Self, SetupError> {
        let key = credentials.key_for(provider)?;
        let model = provider.make(key, &settings);
        Ok(Self::with_model(model, settings))
    }

    pub fn with_model(model: ImgModBox, settings: Settings) -> Self {
        Self {
            model,
            client: Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn provider(&self) -> Provider {
        self.model.provider()
    }

    pub fn output_folder(&self, tool: Tool) -> PathBuf {
        self.settings.output_dir.join(tool.output_subdir())
    }

    pub fn request_log(&self, tool: Tool) -> RequestLog {
        RequestLog::new(&self.settings.logs_dir, tool.log_file_name())
    }

    /// Runs `model` and returns the image URLs of its output
    pub async fn generate(&self, model: &str, input: &Value) -> Result<Vec<String>> {
        debug!(
            "Running {model} with parameters {:?}",
            input.as_object().map(|obj| obj.keys().collect::<Vec<_>>())
        );
        let raw = self.model.run(model, input).await?;
        debug!("Raw output: {raw}");
        let urls = output::image_urls(&raw);
        if urls.is_empty() {
            return Err(PredictionError::NoOutput.into());
        }
        Ok(urls)
    }

    /// Like [`Studio::generate`], but a failure (including building the input) is reported
    /// and turns into an empty list.
    pub async fn try_generate(&self, tool: Tool, input: Result<Value>) -> Vec<String> {
        let result = match input {
            Ok(input) => self.generate(tool.model_ref(), &input).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            error!("Error running {tool}: {e:#}");
            vec![]
        })
    }

    /// Downloads every URL into the tool's output folder. `name` gets the 1-based position
    /// of the URL and returns the file prefix. Failed downloads are reported and skipped.
    pub async fn save_all(
        &self,
        tool: Tool,
        urls: &[String],
        name: impl Fn(usize) -> String,
    ) -> Vec<PathBuf> {
        let folder = self.output_folder(tool);
        if let Err(e) = std::fs::create_dir_all(&folder) {
            error!("Couldn't create {}: {e}", folder.display());
            return vec![];
        }

        let mut saved = vec![];
        for (i, url) in urls.iter().enumerate() {
            match download::save_image(&self.client, url, &folder, &name(i + 1), tool.extension())
                .await
            {
                Ok(path) => {
                    info!("Image saved: {}", path.display());
                    saved.push(path);
                }
                Err(e) => warn!("{e:#}"),
            }
        }
        saved
    }

    /// Appends `entry` to the tool's request log. Failures are reported, not returned.
    pub fn record<T: Serialize>(&self, tool: Tool, entry: &T) {
        let log = self.request_log(tool);
        match log
            .append(entry)
            .wrap_err_with(|| format!("Error saving log {}", log.path().display()))
        {
            Ok(()) => info!("Request log saved to {}", log.path().display()),
            Err(e) => error!("{e:#}"),
        }
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use wiremock::MockServer;

    use super::{testing::*, *};
    use crate::download::testing::serve_image;

    #[test]
    fn connect_needs_the_provider_credential() {
        let creds = Credentials {
            replicate_api_token: Some("r8".into()),
            fal_key: None,
        };
        assert!(Studio::connect(Provider::Replicate, Settings::default(), &creds).is_ok());

        let err = Studio::connect(Provider::Fal, Settings::default(), &creds)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            SetupError::MissingCredential { var: "FAL_KEY" }
        ));
    }

    #[tokio::test]
    async fn output_without_urls_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let canned = Canned::new(vec![Ok(json!({"status": "ok"}))]);
        let err = studio(&canned, &dir)
            .generate("m:v", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PredictionError>(),
            Some(PredictionError::NoOutput)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn failures_become_empty_results() -> Result<()> {
        let dir = tempdir()?;
        let canned = Canned::new(vec![Err("boom".into())]);
        let studio = studio(&canned, &dir);

        assert!(studio.try_generate(Tool::Logo, Ok(json!({}))).await.is_empty());
        assert!(
            studio
                .try_generate(Tool::Logo, Err(color_eyre::eyre::eyre!("bad input")))
                .await
                .is_empty()
        );
        assert_eq!(canned.calls.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn save_all_skips_failed_downloads() -> Result<()> {
        let dir = tempdir()?;
        let server = MockServer::start().await;
        let urls = vec![
            serve_image(&server, "/ok/1.png", b"first").await,
            format!("{}/missing.png", server.uri()),
            serve_image(&server, "/ok/2.png", b"second").await,
        ];

        let studio = studio(&Canned::default(), &dir);
        let saved = studio
            .save_all(Tool::PhotoMaker, &urls, |i| format!("photomaker_me_{i}"))
            .await;

        assert_eq!(saved.len(), 2);
        let names: Vec<_> = saved
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names[0].starts_with("photomaker_me_1_"), "{names:?}");
        assert!(names[1].starts_with("photomaker_me_3_"), "{names:?}");
        assert!(saved.iter().all(|p| p.starts_with(dir.path().join("all_output/photo_maker"))));
        Ok(())
    }

    #[test]
    fn record_failure_does_not_propagate() -> Result<()> {
        let dir = tempdir()?;
        let mut settings = settings_in(&dir);
        // a file where the logs folder should be
        std::fs::write(dir.path().join("blocked"), b"")?;
        settings.logs_dir = dir.path().join("blocked");
        let studio = Studio::with_model(Box::new(Canned::default()), settings);

        studio.record(Tool::Logo, &json!({"prompt": "x"}));
        assert!(!studio.request_log(Tool::Logo).path().exists());
        Ok(())
    }
}
