use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, eyre},
};
use log::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{APP_NAME, error::SetupError, image_model::Provider};

/// Folder layout and provider endpoints. Every field is optional in the RON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub replicate_api_base: String,
    pub fal_queue_base: String,
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            upload_dir: "images_to_upload".into(),
            output_dir: "all_output".into(),
            logs_dir: "logs".into(),
            replicate_api_base: "https://api.replicate.com".into(),
            fal_queue_base: "https://queue.fal.run".into(),
            poll_interval_ms: 500,
        }
    }
}

impl Settings {
    /// Loads `path` if given, otherwise the settings file in the local config dir when it
    /// exists, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => load_ron_file(path),
            None => {
                let path = config_path()?;
                if path.exists() {
                    load_ron_file(&path)
                } else {
                    debug!("No settings at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.upload_dir, &self.output_dir, &self.logs_dir] {
            fs::create_dir_all(dir).wrap_err_with(|| format!("Couldn't create {}", dir.display()))?;
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_local_dir()
        .ok_or(eyre!("Couldn't get config dir"))?
        .join(format!("{APP_NAME}.ron")))
}

pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = fs::read_to_string(path)
        .wrap_err_with(|| format!("Couldn't read settings from {}", path.display()))?;
    Ok(ron::from_str(&src)?)
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub replicate_api_token: Option<String>,
    pub fal_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |provider: Provider| lookup(provider.env_var()).filter(|v| !v.trim().is_empty());
        Self {
            replicate_api_token: get(Provider::Replicate),
            fal_key: get(Provider::Fal),
        }
    }

    pub fn key_for(&self, provider: Provider) -> Result<String, SetupError> {
        let key = match provider {
            Provider::Replicate => &self.replicate_api_token,
            Provider::Fal => &self.fal_key,
        };
        key.clone().ok_or(SetupError::MissingCredential {
            var: provider.env_var(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_ron_file_keeps_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.ron");
        fs::write(&path, r#"(upload_dir: "inbox", poll_interval_ms: 10)"#)?;

        let settings = Settings::load(Some(&path))?;
        assert_eq!(settings.upload_dir, PathBuf::from("inbox"));
        assert_eq!(settings.poll_interval(), Duration::from_millis(10));
        assert_eq!(settings.logs_dir, PathBuf::from("logs"));
        assert_eq!(settings.fal_queue_base, "https://queue.fal.run");
        Ok(())
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/definitely/not/here.ron"))).unwrap_err();
        assert!(err.to_string().contains("Couldn't read settings"));
    }

    #[test]
    fn ensure_dirs_creates_layout() -> Result<()> {
        let dir = tempdir()?;
        let settings = Settings {
            upload_dir: dir.path().join("up"),
            output_dir: dir.path().join("out/nested"),
            logs_dir: dir.path().join("logs"),
            ..Settings::default()
        };
        settings.ensure_dirs()?;
        assert!(settings.upload_dir.is_dir());
        assert!(settings.output_dir.is_dir());
        assert!(settings.logs_dir.is_dir());
        Ok(())
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let creds = Credentials::from_lookup(|var| match var {
            "REPLICATE_API_TOKEN" => Some("r8_token".into()),
            "FAL_KEY" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(creds.key_for(Provider::Replicate).unwrap(), "r8_token");

        let err = creds.key_for(Provider::Fal).unwrap_err();
        assert_eq!(
            err.to_string(),
            "FAL_KEY not found in environment variables. Please check your .env file."
        );
    }
}
