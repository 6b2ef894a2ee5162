use std::pin::Pin;

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter};

pub mod fal;
pub use fal::Fal;

pub mod replicate;
pub use replicate::Replicate;

use crate::{ImgModBox, config::Settings};

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    EnumIter,
)]
pub enum Provider {
    Replicate,
    #[strum(to_string = "fal.ai")]
    Fal,
}

impl Provider {
    pub fn make(&self, key: String, settings: &Settings) -> ImgModBox {
        match self {
            Provider::Replicate => Box::new(Replicate::new(
                key,
                settings.replicate_api_base.clone(),
                settings.poll_interval(),
            )),
            Provider::Fal => Box::new(Fal::new(
                key,
                settings.fal_queue_base.clone(),
                settings.poll_interval(),
            )),
        }
    }

    /// Environment variable holding the provider's credential
    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::Replicate => "REPLICATE_API_TOKEN",
            Provider::Fal => "FAL_KEY",
        }
    }
}

/// A hosted inference provider. `run` resolves to the provider's raw output JSON once the
/// job finished; see [`crate::output`] for turning that into image URLs.
pub trait ImageModel {
    fn run<'a>(
        &'a self,
        model: &'a str,
        input: &'a Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

    fn provider(&self) -> Provider;
}
