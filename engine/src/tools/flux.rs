use std::path::PathBuf;

use chrono::NaiveDateTime;
use color_eyre::Result;
use log::info;
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter};

use crate::{
    data_uri,
    studio::Studio,
    tools::{Outcome, Tool, now},
};

pub const MODEL: &str = "fal-ai/flux-pro/v1.1";

pub const MAX_IMAGES: u32 = 4;

#[derive(Debug, Clone, Copy, Display, EnumIter, Serialize, PartialEq, Eq, Default)]
pub enum ImageSize {
    #[strum(to_string = "square_hd")]
    #[serde(rename = "square_hd")]
    SquareHd,
    #[strum(to_string = "square")]
    #[serde(rename = "square")]
    Square,
    #[strum(to_string = "portrait_4_3")]
    #[serde(rename = "portrait_4_3")]
    Portrait4x3,
    #[strum(to_string = "portrait_16_9")]
    #[serde(rename = "portrait_16_9")]
    Portrait16x9,
    #[default]
    #[strum(to_string = "landscape_4_3")]
    #[serde(rename = "landscape_4_3")]
    Landscape4x3,
    #[strum(to_string = "landscape_16_9")]
    #[serde(rename = "landscape_16_9")]
    Landscape16x9,
}

#[derive(Debug, Clone, Serialize)]
pub struct Params {
    pub prompt: String,
    pub image_size: ImageSize,
    num_images: u32,
    pub input_image: Option<PathBuf>,
}

impl Params {
    /// `num_images` is clamped to `1..=MAX_IMAGES`
    pub fn new(prompt: String, image_size: ImageSize, num_images: u32) -> Self {
        Self {
            prompt,
            image_size,
            num_images: num_images.clamp(1, MAX_IMAGES),
            input_image: None,
        }
    }

    pub fn with_input_image(mut self, image: PathBuf) -> Self {
        self.input_image = Some(image);
        self
    }

    pub fn num_images(&self) -> u32 {
        self.num_images
    }

    pub fn payload(&self, image: Option<String>) -> Payload<'_> {
        Payload {
            prompt: &self.prompt,
            image_size: self.image_size,
            num_images: self.num_images,
            enable_safety_checker: false,
            safety_tolerance: "6",
            image,
        }
    }

    pub fn input(&self) -> Result<Value> {
        let image = self
            .input_image
            .as_deref()
            .map(data_uri::encode_file)
            .transpose()?;
        Ok(serde_json::to_value(self.payload(image))?)
    }
}

#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    prompt: &'a str,
    image_size: ImageSize,
    num_images: u32,
    enable_safety_checker: bool,
    safety_tolerance: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogEntry<'a> {
    pub timestamp: NaiveDateTime,
    #[serde(flatten)]
    pub params: &'a Params,
    pub output_images: &'a [PathBuf],
    pub output_urls: &'a [String],
}

pub async fn run(studio: &Studio, params: &Params) -> Outcome {
    info!("Generating {} image(s)...", params.num_images);
    let urls = studio.try_generate(Tool::Flux, params.input()).await;
    if urls.is_empty() {
        return Outcome::default();
    }

    let saved = studio
        .save_all(Tool::Flux, &urls, |_| "generated_image".into())
        .await;
    if !saved.is_empty() {
        studio.record(
            Tool::Flux,
            &LogEntry {
                timestamp: now(),
                params,
                output_images: &saved,
                output_urls: &urls,
            },
        );
    }

    Outcome { urls, saved }
}
