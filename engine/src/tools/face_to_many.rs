//! Restyles a face photo (3D, pixel art, clay, ...) while keeping the identity.

use std::path::{Path, PathBuf};

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

pub const MODEL: &str =
    "fofr/face-to-many:a07f252abbbd832009640b27f063ea52d87d7a23a185ca165bec23b5adc8deaf";

pub const DEFAULT_PROMPT: &str = "a person";

#[derive(Debug, Clone, Copy, Display, EnumIter, Serialize, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    #[strum(to_string = "3D")]
    #[serde(rename = "3D")]
    ThreeD,
    Pixels,
    Clay,
    #[strum(to_string = "Video game")]
    #[serde(rename = "Video game")]
    VideoGame,
    Emoji,
    Toy,
}

#[derive(Debug, Clone, Serialize)]
pub struct Params {
    #[serde(rename = "input_image")]
    pub image: PathBuf,
    pub style: Style,
    pub prompt: String,
    pub seed: Option<u64>,
    pub lora_scale: f64,
    pub custom_lora_url: Option<String>,
    pub negative_prompt: Option<String>,
    pub prompt_strength: f64,
    pub denoising_strength: f64,
    pub instant_id_strength: f64,
    pub control_depth_strength: f64,
}

impl Params {
    pub fn new(image: PathBuf) -> Self {
        Self {
            image,
            style: Style::default(),
            prompt: DEFAULT_PROMPT.into(),
            seed: None,
            lora_scale: 1.0,
            custom_lora_url: None,
            negative_prompt: None,
            prompt_strength: 4.5,
            denoising_strength: 0.65,
            instant_id_strength: 1.0,
            control_depth_strength: 0.8,
        }
    }

    pub fn payload(&self, image: String) -> Payload<'_> {
        Payload {
            image,
            style: self.style,
            prompt: &self.prompt,
            instant_id_strength: self.instant_id_strength,
            prompt_strength: self.prompt_strength,
            denoising_strength: self.denoising_strength,
            control_depth_strength: self.control_depth_strength,
            lora_scale: self.lora_scale,
            seed: self.seed,
            custom_lora_url: self.custom_lora_url.as_deref(),
            negative_prompt: self.negative_prompt.as_deref(),
        }
    }

    pub fn input(&self) -> Result<Value> {
        let image = data_uri::encode_file(&self.image)?;
        Ok(serde_json::to_value(self.payload(image))?)
    }
}

#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    image: String,
    style: Style,
    prompt: &'a str,
    instant_id_strength: f64,
    prompt_strength: f64,
    denoising_strength: f64,
    control_depth_strength: f64,
    lora_scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_lora_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct LogEntry<'a> {
    pub timestamp: NaiveDateTime,
    #[serde(flatten)]
    pub params: &'a Params,
    pub output_image: &'a Path,
    pub output_url: &'a str,
}

pub async fn run(studio: &Studio, params: &Params) -> Outcome {
    info!("Generating transformed image...");
    let urls = studio.try_generate(Tool::FaceToMany, params.input()).await;
    let Some(url) = urls.into_iter().next() else {
        return Outcome::default();
    };
    info!("Generated URL: {url}");

    let saved = studio
        .save_all(Tool::FaceToMany, std::slice::from_ref(&url), |_| {
            "transformed".into()
        })
        .await;
    if let Some(output_image) = saved.first() {
        studio.record(
            Tool::FaceToMany,
            &LogEntry {
                timestamp: now(),
                params,
                output_image,
                output_url: &url,
            },
        );
    }

    Outcome {
        urls: vec![url],
        saved,
    }
}
