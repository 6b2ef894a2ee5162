//! Personalised photos from up to four reference pictures of the same person. The prompt
//! has to mention the trigger word `img` where the person should appear.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use color_eyre::{Result, eyre::eyre};
use log::{info, warn};
use nonempty::NonEmpty;
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter};

use crate::{
    data_uri,
    studio::Studio,
    tools::{Outcome, Tool, now},
};

pub const MODEL: &str =
    "tencentarc/photomaker:ddfc2b08d209f9fa8c1eca692712918bd449f695dabb4a958da31802a9570fe4";

pub const MAX_INPUT_IMAGES: usize = 4;
pub const TRIGGER_WORD: &str = "img";
pub const DEFAULT_PROMPT: &str = "A photo of a person img";
pub const DEFAULT_NEGATIVE_PROMPT: &str = "nsfw, lowres, bad anatomy, bad hands, bad eyes, text, error, missing fingers, extra digit, fewer digits, cropped, worst quality, low quality, normal quality, jpeg artifacts, signature, watermark, username, blurry";

// "Charactor" is how the model spells it
#[derive(Debug, Clone, Copy, Display, EnumIter, Serialize, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    #[strum(to_string = "Photographic (Default)")]
    #[serde(rename = "Photographic (Default)")]
    Photographic,
    #[strum(to_string = "(No style)")]
    #[serde(rename = "(No style)")]
    NoStyle,
    Cinematic,
    #[strum(to_string = "Disney Charactor")]
    #[serde(rename = "Disney Charactor")]
    DisneyCharactor,
    #[strum(to_string = "Digital Art")]
    #[serde(rename = "Digital Art")]
    DigitalArt,
    #[strum(to_string = "Fantasy art")]
    #[serde(rename = "Fantasy art")]
    FantasyArt,
    Neonpunk,
    Enhance,
    #[strum(to_string = "Comic book")]
    #[serde(rename = "Comic book")]
    ComicBook,
    Lowpoly,
    #[strum(to_string = "Line art")]
    #[serde(rename = "Line art")]
    LineArt,
}

/// Appends the trigger word when the prompt lacks it. The flag tells whether it was added.
pub fn with_trigger_word(prompt: &str) -> (String, bool) {
    if prompt.contains(TRIGGER_WORD) {
        (prompt.to_string(), false)
    } else {
        (format!("{prompt} {TRIGGER_WORD}"), true)
    }
}

#[derive(Debug, Clone)]
pub struct Params {
    pub input_folder: String,
    images: NonEmpty<PathBuf>,
    pub prompt: String,
    pub style_name: Style,
    pub num_steps: u32,
    pub num_outputs: u32,
    pub guidance_scale: f64,
    pub style_strength_ratio: f64,
    pub seed: Option<u64>,
    pub negative_prompt: Option<String>,
    pub disable_safety_checker: bool,
}

impl Params {
    /// Keeps at most [`MAX_INPUT_IMAGES`] of `images`
    pub fn new(input_folder: String, mut images: NonEmpty<PathBuf>) -> Self {
        images.tail.truncate(MAX_INPUT_IMAGES - 1);
        Self {
            input_folder,
            images,
            prompt: DEFAULT_PROMPT.into(),
            style_name: Style::default(),
            num_steps: 20,
            num_outputs: 1,
            guidance_scale: 5.0,
            style_strength_ratio: 20.0,
            seed: None,
            negative_prompt: Some(DEFAULT_NEGATIVE_PROMPT.into()),
            disable_safety_checker: false,
        }
    }

    pub fn images(&self) -> &NonEmpty<PathBuf> {
        &self.images
    }

    pub fn payload(&self, images: NonEmpty<String>) -> Payload<'_> {
        let mut extra = images.tail.into_iter();
        Payload {
            prompt: &self.prompt,
            num_steps: self.num_steps,
            style_name: self.style_name,
            num_outputs: self.num_outputs,
            guidance_scale: self.guidance_scale,
            style_strength_ratio: self.style_strength_ratio,
            disable_safety_checker: self.disable_safety_checker,
            input_image: images.head,
            input_image2: extra.next(),
            input_image3: extra.next(),
            input_image4: extra.next(),
            seed: self.seed,
            negative_prompt: self.negative_prompt.as_deref().filter(|p| !p.is_empty()),
        }
    }

    pub fn input(&self) -> Result<Value> {
        let encoded = self
            .images
            .iter()
            .map(|path| data_uri::encode_file(path))
            .collect::<Result<Vec<_>>>()?;
        let encoded = NonEmpty::from_vec(encoded).ok_or(eyre!("No input images"))?;
        Ok(serde_json::to_value(self.payload(encoded))?)
    }
}

#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    prompt: &'a str,
    num_steps: u32,
    style_name: Style,
    num_outputs: u32,
    guidance_scale: f64,
    style_strength_ratio: f64,
    disable_safety_checker: bool,
    input_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_image2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_image3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_image4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct LogEntry<'a> {
    pub timestamp: NaiveDateTime,
    pub input_folder: &'a str,
    pub input_images: Vec<&'a PathBuf>,
    pub prompt: &'a str,
    pub style_name: Style,
    pub num_steps: u32,
    pub num_outputs: u32,
    pub guidance_scale: f64,
    pub style_strength_ratio: f64,
    pub seed: Option<u64>,
    pub negative_prompt: Option<&'a str>,
    pub disable_safety_checker: bool,
    pub output_images: &'a [PathBuf],
    pub output_urls: &'a [String],
}

impl<'a> LogEntry<'a> {
    fn new(params: &'a Params, output_images: &'a [PathBuf], output_urls: &'a [String]) -> Self {
        Self {
            timestamp: now(),
            input_folder: &params.input_folder,
            input_images: params.images.iter().collect(),
            prompt: &params.prompt,
            style_name: params.style_name,
            num_steps: params.num_steps,
            num_outputs: params.num_outputs,
            guidance_scale: params.guidance_scale,
            style_strength_ratio: params.style_strength_ratio,
            seed: params.seed,
            negative_prompt: params.negative_prompt.as_deref(),
            disable_safety_checker: params.disable_safety_checker,
            output_images,
            output_urls,
        }
    }
}

pub async fn run(studio: &Studio, params: &Params) -> Outcome {
    info!("Using {} images from {}", params.images.len(), params.input_folder);
    if !params.prompt.contains(TRIGGER_WORD) {
        warn!("Prompt lacks the trigger word '{TRIGGER_WORD}'");
    }

    let urls = studio.try_generate(Tool::PhotoMaker, params.input()).await;
    if urls.is_empty() {
        return Outcome::default();
    }

    let saved = studio
        .save_all(Tool::PhotoMaker, &urls, |i| {
            format!("photomaker_{}_{i}", params.input_folder)
        })
        .await;
    if !saved.is_empty() {
        studio.record(Tool::PhotoMaker, &LogEntry::new(params, &saved, &urls));
    }

    Outcome { urls, saved }
}
