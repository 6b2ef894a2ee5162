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
    "fofr/face-to-sticker:764d4827ea159608a07cdde8ddf1c6000019627515eb02b6b449695fd547e5ef";

/// Style prompts offered in the menu. Anything else can be typed in as a custom prompt.
#[derive(Debug, Clone, Copy, Display, EnumIter, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum StylePreset {
    Cartoon,
    Anime,
    Pixar,
    Disney,
    #[strum(to_string = "south park")]
    SouthPark,
    #[strum(to_string = "rick and morty")]
    RickAndMorty,
}

#[derive(Debug, Clone, Serialize)]
pub struct Params {
    #[serde(rename = "input_image")]
    pub image: PathBuf,
    pub style_prompt: String,
    pub prompt_strength: f64,
    pub instant_id_strength: f64,
}

impl Params {
    pub fn new(image: PathBuf, style_prompt: String) -> Self {
        Self {
            image,
            style_prompt,
            prompt_strength: 4.5,
            instant_id_strength: 0.7,
        }
    }

    pub fn payload(&self, image: String) -> Payload<'_> {
        Payload {
            image,
            prompt: &self.style_prompt,
            prompt_strength: self.prompt_strength,
            instant_id_strength: self.instant_id_strength,
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
    prompt: &'a str,
    prompt_strength: f64,
    instant_id_strength: f64,
}

#[derive(Debug, Serialize)]
pub struct LogEntry<'a> {
    pub timestamp: NaiveDateTime,
    #[serde(flatten)]
    pub params: &'a Params,
    pub output_image: &'a Path,
    pub sticker_url: &'a str,
}

pub async fn run(studio: &Studio, params: &Params) -> Outcome {
    info!("Generating sticker...");
    let urls = studio.try_generate(Tool::Sticker, params.input()).await;
    let Some(url) = urls.into_iter().next() else {
        return Outcome::default();
    };

    let saved = studio
        .save_all(Tool::Sticker, std::slice::from_ref(&url), |_| {
            "sticker".into()
        })
        .await;
    if let Some(output_image) = saved.first() {
        studio.record(
            Tool::Sticker,
            &LogEntry {
                timestamp: now(),
                params,
                output_image,
                sticker_url: &url,
            },
        );
    }

    Outcome {
        urls: vec![url],
        saved,
    }
}
