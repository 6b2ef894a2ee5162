use std::path::PathBuf;

use chrono::NaiveDateTime;
use log::info;
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter};

use crate::{
    studio::Studio,
    tools::{Outcome, Tool, now},
};

pub const MODEL: &str =
    "mejiabrayan/logoai:67ed00e8999fecd32035074fa0f2e9a31ee03b57a8415e6a5e2f93a242ddd8d2";

pub const MAX_VARIATIONS: u32 = 5;

#[derive(Debug, Clone, Copy, Display, EnumIter, PartialEq, Eq, Default)]
pub enum StyleSuffix {
    #[default]
    Default,
    #[strum(to_string = "minimalistic, clean, modern")]
    Minimalistic,
    #[strum(to_string = "luxurious, elegant, high-end")]
    Luxurious,
    #[strum(to_string = "playful, creative, bold")]
    Playful,
    #[strum(to_string = "tech, futuristic, innovative")]
    Tech,
    #[strum(to_string = "professional, corporate, trustworthy")]
    Professional,
}

impl StyleSuffix {
    /// Text appended to the prompt. Empty for [`StyleSuffix::Default`].
    pub fn suffix(&self) -> String {
        match self {
            StyleSuffix::Default => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Params {
    pub base_prompt: String,
    pub style: StyleSuffix,
    num_variations: u32,
}

impl Params {
    /// `num_variations` is clamped to `1..=MAX_VARIATIONS`
    pub fn new(base_prompt: String, style: StyleSuffix, num_variations: u32) -> Self {
        Self {
            base_prompt,
            style,
            num_variations: num_variations.clamp(1, MAX_VARIATIONS),
        }
    }

    pub fn num_variations(&self) -> u32 {
        self.num_variations
    }

    pub fn full_prompt(&self) -> String {
        format!("{} {}", self.base_prompt, self.style.suffix())
            .trim()
            .to_string()
    }

    pub fn input(&self) -> Value {
        serde_json::json!({ "prompt": self.full_prompt() })
    }
}

#[derive(Debug, Serialize)]
pub struct LogEntry<'a> {
    pub timestamp: NaiveDateTime,
    pub base_prompt: &'a str,
    pub style_suffix: String,
    pub num_variations: u32,
    pub output_images: &'a [PathBuf],
    pub generation_urls: &'a [String],
}

/// One prediction per variation. A failed variation is reported and skipped; the request
/// is logged even when nothing came out of it.
pub async fn run(studio: &Studio, params: &Params) -> Outcome {
    info!("Generating logos...");
    let mut urls = vec![];
    for i in 0..params.num_variations {
        info!("Variation {}/{}", i + 1, params.num_variations);
        urls.extend(studio.try_generate(Tool::Logo, Ok(params.input())).await);
    }

    let saved = studio.save_all(Tool::Logo, &urls, |_| "logo".into()).await;
    studio.record(
        Tool::Logo,
        &LogEntry {
            timestamp: now(),
            base_prompt: &params.base_prompt,
            style_suffix: params.style.suffix(),
            num_variations: params.num_variations,
            output_images: &saved,
            generation_urls: &urls,
        },
    );

    Outcome { urls, saved }
}
