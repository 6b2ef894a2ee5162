use std::io::{BufRead, Write};

use color_eyre::Result;
use engine::{
    config::Settings,
    studio::Studio,
    tools::sticker::{self, Params, StylePreset},
};
use strum::IntoEnumIterator;

use crate::{prompt::Prompter, wizard::select_image};

const CUSTOM: &str = "custom (enter your own)";

fn ask_style<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> Result<String> {
    let mut options: Vec<String> = StylePreset::iter().map(|s| s.to_string()).collect();
    options.push(CUSTOM.into());
    let idx = p.choose(
        "Choose a sticker style:",
        &options,
        "Enter the number of your choice: ",
    )?;
    if idx == options.len() - 1 {
        p.ask("Enter your custom style prompt: ")
    } else {
        Ok(options.swap_remove(idx))
    }
}

pub fn ask<R: BufRead, W: Write>(p: &mut Prompter<R, W>, settings: &Settings) -> Result<Params> {
    let image = select_image(p, &settings.upload_dir)?;
    let defaults = Params::new(image, ask_style(p)?);
    Ok(Params {
        prompt_strength: p.ask_parsed_or(
            "Enter prompt strength (0-10, default 4.5) or press Enter: ",
            defaults.prompt_strength,
        )?,
        instant_id_strength: p.ask_parsed_or(
            "Enter identity preservation strength (0-1, default 0.7) or press Enter: ",
            defaults.instant_id_strength,
        )?,
        ..defaults
    })
}

pub async fn run<R: BufRead, W: Write>(p: &mut Prompter<R, W>, studio: &Studio) -> Result<()> {
    let params = ask(p, studio.settings())?;
    let outcome = sticker::run(studio, &params).await;
    match outcome.saved.first() {
        Some(path) => p.say(format!(
            "\nSticker saved successfully to: {}",
            path.display()
        )),
        None if outcome.generated() => p.say("Failed to save the sticker."),
        None => p.say("Failed to generate sticker."),
    }
}
