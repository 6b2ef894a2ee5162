use std::io::{BufRead, Write};

use color_eyre::Result;
use engine::{
    config::Settings,
    studio::Studio,
    tools::face_to_many::{self, DEFAULT_PROMPT, Params, Style},
};

use crate::{prompt::Prompter, wizard::select_image};

pub fn ask<R: BufRead, W: Write>(p: &mut Prompter<R, W>, settings: &Settings) -> Result<Params> {
    let image = select_image(p, &settings.upload_dir)?;
    let defaults = Params::new(image);

    let style = p.choose_enum::<Style>("Choose a transformation style:")?;
    let prompt = p.ask_or(
        &format!("\nEnter prompt (default: '{DEFAULT_PROMPT}'): "),
        DEFAULT_PROMPT,
    )?;

    p.say("\nOptional parameters (press Enter for defaults):")?;
    Ok(Params {
        style,
        prompt,
        seed: p.ask_optional_parsed("Random seed for reproducibility (optional): ")?,
        lora_scale: p.ask_parsed_or("LoRA strength (0-1, default 1.0): ", defaults.lora_scale)?,
        custom_lora_url: p.ask_optional("Custom LoRA URL (optional): ")?,
        negative_prompt: p.ask_optional("Negative prompt (optional): ")?,
        prompt_strength: p.ask_parsed_or(
            "Prompt strength (0-20, default 4.5): ",
            defaults.prompt_strength,
        )?,
        denoising_strength: p.ask_parsed_or(
            "Denoising strength (0-1, default 0.65): ",
            defaults.denoising_strength,
        )?,
        instant_id_strength: p.ask_parsed_or(
            "InstantID strength (0-1, default 1.0): ",
            defaults.instant_id_strength,
        )?,
        control_depth_strength: p.ask_parsed_or(
            "Depth control strength (0-1, default 0.8): ",
            defaults.control_depth_strength,
        )?,
        ..defaults
    })
}

pub async fn run<R: BufRead, W: Write>(p: &mut Prompter<R, W>, studio: &Studio) -> Result<()> {
    let params = ask(p, studio.settings())?;
    let outcome = face_to_many::run(studio, &params).await;
    match outcome.saved.first() {
        Some(path) => p.say(format!(
            "\nTransformed image saved successfully to: {}",
            path.display()
        )),
        None if outcome.generated() => p.say("Failed to save the transformed image."),
        None => p.say("Failed to generate transformed image."),
    }
}
