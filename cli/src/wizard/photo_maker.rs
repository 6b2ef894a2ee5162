use std::io::{BufRead, Write};

use color_eyre::Result;
use engine::{
    config::Settings,
    error::SetupError,
    inputs,
    studio::Studio,
    tools::photo_maker::{
        self, DEFAULT_NEGATIVE_PROMPT, DEFAULT_PROMPT, MAX_INPUT_IMAGES, Params, Style,
        TRIGGER_WORD, with_trigger_word,
    },
};
use nonempty::NonEmpty;

use crate::{
    prompt::Prompter,
    wizard::{report_saved, select_subfolder},
};

pub fn ask<R: BufRead, W: Write>(p: &mut Prompter<R, W>, settings: &Settings) -> Result<Params> {
    let folder_name = select_subfolder(p, &settings.upload_dir)?;
    let folder = settings.upload_dir.join(&folder_name);
    let images = NonEmpty::from_vec(inputs::images_in(&folder)?)
        .ok_or(SetupError::NoImages { folder })?;

    p.say(format!("\nFound {} images in {folder_name}", images.len()))?;
    if images.len() > MAX_INPUT_IMAGES {
        p.say(format!(
            "Note: Only the first {MAX_INPUT_IMAGES} images will be used due to API limitations"
        ))?;
    }
    let mut params = Params::new(folder_name, images);

    let prompt = p.ask_or(
        &format!("\nEnter prompt (default: '{DEFAULT_PROMPT}'): "),
        DEFAULT_PROMPT,
    )?;
    let (prompt, added) = with_trigger_word(&prompt);
    params.prompt = prompt;
    if added {
        p.say(format!(
            "Warning: Adding '{TRIGGER_WORD}' trigger word to prompt"
        ))?;
    }

    params.style_name = p.choose_enum::<Style>("Available styles:")?;

    p.say("\nOptional parameters (press Enter for defaults):")?;
    params.num_steps =
        p.ask_parsed_or("Number of steps (1-100, default 20): ", params.num_steps)?;
    params.num_outputs =
        p.ask_parsed_or("Number of outputs (1-4, default 1): ", params.num_outputs)?;
    params.guidance_scale =
        p.ask_parsed_or("Guidance scale (1-10, default 5): ", params.guidance_scale)?;
    params.style_strength_ratio = p.ask_parsed_or(
        "Style strength % (15-50, default 20): ",
        params.style_strength_ratio,
    )?;
    params.seed = p.ask_optional_parsed("Seed (optional, press Enter for random): ")?;
    params.negative_prompt =
        if p.confirm("Use default negative prompt? (y/n, default: y): ", true)? {
            Some(DEFAULT_NEGATIVE_PROMPT.to_string())
        } else {
            p.ask_optional("Enter custom negative prompt: ")?
        };
    params.disable_safety_checker =
        p.confirm("Disable safety checker? (y/n, default: n): ", false)?;

    Ok(params)
}

pub async fn run<R: BufRead, W: Write>(p: &mut Prompter<R, W>, studio: &Studio) -> Result<()> {
    let params = ask(p, studio.settings())?;
    p.say("\nGenerating photos...")?;
    let outcome = photo_maker::run(studio, &params).await;
    if !outcome.generated() {
        p.say("Failed to generate photos.")
    } else if outcome.saved.is_empty() {
        p.say("Failed to save any generated images.")
    } else {
        report_saved(p, &outcome)?;
        p.say(format!(
            "\nSaved {} images successfully.",
            outcome.saved.len()
        ))
    }
}
