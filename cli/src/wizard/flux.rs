use std::io::{BufRead, Write};

use color_eyre::Result;
use engine::{
    config::Settings,
    studio::Studio,
    tools::{
        Tool,
        flux::{self, ImageSize, Params},
    },
};

use crate::{
    prompt::Prompter,
    wizard::{report_batch, select_image},
};

pub fn ask<R: BufRead, W: Write>(p: &mut Prompter<R, W>, settings: &Settings) -> Result<Params> {
    let prompt = p.ask("Insert Prompt: ")?;
    let image_size = p.choose_enum::<ImageSize>("Choose an image size:")?;
    let num_images = p.ask_parsed_or(
        &format!("Number of images (1-{}, default 1): ", flux::MAX_IMAGES),
        1,
    )?;
    let params = Params::new(prompt, image_size, num_images);

    if p.confirm("Use an input image? (y/n, default: n): ", false)? {
        let image = select_image(p, &settings.upload_dir)?;
        Ok(params.with_input_image(image))
    } else {
        Ok(params)
    }
}

pub async fn run<R: BufRead, W: Write>(p: &mut Prompter<R, W>, studio: &Studio) -> Result<()> {
    let params = ask(p, studio.settings())?;
    let outcome = flux::run(studio, &params).await;
    if !outcome.generated() {
        return p.say("Failed to generate images.");
    }
    report_batch(p, studio, Tool::Flux, "images", &outcome)
}
