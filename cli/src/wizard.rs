//! One wizard per tool: ask for the parameters, run the tool, tell the user what came out.

use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use color_eyre::Result;
use engine::{
    error::SetupError,
    inputs,
    studio::Studio,
    tools::{Outcome, Tool},
};

use crate::prompt::Prompter;

pub mod face_to_many;
pub mod flux;
pub mod logo;
pub mod photo_maker;
pub mod sticker;

pub async fn run<R: BufRead, W: Write>(
    tool: Tool,
    p: &mut Prompter<R, W>,
    studio: &Studio,
) -> Result<()> {
    match tool {
        Tool::Flux => flux::run(p, studio).await,
        Tool::FaceToMany => face_to_many::run(p, studio).await,
        Tool::Sticker => sticker::run(p, studio).await,
        Tool::Logo => logo::run(p, studio).await,
        Tool::PhotoMaker => photo_maker::run(p, studio).await,
    }
}

/// Menu of the images directly inside `folder`
pub fn select_image<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    folder: &Path,
) -> Result<PathBuf> {
    let mut images = inputs::images_in(folder)?;
    if images.is_empty() {
        return Err(SetupError::NoImages {
            folder: folder.to_path_buf(),
        }
        .into());
    }

    let names: Vec<_> = images.iter().map(|i| inputs::display_name(i)).collect();
    let idx = p.choose(
        "Available images:",
        &names,
        "Enter the number of the image to use: ",
    )?;
    p.say(format!("\nSelected image: {}", names[idx]))?;
    Ok(images.swap_remove(idx))
}

pub fn select_subfolder<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    folder: &Path,
) -> Result<String> {
    let mut names = inputs::subfolders(folder)?;
    if names.is_empty() {
        return Err(SetupError::NoSubfolders {
            folder: folder.to_path_buf(),
        }
        .into());
    }
    let idx = p.choose(
        "Available folders:",
        &names,
        "Enter the number of the folder to use: ",
    )?;
    Ok(names.swap_remove(idx))
}

/// One line per saved file
fn report_saved<R: BufRead, W: Write>(p: &mut Prompter<R, W>, outcome: &Outcome) -> Result<()> {
    for path in &outcome.saved {
        p.say(format!("Image saved: {}", path.display()))?;
    }
    Ok(())
}

/// Saved files followed by a count, for tools that save a batch of images
fn report_batch<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    studio: &Studio,
    tool: Tool,
    what: &str,
    outcome: &Outcome,
) -> Result<()> {
    report_saved(p, outcome)?;
    p.say(format!(
        "\nSaved {} {what} in the '{}' folder.",
        outcome.saved.len(),
        studio.output_folder(tool).display()
    ))
}
