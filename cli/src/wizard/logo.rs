use std::io::{BufRead, Write};

use color_eyre::Result;
use engine::{
    studio::Studio,
    tools::{
        Tool,
        logo::{self, MAX_VARIATIONS, Params, StyleSuffix},
    },
};

use crate::{prompt::Prompter, wizard::report_batch};

pub fn ask<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> Result<Params> {
    let base_prompt = p.ask("Enter your logo description: ")?;
    let style = p.choose_enum::<StyleSuffix>("Choose a logo style:")?;
    let n = p.ask_parsed_or(
        &format!("Enter number of variations to generate (1-{MAX_VARIATIONS}, default 1): "),
        1,
    )?;
    Ok(Params::new(base_prompt, style, n))
}

pub async fn run<R: BufRead, W: Write>(p: &mut Prompter<R, W>, studio: &Studio) -> Result<()> {
    let params = ask(p)?;
    let outcome = logo::run(studio, &params).await;
    report_batch(p, studio, Tool::Logo, "logos", &outcome)
}
