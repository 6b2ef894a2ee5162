use std::io::{BufRead, Write};

use color_eyre::Result;
use engine::{
    config::{Credentials, Settings},
    request_log::RequestLog,
    studio::Studio,
    tools::Tool,
};
use log::{debug, info};
use serde_json::Value;

use crate::{
    cli::{Cli, Command},
    prompt::Prompter,
};

pub mod cli;
pub mod prompt;
pub mod wizard;

pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!("{settings:?}");
    settings.ensure_dirs()?;

    let mut p = Prompter::stdio();
    match cli.command {
        Some(Command::History { tool }) => history(&mut p, &settings, tool),
        Some(Command::Run { tool }) => run_tool(&mut p, settings, tool).await,
        None => {
            let tool = p.choose_enum::<Tool>("Choose a tool:")?;
            run_tool(&mut p, settings, tool).await
        }
    }
}

/// Credentials are checked before the first question is asked
async fn run_tool<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    settings: Settings,
    tool: Tool,
) -> Result<()> {
    let studio = Studio::connect(tool.provider(), settings, &Credentials::from_env())?;
    info!("{tool} runs on {}", studio.provider());
    wizard::run(tool, p, &studio).await
}

pub fn history<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    settings: &Settings,
    tool: Tool,
) -> Result<()> {
    let log = RequestLog::new(&settings.logs_dir, tool.log_file_name());
    let entries = log.entries()?;
    p.say(format!(
        "{} logged requests for {tool} in {}",
        entries.len(),
        log.path().display()
    ))?;
    for entry in &entries {
        p.say(summarize(entry))?;
    }
    Ok(())
}

/// `<timestamp>  <prompt or style>  (<n> images)`
fn summarize(entry: &Value) -> String {
    let text = |key: &str| entry.get(key).and_then(Value::as_str);
    let timestamp = text("timestamp").unwrap_or("?");
    let what = ["prompt", "base_prompt", "style_prompt", "style"]
        .into_iter()
        .find_map(text)
        .unwrap_or("");
    let images = match entry.get("output_images") {
        Some(Value::Array(images)) => images.len(),
        _ => usize::from(text("output_image").is_some()),
    };
    format!("{timestamp}  {what}  ({images} images)")
}
