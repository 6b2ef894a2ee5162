use std::path::PathBuf;

use engine::tools::Tool;

#[derive(Debug, clap::Parser)]
#[command(version, about = "Generate and transform images with hosted models")]
pub struct Cli {
    /// RON settings file, instead of the one in the local config dir
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Without a command, a menu of the tools is shown
#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Run one tool
    Run { tool: Tool },
    /// Show the request log of a tool
    History { tool: Tool },
}
