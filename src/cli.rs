use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "ytbrief",
    about = "Turn YouTube captions into a role-tailored briefing",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Config file (default: ~/.config/ytbrief/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP analyze endpoint
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Recover caption text for a video
    Transcript {
        /// YouTube video URL or video ID
        url: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Recover captions and produce the tailored analysis
    Analyze {
        /// YouTube video URL or video ID
        url: String,

        /// Your job role
        #[arg(long)]
        role: Option<String>,

        /// A tool you use daily (repeatable)
        #[arg(long = "tool")]
        tools: Vec<String>,

        /// What you are struggling with right now
        #[arg(long)]
        challenge: Option<String>,

        /// LLM model (overrides config)
        #[arg(long)]
        model: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}
