use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Result, bail};
use log::{LevelFilter, debug, info, warn};

mod cli;

use cli::{Cli, Command, OutputFormat};
use ytbrief::config::Config;
use ytbrief::fallback::Attempt;
use ytbrief::pipeline::{AnalyzeError, Analyzer};
use ytbrief::{ListenerContext, output};

fn setup_logging(verbose: bool, to_file: bool) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
    builder.parse_default_env();

    if to_file {
        let log_dir = log_dir();
        std::fs::create_dir_all(&log_dir)?;
        let log_file = log_dir.join("ytbrief.log");
        let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);
        builder.target(env_logger::Target::Pipe(target));
        builder.init();
        info!("Logging initialized: {}", log_file.display());
    } else {
        builder.init();
    }
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytbrief")
        .join("logs")
}

fn load_config(path: Option<&PathBuf>) -> Config {
    let result = match path {
        Some(p) => Config::load_from(p),
        None => Config::load(),
    };
    result.unwrap_or_else(|e| {
        warn!("Ignoring invalid config: {e}");
        Config::default()
    })
}

fn video_id_or_bail(input: &str) -> Result<String> {
    match ytbrief::extract_video_id(input) {
        Some(id) => Ok(id),
        None => bail!(
            "could not extract video ID from: {input}\n\nSupported formats:\n  https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  https://www.youtube.com/embed/ID\n  https://www.youtube.com/shorts/ID\n  <11-character video ID>"
        ),
    }
}

fn print_trail(trail: &[Attempt]) {
    for attempt in trail {
        eprintln!(
            "{}: {:?} {}",
            attempt.strategy,
            attempt.outcome,
            attempt.message.as_deref().unwrap_or("")
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = <Cli as clap::Parser>::parse();

    let serving = matches!(cli.command, Command::Serve { .. });
    setup_logging(cli.verbose, !serving)?;

    let mut config = load_config(cli.config.as_ref());
    debug!("Config: {config:?}");

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind().to_string());
            let analyzer = Analyzer::from_config(&config)?;
            info!("Caption strategies: {}", analyzer.strategy_names().join(" -> "));
            ytbrief::server::serve(Arc::new(analyzer), &bind).await?;
        }

        Command::Transcript { url, format } => {
            let video_id = video_id_or_bail(&url)?;
            let analyzer = Analyzer::from_config(&config)?;
            let report = analyzer.transcript(&video_id).await;

            if cli.verbose {
                print_trail(&report.trail);
            }

            match format {
                OutputFormat::Json => println!("{}", output::render_transcript_json(&report)),
                OutputFormat::Text => {
                    if report.transcript.is_none() {
                        bail!("{}", ytbrief::pipeline::NO_CAPTIONS_MESSAGE);
                    }
                    println!("{}", output::render_transcript_text(&report));
                }
            }
        }

        Command::Analyze {
            url,
            role,
            tools,
            challenge,
            model,
            format,
        } => {
            let video_id = video_id_or_bail(&url)?;
            if model.is_some() {
                config.model = model;
            }
            let analyzer = Analyzer::from_config(&config)?;
            let context = ListenerContext {
                role,
                tools,
                current_challenge: challenge,
            };

            let value = match analyzer.analyze(&video_id, &context).await {
                Ok(value) => value,
                Err(AnalyzeError::NoCaptions { trail }) => {
                    print_trail(&trail);
                    bail!("{}", ytbrief::pipeline::NO_CAPTIONS_MESSAGE);
                }
                Err(e) => bail!("{e}"),
            };

            let rendered = match format {
                OutputFormat::Text => output::render_analysis_text(&value),
                OutputFormat::Json => output::render_analysis_json(&value),
            };
            println!("{rendered}");
        }
    }

    Ok(())
}
