mod commands;
mod logger;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use anyhow::Context;
use clap::{Parser, Subcommand};
use pbi_docs::{ExtractConfig, Language, WriteError};

#[derive(Parser)]
#[command(name = "pbi-docs")]
#[command(about = "Extract and document Power BI template models")]
#[command(version)]
pub struct Cli {
    #[arg(long, short, global = true, help = "Log pipeline steps (debug level)")]
    pub verbose: bool,
    #[arg(long, global = true, value_name = "PATH", help = "JSON extraction config")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Extract one package and write its documentation artifacts")]
    Extract {
        #[arg(help = "Path to a .pbit or .pbix file")]
        input: PathBuf,
        #[arg(long, short, default_value = "output", help = "Output directory")]
        output: PathBuf,
        #[arg(long, default_value = "en", value_parser = parse_language, help = "Document language (en, es)")]
        lang: Language,
    },
    #[command(about = "Extract every package matching a glob pattern")]
    Batch {
        #[arg(help = "Glob pattern, e.g. 'models/**/*.pbit'")]
        pattern: String,
        #[arg(long, short, default_value = "output", help = "Output directory")]
        output: PathBuf,
        #[arg(long, default_value = "en", value_parser = parse_language, help = "Document language (en, es)")]
        lang: Language,
    },
    #[command(about = "Document two packages and compare their measures and relationships")]
    Diff {
        #[arg(help = "Path to the base package")]
        a: PathBuf,
        #[arg(help = "Path to the changed package")]
        b: PathBuf,
        #[arg(long, short, default_value = "output", help = "Output directory")]
        output: PathBuf,
        #[arg(long, default_value = "en", value_parser = parse_language, help = "Document language (en, es)")]
        lang: Language,
    },
    #[command(about = "Format one DAX expression (reads stdin when omitted)")]
    Format {
        #[arg(help = "DAX expression")]
        expr: Option<String>,
    },
}

fn parse_language(value: &str) -> Result<Language, String> {
    value.parse()
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ExtractConfig> {
    let Some(path) = path else {
        return Ok(ExtractConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    ExtractConfig::from_json(&text)
        .with_context(|| format!("Invalid config: {}", path.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Extract {
            input,
            output,
            lang,
        } => commands::extract::run(&config, &input, &output, lang),
        Commands::Batch {
            pattern,
            output,
            lang,
        } => commands::batch::run(&config, &pattern, &output, lang),
        Commands::Diff { a, b, output, lang } => {
            commands::diff::run(&config, &a, &b, &output, lang)
        }
        Commands::Format { expr } => commands::format::run(&config, expr),
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for_error(&e)
        }
    }
}

fn exit_code_for_error(err: &anyhow::Error) -> ExitCode {
    if is_write_error(err) {
        ExitCode::from(3)
    } else {
        ExitCode::from(2)
    }
}

fn is_write_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<WriteError>())
}
