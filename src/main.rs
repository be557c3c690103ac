use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use context_manager::config::{self, ContextSettings};
use context_manager::{AiContextOptions, ContextManager, CursorPosition, FileContextOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Analyze a project and print the context an AI request would receive.
#[derive(Parser, Debug)]
#[command(name = "context-manager", version, about)]
struct Cli {
    /// Project root to analyze
    project: PathBuf,

    /// File to open as the active file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Cursor position in the active file, as ROW:COL (zero-based)
    #[arg(short, long, value_parser = parse_cursor, requires = "file")]
    cursor: Option<CursorPosition>,

    /// Request type: code-completion, code-explanation, bug-fix or documentation
    #[arg(short, long)]
    request_type: Option<String>,

    /// Error message to attach to a bug-fix request
    #[arg(long)]
    error: Option<String>,

    /// Include the editor history in the output
    #[arg(long)]
    history: bool,

    /// Print a short summary instead of the composed context
    #[arg(long)]
    summary: bool,

    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the default settings file and exit
    #[arg(long)]
    init_config: bool,
}

fn parse_cursor(value: &str) -> std::result::Result<CursorPosition, String> {
    let (row, column) = value
        .split_once(':')
        .ok_or_else(|| format!("expected ROW:COL, got '{}'", value))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| format!("invalid row '{}'", row))?;
    let column = column
        .trim()
        .parse()
        .map_err(|_| format!("invalid column '{}'", column))?;
    Ok(CursorPosition::new(row, column))
}

fn load_settings(cli: &Cli) -> Result<ContextSettings> {
    let settings = match &cli.config {
        Some(path) => ContextSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => ContextSettings::load_or_default()?,
    };
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("context_manager=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.init_config {
        let config_path = match &cli.config {
            Some(path) => path.clone(),
            None => config::get_config_path()?,
        };
        ContextSettings::create_default(&config_path)?;
        eprintln!("Created default config file at {:?}", config_path);
        return Ok(());
    }

    let settings = load_settings(&cli)?;
    let manager = Arc::new(ContextManager::with_local_fs(settings));

    manager
        .initialize(&cli.project)
        .await
        .with_context(|| format!("Failed to analyze {}", cli.project.display()))?;

    let project = manager.project().await;
    eprintln!(
        "{} {} ({})",
        "Analyzed".green().bold(),
        cli.project.display(),
        project.language.to_string().blue()
    );

    if let Some(file) = &cli.file {
        let path = if file.is_relative() {
            cli.project.join(file)
        } else {
            file.clone()
        };
        let options = FileContextOptions {
            cursor_position: cli.cursor,
            ..Default::default()
        };
        manager.open_file(&path, options).await?;
        eprintln!("{} {}", "Opened".green().bold(), path.display());
    }

    let output = if cli.summary {
        serde_json::to_string_pretty(&manager.summary().await)?
    } else {
        let mut options = match &cli.request_type {
            Some(tag) => {
                if tag.parse::<context_manager::RequestType>().is_err() {
                    eprintln!(
                        "{}: unknown request type '{}', printing base context",
                        "Warning".yellow().bold(),
                        tag
                    );
                }
                AiContextOptions::for_request(tag)
            }
            None => AiContextOptions::default(),
        };
        if cli.history {
            options = options.with_history();
        }
        if let Some(message) = &cli.error {
            options = options.with_error(message.clone());
        }
        serde_json::to_string_pretty(&manager.ai_context(&options).await)?
    };

    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cursor() {
        assert_eq!(parse_cursor("12:4").unwrap(), CursorPosition::new(12, 4));
        assert_eq!(parse_cursor(" 0 : 0 ").unwrap(), CursorPosition::new(0, 0));
        assert!(parse_cursor("12").is_err());
        assert!(parse_cursor("a:1").is_err());
    }

    #[test]
    fn test_cli_args() {
        let cli = Cli::parse_from([
            "context-manager",
            "proj",
            "--file",
            "src/app.js",
            "--cursor",
            "3:1",
            "--request-type",
            "bug-fix",
            "--history",
        ]);
        assert_eq!(cli.project, PathBuf::from("proj"));
        assert_eq!(cli.cursor, Some(CursorPosition::new(3, 1)));
        assert_eq!(cli.request_type.as_deref(), Some("bug-fix"));
        assert!(cli.history);
        assert!(!cli.summary);
    }
}
