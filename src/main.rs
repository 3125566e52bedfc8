use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser};
use dbml2mmd::{ConfigError, Converter, ConverterConfig, ParseError, TableFilter, Theme};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Convert DBML schemas to Mermaid ER diagrams.
#[derive(Parser, Debug)]
#[command(
    name = "dbml2mmd",
    version,
    about,
    after_help = "Examples:
  dbml2mmd input.dbml                        Convert file and print to stdout
  dbml2mmd -o output.mmd input.dbml          Convert file and save to output.mmd
  dbml2mmd --html -o output.html input.dbml  Generate HTML with Mermaid viewer
  dbml2mmd --theme dark input.dbml           Use dark theme for diagram
  dbml2mmd --only users,posts input.dbml     Only include specific tables
  cat input.dbml | dbml2mmd                  Read from stdin"
)]
struct Cli {
    /// Input DBML file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Write to file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Mermaid theme: default, dark, neutral, forest
    #[arg(short, long, default_value = "default", env = "DBML2MMD_THEME")]
    theme: String,

    /// Generate HTML output with embedded Mermaid viewer
    #[arg(long)]
    html: bool,

    /// Only include specific tables (comma-separated list)
    #[arg(long, value_name = "TABLES")]
    only: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to read stdin: {0}")]
    Stdin(io::Error),
    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to write stdout: {0}")]
    Stdout(io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let code = if e.use_stderr() { 1 } else { 0 };
            if let Err(print_err) = e.print() {
                eprintln!("Error: {}", print_err);
                process::exit(1);
            }
            process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` turns on debug output.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "dbml2mmd=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_config(cli: &Cli) -> Result<ConverterConfig, ConfigError> {
    let theme: Theme = cli.theme.parse()?;
    let mut config = ConverterConfig::default()
        .with_theme(theme)
        .with_html_output(cli.html);
    if let Some(only) = &cli.only {
        config = config.with_only_tables(only.parse::<TableFilter>()?);
    }
    Ok(config)
}

fn read_input(cli: &Cli) -> Result<Option<String>, CliError> {
    match &cli.input {
        Some(path) => fs::read_to_string(path)
            .map(Some)
            .map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            }),
        None if io::stdin().is_terminal() => Ok(None),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(CliError::Stdin)?;
            Ok(Some(buf))
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = build_config(cli)?;

    let Some(input) = read_input(cli)? else {
        // Nothing piped in and no file given
        Cli::command().print_help().map_err(CliError::Stdout)?;
        return Ok(());
    };

    if cli.verbose {
        let source = cli
            .input
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "STDIN".to_string());
        let filter = config
            .only_tables
            .as_ref()
            .map(|f| f.iter().collect::<Vec<_>>().join(","))
            .unwrap_or_else(|| "No".to_string());
        info!(
            input = %source,
            theme = %config.theme,
            html = config.html_output,
            filter = %filter,
            "converting"
        );
    }

    let mut converter = Converter::new(config);
    let diagram = converter.convert(&input)?;
    let content = match converter.render_html() {
        Some(html) => html,
        None => diagram,
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &content).map_err(|source| CliError::Write {
                path: path.clone(),
                source,
            })?;
            println!("Output written to {}", path.display());
        }
        None => print!("{}", content),
    }

    Ok(())
}
