mod commands;
mod report;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use yamlbind::EncodeOptions;

/// Convert and reformat YAML documents
#[derive(Parser, Debug)]
#[command(name = "yamlbind")]
#[command(version, about = "Convert and reformat YAML documents", long_about = None)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert the first YAML document to JSON
    ToJson {
        /// Input file, or `-` for stdin
        input: Option<PathBuf>,

        /// Reject duplicate mapping keys
        #[arg(long)]
        strict: bool,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Convert JSON to YAML
    ToYaml {
        input: Option<PathBuf>,

        #[command(flatten)]
        style: Style,
    },

    /// Reformat every document of a YAML stream
    Fmt {
        input: Option<PathBuf>,

        /// Reject duplicate mapping keys
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        style: Style,
    },
}

#[derive(Args, Debug)]
struct Style {
    /// Spaces per indentation level
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Write collections in flow style
    #[arg(long)]
    flow: bool,

    /// Indent sequence items under their key
    #[arg(long)]
    indent_sequence: bool,

    /// Write multi-line strings as literal blocks
    #[arg(long)]
    literal: bool,
}

impl Style {
    fn options(&self) -> EncodeOptions {
        EncodeOptions::new()
            .indent(self.indent)
            .flow(self.flow)
            .indent_sequence(self.indent_sequence)
            .literal_style_if_multiline(self.literal)
    }
}

struct Input {
    name: String,
    text: String,
}

fn read_input(path: Option<&PathBuf>) -> Result<Input> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;
            Ok(Input {
                name: path.display().to_string(),
                text,
            })
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read standard input")?;
            Ok(Input {
                name: "<stdin>".to_string(),
                text,
            })
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,yamlbind=debug,yamlbind_node=debug",
        _ => "warn,yamlbind=trace,yamlbind_node=trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut source = None;
    if let Err(err) = run(cli.command, &mut source) {
        match (err.downcast_ref::<yamlbind::Error>(), &source) {
            (Some(yaml_err), Some(input)) => {
                let colored = std::io::stderr().is_terminal();
                let text = report::format_error(yaml_err, &input.text, &input.name, colored);
                eprintln!("{}", text.trim_end());
            }
            _ => eprintln!("Error: {:#}", err),
        }
        process::exit(1);
    }
}

/// Runs one command. `source` keeps the input for error rendering.
fn run(command: Command, source: &mut Option<Input>) -> Result<()> {
    let output = match command {
        Command::ToJson {
            input,
            strict,
            pretty,
        } => {
            let input = source.insert(read_input(input.as_ref())?);
            commands::to_json(&input.text, strict, pretty)?
        }
        Command::ToYaml { input, style } => {
            let input = source.insert(read_input(input.as_ref())?);
            commands::to_yaml(&input.text, style.options())?
        }
        Command::Fmt {
            input,
            strict,
            style,
        } => {
            let input = source.insert(read_input(input.as_ref())?);
            commands::fmt(&input.text, strict, style.options())?
        }
    };
    print!("{}", output);
    Ok(())
}
