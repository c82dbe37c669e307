// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parcel fuzz replay CLI
//!
//! Runs corpus files or crash reproducers through the probe table outside of
//! libFuzzer, with the fuzz log on, and inspects the table itself.
//!
//! # Usage
//!
//! ```bash
//! # Replay a crash with the fuzz log on stderr
//! parcelfuzz-replay run --log stderr crash-1f2e3d
//!
//! # Replay a whole corpus directory
//! parcelfuzz-replay run corpus/fuzz_parcel_reads
//!
//! # Replay an inline input
//! parcelfuzz-replay run --hex 05000d00
//!
//! # Which probe does selector 0x2f pick?
//! parcelfuzz-replay select 47
//!
//! # Configuration files
//! parcelfuzz-replay gen-config -o parcelfuzz.toml
//! parcelfuzz-replay validate -c parcelfuzz.toml
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use parcelfuzz::{select, Harness, HarnessConfig, LogTarget};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "parcelfuzz-replay")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Replay parcel fuzz inputs and inspect the probe table")]
struct Cli {
    /// Log level for tool diagnostics (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run inputs through the harness
    Run {
        /// Configuration file (defaults come from PARCELFUZZ_* variables)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fuzz log target: off, stderr, facade or a file path
        #[arg(long)]
        log: Option<String>,

        /// Inline input as hex (can repeat)
        #[arg(long)]
        hex: Vec<String>,

        /// Input files, or directories whose files are all replayed
        paths: Vec<PathBuf>,
    },

    /// List the probe table
    List,

    /// Show which probe a selector byte picks
    Select {
        /// Selector byte (0-255)
        selector: u8,
    },

    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "parcelfuzz.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Run {
            config,
            log,
            hex,
            paths,
        } => cmd_run(config.as_deref(), log.as_deref(), &hex, &paths),
        Commands::List => {
            cmd_list();
            Ok(())
        }
        Commands::Select { selector } => {
            cmd_select(selector);
            Ok(())
        }
        Commands::GenConfig { output } => cmd_gen_config(&output),
        Commands::Validate { config } => cmd_validate(&config),
    }
}

/// One replayable input.
struct Input {
    label: String,
    data: Vec<u8>,
}

fn load_config(path: Option<&Path>, log: Option<&str>) -> Result<HarnessConfig> {
    let mut config = match path {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => HarnessConfig::from_env().context("Invalid PARCELFUZZ_* environment")?,
    };
    if let Some(log) = log {
        config.log = LogTarget::parse(log).context("Invalid --log target")?;
    }
    Ok(config)
}

fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned.strip_prefix("0x").unwrap_or(&cleaned);
    hex::decode(cleaned).with_context(|| format!("Invalid hex input {:?}", text))
}

/// Files named on the command line, plus the files directly inside any
/// named directory, sorted by name.
fn collect_inputs(hex_inputs: &[String], paths: &[PathBuf]) -> Result<Vec<Input>> {
    let mut inputs = Vec::new();

    for (i, text) in hex_inputs.iter().enumerate() {
        inputs.push(Input {
            label: format!("hex#{}", i),
            data: parse_hex(text)?,
        });
    }

    for path in paths {
        if path.is_dir() {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(path)
                .with_context(|| format!("Failed to list {}", path.display()))?
            {
                let entry = entry.with_context(|| format!("Failed to list {}", path.display()))?;
                if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    files.push(entry.path());
                }
            }
            files.sort();
            for file in files {
                inputs.push(read_input(&file)?);
            }
        } else {
            inputs.push(read_input(path)?);
        }
    }

    Ok(inputs)
}

fn read_input(path: &Path) -> Result<Input> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read input {}", path.display()))?;
    Ok(Input {
        label: path.display().to_string(),
        data,
    })
}

fn cmd_run(
    config_path: Option<&Path>,
    log: Option<&str>,
    hex_inputs: &[String],
    paths: &[PathBuf],
) -> Result<()> {
    let config = load_config(config_path, log)?;
    let inputs = collect_inputs(hex_inputs, paths)?;
    if inputs.is_empty() {
        bail!("No inputs given (pass files, directories or --hex)");
    }

    config
        .install_logging()
        .context("Failed to open fuzz log output")?;
    let harness = Harness::from_config(&config);

    tracing::info!(
        inputs = inputs.len(),
        max_input_len = harness.max_input_len(),
        log = ?config.log,
        "Replaying"
    );

    let mut ran = 0usize;
    let mut operations = 0usize;
    for input in &inputs {
        match harness.run(&input.data) {
            Some(summary) => {
                ran += 1;
                operations += summary.operations;
                println!(
                    "{}: {} bytes, payload {} bytes, {} operations",
                    input.label,
                    input.data.len(),
                    summary.payload_len,
                    summary.operations
                );
            }
            None => println!("{}: {} bytes, skipped", input.label, input.data.len()),
        }
    }

    parcelfuzz::logging::flush_logger().context("Failed to flush fuzz log")?;
    println!();
    println!(
        "Replayed {}/{} inputs, {} operations",
        ran,
        inputs.len(),
        operations
    );
    Ok(())
}

fn cmd_list() {
    let harness = Harness::new();
    println!("{:>3}  {:<34} {:<22} mode", "idx", "probe", "type");
    for (idx, read) in harness.reads().iter().enumerate() {
        println!(
            "{:>3}  {:<34} {:<22} {}",
            idx, read.name, read.result_type, read.mode
        );
    }
}

fn cmd_select(selector: u8) {
    let harness = Harness::new();
    let reads = harness.reads();
    match select(reads.len(), selector) {
        Some(idx) => println!(
            "selector {} (0x{:02x}) -> [{}] {} ({})",
            selector, selector, idx, reads[idx].name, reads[idx].mode
        ),
        None => println!("selector {}: probe table is empty", selector),
    }
}

fn cmd_gen_config(output: &Path) -> Result<()> {
    let config = HarnessConfig {
        log: LogTarget::Stderr,
        ..HarnessConfig::default()
    };
    let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config")?;

    let content = format!(
        r#"# Parcel fuzz harness configuration
# Generated by parcelfuzz-replay gen-config
#
# log: "off", "stderr", "facade", or {{ file = "path" }}

{}
"#,
        toml_str
    );

    std::fs::write(output, content)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    match HarnessConfig::from_file(config_path) {
        Ok(config) => {
            println!("Configuration valid!");
            println!();
            println!("max_input_len: {}", config.max_input_len);
            println!("log:           {:?}", config.log);
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}
