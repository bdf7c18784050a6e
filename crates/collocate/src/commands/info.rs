//! Info command implementation

use std::collections::BTreeMap;

use clap::Args;
use collocate_core::config::{Config, ConfigSources};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    mode: String,
    left_span_size: usize,
    right_span_size: usize,
    lowercase: bool,
    show_part_of_speech: bool,
    index_storage: String,
    lemmas: usize,
    thresholds: BTreeMap<String, f64>,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &ConfigSources) -> Self {
        let c = &config.collocation;
        let thresholds = c
            .effective_thresholds()
            .iter()
            .map(|(m, v)| (m.name().to_string(), v))
            .collect();
        Self {
            config_file: sources.primary_file().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            mode: c.mode.to_string(),
            left_span_size: c.left_span_size,
            right_span_size: c.right_span_size,
            lowercase: c.lowercase,
            show_part_of_speech: c.show_part_of_speech,
            index_storage: c.index_storage.to_string(),
            lemmas: if c.lemma_enabled { c.lemmas.len() } else { 0 },
            thresholds,
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
}

/// Print package information and the effective collocation settings.
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let full_info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, sources),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
        return Ok(());
    }

    println!(
        "{} {}",
        full_info.package.name.bold(),
        full_info.package.version.green()
    );
    if !full_info.package.description.is_empty() {
        println!("{}", full_info.package.description);
    }
    if !full_info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), full_info.package.license);
    }

    let c = &full_info.config;
    println!();
    println!("{}", "Configuration".bold().underline());
    if let Some(ref path) = c.config_file {
        println!("{}: {}", "Config file".dimmed(), path.cyan());
    } else {
        println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
    }
    println!("{}: {}", "Log level".dimmed(), c.log_level);
    if let Some(ref dir) = c.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }

    println!();
    println!("{}", "Collocation".bold().underline());
    println!("{}: {}", "Mode".dimmed(), c.mode);
    println!(
        "{}: {} left, {} right",
        "Span".dimmed(),
        c.left_span_size,
        c.right_span_size
    );
    println!("{}: {}", "Lowercase".dimmed(), c.lowercase);
    println!("{}: {}", "Part of speech".dimmed(), c.show_part_of_speech);
    println!("{}: {}", "Index storage".dimmed(), c.index_storage);
    println!("{}: {}", "Lemmas".dimmed(), c.lemmas);
    if c.thresholds.is_empty() {
        println!("{}: {}", "Thresholds".dimmed(), "(none)".dimmed());
    } else {
        let list: Vec<String> = c
            .thresholds
            .iter()
            .map(|(m, v)| format!("{m} >= {v}"))
            .collect();
        println!("{}: {}", "Thresholds".dimmed(), list.join(", "));
    }

    Ok(())
}
