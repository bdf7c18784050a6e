//! Collocates command: rank the collocates of a node query.

use std::cmp::Ordering;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use collocate_core::{
    CollocateEnumerator, CollocateRecord, CollocationSettings, IndexStorage, LemmaDictionary,
    Measure, MemoryCorpus, WindowKind,
};

use super::read_input_file;

/// Arguments for the `collocates` subcommand.
#[derive(Args, Debug)]
pub struct CollocatesArgs {
    /// Tokenized corpus files, one document per file.
    #[arg(required = true)]
    pub files: Vec<Utf8PathBuf>,

    /// Node query: terms, "quoted phrases", `*` and `?` wildcards.
    #[arg(long)]
    pub query: String,

    /// Windowing mode.
    #[arg(long, value_enum)]
    pub mode: Option<WindowKind>,

    /// Context terms left of the node (surface mode).
    #[arg(long, value_name = "N")]
    pub left: Option<usize>,

    /// Context terms right of the node (surface mode).
    #[arg(long, value_name = "N")]
    pub right: Option<usize>,

    /// Clip surface windows at sentence boundaries.
    #[arg(long)]
    pub within_sentence: bool,

    /// Minimum value for a measure; without a value its default cutoff applies.
    #[arg(long = "min", value_name = "MEASURE[=VALUE]", value_parser = parse_threshold)]
    pub thresholds: Vec<(Measure, Option<f64>)>,

    /// Sort descending by this measure.
    #[arg(long, value_name = "MEASURE", value_parser = parse_measure)]
    pub sort: Option<Measure>,

    /// Print at most N records.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Keep part-of-speech tags on terms.
    #[arg(long)]
    pub pos: bool,

    /// Lowercase terms and ignore case in the query.
    #[arg(long)]
    pub lowercase: bool,

    /// Where the positional index keeps its batches.
    #[arg(long, value_enum)]
    pub storage: Option<IndexStorage>,
}

impl CollocatesArgs {
    /// Configured settings with command-line overrides applied.
    fn apply(&self, settings: &CollocationSettings) -> CollocationSettings {
        let mut settings = settings.clone();
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(left) = self.left {
            settings.left_span_size = left;
        }
        if let Some(right) = self.right {
            settings.right_span_size = right;
        }
        if let Some(storage) = self.storage {
            settings.index_storage = storage;
        }
        settings.within_sentence |= self.within_sentence;
        settings.show_part_of_speech |= self.pos;
        settings.lowercase |= self.lowercase;
        for (measure, value) in &self.thresholds {
            match value {
                Some(value) => {
                    settings.thresholds.set(*measure, *value);
                }
                None => settings.default_thresholds.push(*measure),
            }
        }
        settings
    }
}

fn parse_measure(s: &str) -> Result<Measure, String> {
    s.parse::<Measure>().map_err(|e| e.to_string())
}

fn parse_threshold(s: &str) -> Result<(Measure, Option<f64>), String> {
    match s.split_once('=') {
        Some((name, value)) => {
            let value = value
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid threshold value {value:?}: {e}"))?;
            Ok((parse_measure(name.trim())?, Some(value)))
        }
        None => Ok((parse_measure(s.trim())?, None)),
    }
}

#[derive(Serialize)]
struct CollocatesReport<'a> {
    query: &'a str,
    mode: WindowKind,
    documents: usize,
    records: &'a [CollocateRecord],
}

/// Load the corpus files, run the query and print the records.
#[instrument(name = "cmd_collocates", skip_all, fields(query = %args.query, files = args.files.len()))]
pub fn cmd_collocates(
    args: CollocatesArgs,
    global_json: bool,
    quiet: bool,
    settings: &CollocationSettings,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    let settings = args.apply(settings);
    debug!(mode = %settings.mode, thresholds = ?settings.thresholds, "executing collocates command");

    let progress = if global_json || quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(args.files.len() as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("{spinner} loading corpus {pos}/{len} {msg}")
            .context("invalid progress template")?,
    );

    let mut corpus = MemoryCorpus::new()
        .with_lowercase(settings.lowercase)
        .with_tagger_separator(settings.pos_tagger_separator.clone());
    for file in &args.files {
        progress.set_message(file.to_string());
        let content = read_input_file(file, max_input)?;
        corpus.add_document(file.as_str(), content);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let lemmas = settings.lemma_list();
    let options = settings.options(lemmas.as_ref().map(|l| l as &dyn LemmaDictionary));
    let enumerator = CollocateEnumerator::new(&corpus, &args.query, options)
        .with_context(|| format!("failed to run query {:?}", args.query))?;
    let mut records = enumerator
        .collect::<Result<Vec<_>, _>>()
        .context("failed to enumerate collocates")?;

    if let Some(measure) = args.sort {
        records.sort_by(|a, b| descending(measure.value(a), measure.value(b)));
    }
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    if global_json {
        let report = CollocatesReport {
            query: &args.query,
            mode: settings.mode,
            documents: corpus.len(),
            records: &records,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&records);
    }
    Ok(())
}

/// Larger values first; NaN last.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

const COLUMNS: [Measure; 6] = [
    Measure::Mi,
    Measure::Mi3,
    Measure::TScore,
    Measure::Dice,
    Measure::SimpleLl,
    Measure::LogLikelihood,
];

fn print_table(records: &[CollocateRecord]) {
    if records.is_empty() {
        println!("{}", "no collocates".yellow());
        return;
    }
    let width = records
        .iter()
        .map(|r| r.word.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut header = format!("{:<width$} {:>6} {:>6} {:>6}", "word", "O", "left", "right");
    for measure in COLUMNS {
        header.push_str(&format!(" {:>10}", measure.name()));
    }
    println!("{}", header.bold());

    for record in records {
        let mut line = format!(
            "{:<width$} {:>6} {:>6} {:>6}",
            record.word, record.signature.o, record.left_freq, record.right_freq
        );
        for measure in COLUMNS {
            line.push_str(&format!(" {:>10}", format_measure(measure.value(record))));
        }
        println!("{line}");
    }
}

fn format_measure(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{value:.3}")
    }
}
