use std::path::Path;

use anyhow::{Context, Result};
use nb_audio::fbank::FbankExtractor;
use nb_core::config::{AppConfig, FeatureConfig, FilterbankKind};
use nb_core::nested::{
    MergeOptions, all_truthy, any_truthy, deflatten, flatten, get_by_path, leaf_paths, merge,
    nested_update, set_by_path, squeeze,
};
use nb_core::{Map, Path as KeyPath, Value};
use ndarray::Array2;

use crate::cli::{Cli, Command};
use crate::io::{parse_json_literal, read_document, read_map, to_json};

/// Execute `command` and return the text to print.
///
/// # Errors
/// Propagates I/O, parse and operation errors with file context.
pub fn run(command: &Command, config: &AppConfig) -> Result<String> {
    let sep = config.nested.separator.as_str();
    match command {
        Command::Fbank {
            audio,
            log,
            filters,
            normalized,
            out,
        } => {
            let json = fbank(audio, *log, *filters, *normalized, config)?;
            if let Some(out) = out {
                std::fs::write(out, &json)
                    .with_context(|| format!("Cannot write {}", out.display()))?;
                log::info!("features written to {}", out.display());
                Ok(String::new())
            } else {
                Ok(json)
            }
        }
        Command::Flatten { file, sep: explicit } => {
            let map = read_map(file)?;
            let flat = flatten(&map, Cli::separator(explicit.as_deref(), sep));
            to_json(&Value::Map(flat))
        }
        Command::Deflatten {
            file,
            sep: explicit,
            max_depth,
        } => {
            let map = read_map(file)?;
            let tree = deflatten(map, Cli::separator(explicit.as_deref(), sep), *max_depth)
                .with_context(|| format!("Cannot deflatten {}", file.display()))?;
            to_json(&Value::Map(tree))
        }
        Command::Merge { files, strict } => {
            let mut documents = files
                .iter()
                .map(|f| read_map(f))
                .collect::<Result<Vec<Map>>>()?;
            let base = if documents.is_empty() {
                Map::new()
            } else {
                documents.remove(0)
            };
            let updates: Vec<&Map> = documents.iter().collect();
            let options = if *strict {
                MergeOptions::strict()
            } else {
                MergeOptions::default()
            };
            let merged = merge(&base, &updates, options).context("Merge failed")?;
            to_json(&Value::Map(merged))
        }
        Command::Get {
            file,
            path,
            partial,
            default,
        } => {
            let tree = read_document(file)?;
            let key_path = KeyPath::parse(path, sep)?;
            match (get_by_path(&tree, &key_path, *partial), default) {
                (Ok(found), _) => to_json(found),
                (Err(_), Some(fallback)) => to_json(&parse_json_literal(fallback)?),
                (Err(e), None) => Err(e).with_context(|| format!("In {}", file.display())),
            }
        }
        Command::Set { file, path, value } => {
            let mut tree = read_document(file)?;
            set_by_path(&mut tree, &KeyPath::parse(path, sep)?, parse_json_literal(value)?)
                .with_context(|| format!("In {}", file.display()))?;
            to_json(&tree)
        }
        Command::Update { file, update } => {
            let mut tree = read_document(file)?;
            nested_update(&mut tree, &read_document(update)?)
                .with_context(|| format!("Cannot apply {}", update.display()))?;
            to_json(&tree)
        }
        Command::Squeeze { file } => to_json(&squeeze(read_document(file)?)),
        Command::Leaves { file } => {
            let tree = read_document(file)?;
            Ok(leaf_paths(&tree)
                .iter()
                .map(|p| p.join(sep))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Command::Truthy { file } => {
            let tree = read_document(file)?;
            let mut report = Map::new();
            report.insert("any".into(), any_truthy(&tree).into());
            report.insert("all".into(), all_truthy(&tree).into());
            to_json(&Value::Map(report))
        }
    }
}

/// Apply the command-line overrides, then clamp like a loaded config.
fn feature_config(config: &AppConfig, filters: Option<usize>, normalized: bool) -> FeatureConfig {
    let mut features = config.features.clone();
    if let Some(n) = filters {
        features.number_of_filters = n;
    }
    if normalized {
        features.filterbank = FilterbankKind::Normalized;
    }
    features.clamp_all();
    if filters.is_some_and(|n| n != features.number_of_filters) {
        log::warn!("--filters clamped to {}", features.number_of_filters);
    }
    features
}

fn fbank(
    audio: &Path,
    log: bool,
    filters: Option<usize>,
    normalized: bool,
    config: &AppConfig,
) -> Result<String> {
    let features = feature_config(config, filters, normalized);
    let mut extractor = FbankExtractor::new(&features).context("Invalid feature configuration")?;
    let matrix = extractor.extract_file(audio, log)?;
    let report = serde_json::json!({
        "file": audio.display().to_string(),
        "sample_rate": extractor.config().sample_rate,
        "log": log,
        "frames": matrix.nrows(),
        "filters": matrix.ncols(),
        "features": rows(&matrix),
    });
    serde_json::to_string_pretty(&report).context("JSON serialization failed")
}

fn rows(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}
