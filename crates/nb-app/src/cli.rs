use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// nestbank: nested-document utilities and Mel-filterbank features.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file. Default: config/default.toml.
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

/// Documents are JSON or TOML, chosen by file extension.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute Mel-filterbank features of an audio file, written as JSON.
    Fbank {
        /// Audio file (WAV, FLAC, MP3, OGG, AAC).
        audio: PathBuf,
        /// Natural log of the energies.
        #[arg(long, default_value_t = false)]
        log: bool,
        /// Override the number of filters.
        #[arg(long)]
        filters: Option<usize>,
        /// Use the normalized filterbank instead of the triangular one.
        #[arg(long, default_value_t = false)]
        normalized: bool,
        /// Output file. Default: stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Flatten a nested document into separator-joined keys.
    Flatten {
        file: PathBuf,
        /// Key separator. Default: from config.
        #[arg(long)]
        sep: Option<String>,
    },

    /// Rebuild a nested document from separator-joined keys.
    Deflatten {
        file: PathBuf,
        #[arg(long)]
        sep: Option<String>,
        /// Split each key at most this many times.
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Merge documents; later files take precedence.
    Merge {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
        /// Fail instead of overwriting differing values.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Print the value at a path.
    Get {
        file: PathBuf,
        /// Separator-joined path, e.g. `a.b.0`.
        path: String,
        /// Stop at a scalar reached before the end of the path.
        #[arg(long, default_value_t = false)]
        partial: bool,
        /// JSON value printed when the path is missing.
        #[arg(long)]
        default: Option<String>,
    },

    /// Assign a JSON value at an existing parent path and print the document.
    Set {
        file: PathBuf,
        path: String,
        /// JSON literal.
        value: String,
    },

    /// Recursively apply an update document, appending to lists.
    Update { file: PathBuf, update: PathBuf },

    /// Collapse containers whose leaves are all equal.
    Squeeze { file: PathBuf },

    /// List the paths of every leaf.
    Leaves { file: PathBuf },

    /// Report whether any / all leaves are truthy.
    Truthy { file: PathBuf },
}

impl Cli {
    /// Separator from the command line, or `fallback`.
    #[must_use]
    pub fn separator<'a>(explicit: Option<&'a str>, fallback: &'a str) -> &'a str {
        explicit.filter(|s| !s.is_empty()).unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nestbank", "merge", "a.json", "b.toml", "--strict", "--log-level", "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
        match cli.command {
            Command::Merge { files, strict } => {
                assert_eq!(files.len(), 2);
                assert!(strict);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn merge_needs_a_file() {
        assert!(Cli::try_parse_from(["nestbank", "merge"]).is_err());
    }

    #[test]
    fn empty_separator_falls_back() {
        assert_eq!(Cli::separator(Some(""), "."), ".");
        assert_eq!(Cli::separator(Some("/"), "."), "/");
        assert_eq!(Cli::separator(None, "_"), "_");
    }
}
