use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConsolidateError, Result};

/// Directory under the home directory holding logs and saved parameters.
pub const APP_DIR: &str = ".txn-consolidate";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Consolidate year/month/day transaction files into one enriched CSV
#[derive(Parser, Debug, Clone)]
#[command(
    name = "txn-consolidate",
    about = "Consolidate year/month/day transaction files into one enriched CSV",
    version
)]
pub struct Settings {
    /// Year folder containing <month>/<day>/<file> transaction files
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Exchange-rate file (6 banner rows, then a header with CODE and RATE)
    #[arg(long)]
    pub rates: Option<PathBuf>,

    /// Output CSV file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// JSON object of country → continent entries added to the built-in table
    #[arg(long)]
    pub continents: Option<PathBuf>,

    /// Abort on the first file that cannot be read instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Continue without conversion when the exchange-rate file is unreadable
    #[arg(long)]
    pub lenient_rates: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved paths
    #[arg(long)]
    pub clear: bool,
}

/// The three validated paths one run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub root: PathBuf,
    pub rates: PathBuf,
    pub output: PathBuf,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Paths from the previous run, saved to `~/.txn-consolidate/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rates: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continents: Option<PathBuf>,
}

impl LastUsedParams {
    /// Default path to the persisted parameters.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR).join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, fill unset paths from the last run and persist
    /// the merged paths for the next one.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("Could not clear {}: {}", config_path.display(), e);
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins.
        if !is_arg_explicitly_set(&matches, "root") {
            settings.root = settings.root.or(last.root);
        }
        if !is_arg_explicitly_set(&matches, "rates") {
            settings.rates = settings.rates.or(last.rates);
        }
        if !is_arg_explicitly_set(&matches, "output") {
            settings.output = settings.output.or(last.output);
        }
        if !is_arg_explicitly_set(&matches, "continents") {
            settings.continents = settings.continents.or(last.continents);
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("Could not save {}: {}", config_path.display(), e);
        }

        settings
    }

    /// The three run paths, or a configuration error naming the missing ones.
    pub fn paths(&self) -> Result<RunPaths> {
        match (&self.root, &self.rates, &self.output) {
            (Some(root), Some(rates), Some(output)) => Ok(RunPaths {
                root: root.clone(),
                rates: rates.clone(),
                output: output.clone(),
            }),
            _ => {
                let missing: Vec<&str> = [
                    ("--root", self.root.is_none()),
                    ("--rates", self.rates.is_none()),
                    ("--output", self.output.is_none()),
                ]
                .into_iter()
                .filter_map(|(flag, absent)| absent.then_some(flag))
                .collect();
                Err(ConsolidateError::Config(format!(
                    "Please select all required files and folders (missing {})",
                    missing.join(", ")
                )))
            }
        }
    }

    /// Log level after `--debug` is taken into account.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            root: s.root.clone(),
            rates: s.rates.clone(),
            output: s.output.clone(),
            continents: s.continents.clone(),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        list.iter().map(|s| s.into()).collect()
    }

    // ── LastUsedParams ────────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            root: Some(PathBuf::from("/data/2024")),
            rates: Some(PathBuf::from("/data/rates.xlsx")),
            output: Some(PathBuf::from("/out/all.csv")),
            continents: None,
        };

        params.save_to(&path).expect("save");
        assert_eq!(LastUsedParams::load_from(&path), params);
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert_eq!(loaded, LastUsedParams::default());
    }

    #[test]
    fn test_last_used_params_default_when_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(LastUsedParams::load_from(&path), LastUsedParams::default());
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&path).expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    // ── CLI parsing ───────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["txn-consolidate"]);
        assert!(settings.root.is_none());
        assert!(settings.rates.is_none());
        assert!(settings.output.is_none());
        assert!(settings.continents.is_none());
        assert!(!settings.strict);
        assert!(!settings.lenient_rates);
        assert!(!settings.json);
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_paths() {
        let settings = Settings::parse_from([
            "txn-consolidate",
            "--root",
            "/data/2024",
            "--rates",
            "/data/rates.xlsx",
            "--output",
            "/out/all.csv",
        ]);
        assert_eq!(
            settings.paths().unwrap(),
            RunPaths {
                root: PathBuf::from("/data/2024"),
                rates: PathBuf::from("/data/rates.xlsx"),
                output: PathBuf::from("/out/all.csv"),
            }
        );
    }

    #[test]
    fn test_paths_reports_missing_flags() {
        let settings = Settings::parse_from(["txn-consolidate", "--root", "/data/2024"]);
        let msg = settings.paths().unwrap_err().to_string();
        assert!(msg.contains("--rates"));
        assert!(msg.contains("--output"));
        assert!(!msg.contains("--root"));
    }

    // ── load_with_last_used ───────────────────────────────────────────────────

    #[test]
    fn test_load_with_last_used_fills_unset_paths() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            root: Some(PathBuf::from("/saved/root")),
            rates: Some(PathBuf::from("/saved/rates.xlsx")),
            output: Some(PathBuf::from("/saved/out.csv")),
            continents: None,
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["txn-consolidate", "--output", "/new/out.csv"]),
            &config_path,
        );

        assert_eq!(settings.root, Some(PathBuf::from("/saved/root")));
        assert_eq!(settings.rates, Some(PathBuf::from("/saved/rates.xlsx")));
        assert_eq!(settings.output, Some(PathBuf::from("/new/out.csv")));
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            args(&["txn-consolidate", "--root", "/data/2023"]),
            &config_path,
        );

        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.root, Some(PathBuf::from("/data/2023")));
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            root: Some(PathBuf::from("/saved/root")),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["txn-consolidate", "--clear"]),
            &config_path,
        );

        assert!(!config_path.exists());
        assert!(settings.root.is_none());
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_with_last_used_impl(
            args(&["txn-consolidate", "--debug"]),
            &tmp_config_path(&tmp),
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_effective_log_level_before_merge() {
        let plain = Settings::parse_from(["txn-consolidate", "--log-level", "WARNING"]);
        assert_eq!(plain.effective_log_level(), "WARNING");

        let debug = Settings::parse_from(["txn-consolidate", "--log-level", "ERROR", "--debug"]);
        assert_eq!(debug.effective_log_level(), "DEBUG");
    }
}
