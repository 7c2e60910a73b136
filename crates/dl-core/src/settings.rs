use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::PeriodSelector;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Deposit and lending figures of commercial banks, aggregated per period
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dl-dashboard",
    about = "Deposit and lending figures of commercial banks, aggregated per period",
    version
)]
pub struct Settings {
    /// CSV file or directory of CSV files with per-bank rows
    #[arg(long, env = "DL_DATA")]
    pub data: Option<PathBuf>,

    /// Page to render
    #[arg(long, default_value = "home", value_parser = ["home", "search", "weekly", "monthly", "bankwise", "cd-ratio"])]
    pub page: String,

    /// Search query (case-insensitive substring)
    #[arg(long)]
    pub query: Option<String>,

    /// Number of most recent weeks shown in the weekly growth series
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..))]
    pub weeks: u32,

    /// Fiscal year to include (repeatable)
    #[arg(long = "fiscal-year")]
    pub fiscal_years: Vec<String>,

    /// Bank to include in bank-wise charts (repeatable)
    #[arg(long = "bank")]
    pub banks: Vec<String>,

    /// Range start, e.g. "2081 Baisakh" or "2081 Baisakh 1st Week"
    #[arg(long)]
    pub from: Option<PeriodSelector>,

    /// Range end, e.g. "2081 Asar" or "2081 Asar End"
    #[arg(long)]
    pub to: Option<PeriodSelector>,

    /// Which tab of the CD ratio page to render
    #[arg(long, default_value = "monthly", value_parser = ["monthly", "weekly"])]
    pub cd_view: String,

    /// Predecessor used for percent growth when filtering by fiscal year
    #[arg(long, default_value = "unfiltered", value_parser = ["unfiltered", "within-selection"])]
    pub baseline: String,

    /// Fail when one period key mixes month-end and weekly rows
    #[arg(long)]
    pub strict_grouping: bool,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.bank-dl/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weeks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cd_view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".bank-dl").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring unreadable {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Atomically write params to the default path, creating parent directories
    /// if needed.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the default config file if it exists.
    pub fn clear() -> Result<(), std::io::Error> {
        Self::clear_at(&Self::config_path())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("could not clear {}: {}", config_path.display(), e);
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. Query, selections, ranges and the percent-growth
        // baseline are per-invocation and never persisted.
        if settings.data.is_none() {
            settings.data = last.data;
        }
        if !is_arg_explicitly_set(&matches, "page") {
            if let Some(v) = last.page {
                settings.page = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "weeks") {
            if let Some(v) = last.weeks {
                settings.weeks = v;
            }
        }
        // NOTE: clap stores the arg id using the *field name* (underscores).
        if !is_arg_explicitly_set(&matches, "cd_view") {
            if let Some(v) = last.cd_view {
                settings.cd_view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("could not persist settings: {}", e);
        }

        settings
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
            data: s.data.clone(),
            page: Some(s.page.clone()),
            weeks: Some(s.weeks),
            cd_view: Some(s.cd_view.clone()),
            format: Some(s.format.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    // ── LastUsedParams ───────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            data: Some(PathBuf::from("/srv/dl/Schema.csv")),
            page: Some("weekly".to_string()),
            weeks: Some(8),
            cd_view: Some("weekly".to_string()),
            format: Some("json".to_string()),
        };

        params.save_to(&path).expect("save");
        let loaded = LastUsedParams::load_from(&path);

        assert_eq!(loaded.data, Some(PathBuf::from("/srv/dl/Schema.csv")));
        assert_eq!(loaded.page, Some("weekly".to_string()));
        assert_eq!(loaded.weeks, Some(8));
        assert_eq!(loaded.cd_view, Some("weekly".to_string()));
        assert_eq!(loaded.format, Some("json".to_string()));
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);

        let params = LastUsedParams {
            page: Some("monthly".to_string()),
            ..Default::default()
        };
        params.save_to(&path).expect("save");
        assert!(path.exists(), "file must exist after save");

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists(), "file must be gone after clear");
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert!(loaded.data.is_none());
        assert!(loaded.page.is_none());
        assert!(loaded.weeks.is_none());
        assert!(loaded.format.is_none());
    }

    #[test]
    fn test_last_used_params_default_when_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let loaded = LastUsedParams::load_from(&path);
        assert!(loaded.page.is_none());
    }

    // ── Settings parsing ─────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["dl-dashboard"]);

        assert_eq!(settings.page, "home");
        assert!(settings.query.is_none());
        assert_eq!(settings.weeks, 5);
        assert!(settings.fiscal_years.is_empty());
        assert!(settings.banks.is_empty());
        assert!(settings.from.is_none());
        assert!(settings.to.is_none());
        assert_eq!(settings.cd_view, "monthly");
        assert_eq!(settings.baseline, "unfiltered");
        assert!(!settings.strict_grouping);
        assert_eq!(settings.format, "table");
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_repeatable_selections() {
        let settings = Settings::parse_from([
            "dl-dashboard",
            "--fiscal-year",
            "2080/81",
            "--fiscal-year",
            "2081/82",
            "--bank",
            "Nabil Bank Ltd",
        ]);
        assert_eq!(settings.fiscal_years, vec!["2080/81", "2081/82"]);
        assert_eq!(settings.banks, vec!["Nabil Bank Ltd"]);
    }

    #[test]
    fn test_settings_cli_period_selectors() {
        let settings = Settings::parse_from([
            "dl-dashboard",
            "--from",
            "2081 Baisakh",
            "--to",
            "2081 Asar End",
        ]);
        assert_eq!(settings.from, Some(PeriodSelector::new(2081, "Baisakh", None)));
        assert_eq!(
            settings.to,
            Some(PeriodSelector::new(2081, "Asar", Some("End".to_string())))
        );
    }

    #[test]
    fn test_settings_cli_rejects_bad_selector() {
        let result = Settings::try_parse_from(["dl-dashboard", "--from", "Baisakh"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_cli_rejects_zero_weeks() {
        let result = Settings::try_parse_from(["dl-dashboard", "--weeks", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_cli_rejects_unknown_page() {
        let result = Settings::try_parse_from(["dl-dashboard", "--page", "charts"]);
        assert!(result.is_err());
    }

    // ── load_with_last_used ──────────────────────────────────────────────────

    #[test]
    fn test_load_with_last_used_merges_persisted_page() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let params = LastUsedParams {
            page: Some("cd-ratio".to_string()),
            weeks: Some(12),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["dl-dashboard".into()], &config_path);
        assert_eq!(settings.page, "cd-ratio");
        assert_eq!(settings.weeks, 12);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let params = LastUsedParams {
            page: Some("cd-ratio".to_string()),
            format: Some("json".to_string()),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec![
                "dl-dashboard".into(),
                "--page".into(),
                "weekly".into(),
                "--format".into(),
                "table".into(),
            ],
            &config_path,
        );
        assert_eq!(settings.page, "weekly");
        assert_eq!(settings.format, "table");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let params = LastUsedParams {
            page: Some("search".to_string()),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["dl-dashboard".into(), "--clear".into()],
            &config_path,
        );

        assert!(!config_path.exists(), "file must be gone after --clear");
        assert_eq!(settings.page, "home");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            vec!["dl-dashboard".into(), "--debug".into()],
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_does_not_persist_query() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec![
                "dl-dashboard".into(),
                "--page".into(),
                "search".into(),
                "--query".into(),
                "Baisakh".into(),
            ],
            &config_path,
        );

        let settings =
            Settings::load_with_last_used_impl(vec!["dl-dashboard".into()], &config_path);
        assert_eq!(settings.page, "search");
        assert!(settings.query.is_none());
    }

    #[test]
    fn test_load_with_last_used_does_not_persist_baseline() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let first = Settings::load_with_last_used_impl(
            vec![
                "dl-dashboard".into(),
                "--baseline".into(),
                "within-selection".into(),
            ],
            &config_path,
        );
        assert_eq!(first.baseline, "within-selection");

        let second = Settings::load_with_last_used_impl(
            vec!["dl-dashboard".into(), "--page".into(), "monthly".into()],
            &config_path,
        );
        assert_eq!(second.baseline, "unfiltered");

        let saved = std::fs::read_to_string(&config_path).expect("read config");
        assert!(!saved.contains("baseline"), "baseline must not be saved: {saved}");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec![
                "dl-dashboard".into(),
                "--data".into(),
                "/srv/dl".into(),
                "--weeks".into(),
                "9".into(),
            ],
            &config_path,
        );

        assert!(config_path.exists(), "config file must be persisted after run");
        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.data, Some(PathBuf::from("/srv/dl")));
        assert_eq!(loaded.weeks, Some(9));
    }
}
