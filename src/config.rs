// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::stats::Extractor;

/// Optional override file looked up in the working directory.
pub const CONFIG_FILE: &str = "ncpr_summary.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory whose direct entries are scanned (non-recursive).
    pub input_dir: PathBuf,
    /// Where the summary workbook lands; created on demand.
    pub output_dir: PathBuf,
    pub output_file_name: String,
    pub extractor: Extractor,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_dir: PathBuf::from("paste_zip_folders_here"),
            output_dir: PathBuf::from("Summary_Output"),
            output_file_name: "NCPR_Fail_Summary.xlsx".into(),
            extractor: Extractor::default(),
        }
    }
}

impl Config {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file_name)
    }

    /// Parse a YAML config file; missing keys fall back to defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config file {:?}", path))
    }

    /// Use `path` when it exists, otherwise the built-in defaults.
    /// A broken file is reported and ignored rather than aborting the run.
    pub fn load(path: &Path) -> Self {
        if !path.is_file() {
            return Config::default();
        }
        match Config::from_yaml_file(path) {
            Ok(cfg) => {
                info!(path = %path.display(), "loaded config overrides");
                cfg
            }
            Err(e) => {
                warn!(path = %path.display(), error = ?e, "ignoring unreadable config, using defaults");
                Config::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_point_at_fixed_locations() {
        let cfg = Config::default();
        assert_eq!(
            cfg.output_path(),
            PathBuf::from("Summary_Output").join("NCPR_Fail_Summary.xlsx")
        );
        assert_eq!(cfg.extractor.required_columns(), ["Status", "Cause", "SenderId"]);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        let mut f = fs::File::create(&path)?;
        writeln!(f, "input_dir: /data/reports")?;
        writeln!(f, "extractor:")?;
        writeln!(f, "  subtype_cause: DND FAIL")?;
        drop(f);

        let cfg = Config::load(&path);
        assert_eq!(cfg.input_dir, PathBuf::from("/data/reports"));
        assert_eq!(cfg.output_file_name, "NCPR_Fail_Summary.xlsx");
        assert_eq!(cfg.extractor.subtype_cause, "DND FAIL");
        assert_eq!(cfg.extractor.status_column, "Status");
        Ok(())
    }

    #[test]
    fn missing_or_broken_file_falls_back() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(Config::load(&dir.path().join("nope.yaml")), Config::default());

        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "input_dir: [unterminated")?;
        assert!(Config::from_yaml_file(&path).is_err());
        assert_eq!(Config::load(&path), Config::default());
        Ok(())
    }
}
