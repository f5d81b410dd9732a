//! `wasmperf.toml` config loading.

use serde::{Deserialize, Serialize};

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Base directory holding per-benchmark trace and report outputs.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Environment whose peak performance normalizes each profile.
    #[serde(default = "default_baseline")]
    pub baseline: String,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_baseline() -> String {
    "native".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            baseline: default_baseline(),
        }
    }
}

impl Config {
    pub fn load_optional(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match toml::from_str::<Config>(&s) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!("failed to parse config {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!("failed to read config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn benchmark_dir(&self, benchmark: &str) -> PathBuf {
        self.out_dir.join(benchmark)
    }
}
