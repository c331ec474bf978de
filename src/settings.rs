use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub const DEFAULT_INPUT: &str = "data/maududi-tafsir.xml";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
const ENV_PREFIX: &str = "TAFSIR";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line; `None` leaves the lower layer in place.
#[derive(Debug, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Defaults, then `TAFSIR_*` environment variables, then command-line overrides.
    pub fn load(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::load_from(Environment::with_prefix(ENV_PREFIX), overrides)
    }

    fn load_from(env: Environment, overrides: Overrides) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("input", DEFAULT_INPUT)?
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .add_source(env)
            .set_override_option("input", path_value(overrides.input))?
            .set_override_option("output_dir", path_value(overrides.output_dir))?
            .set_override_option("log_file", path_value(overrides.log_file))?
            .build()?
            .try_deserialize()
    }
}

fn path_value(path: Option<PathBuf>) -> Option<String> {
    path.map(|p| p.to_string_lossy().into_owned())
}

// ── Tests ──
