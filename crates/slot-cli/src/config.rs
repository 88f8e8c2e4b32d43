use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use slot_engine::EngineConfig;

/// Default settings file, read from the working directory if present.
pub const DEFAULT_CONFIG_FILE: &str = "slots.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Layer defaults, the TOML file at `path` (optional) and `SLOTS_*`
    /// environment variables, in increasing precedence.
    ///
    /// Nested keys use a double underscore: `SLOTS_ENGINE__CALENDAR_FAILURE=fail_closed`.
    ///
    /// ## Errors
    /// Returns an error if the file is malformed or a value has the wrong type.
    pub fn load(path: &str) -> Result<Self> {
        Ok(Config::builder()
            .set_default("logging.level", "warn")?
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("SLOTS")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// Read `.env` into the process environment, then load [`Settings`].
pub fn load_config(path: &str) -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load(path)
}
