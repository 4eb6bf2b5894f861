use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;

/// Well-known location of the engine settings file.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

const DEFAULT_TEMPLATE_PATH: &str = "timesheet_template.xlsx";
const DEFAULT_OUTPUT_FOLDER: &str = "completed_timesheets";

/// Durable engine settings.
///
/// Every field carries a serde default, so a stored file missing a key still
/// deserializes into a fully populated value instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_template_path")]
    pub template_path: String,
    #[serde(default = "default_output_folder")]
    pub output_folder: String,
    #[serde(default = "default_rounding_enabled")]
    pub rounding_enabled: bool,
}

fn default_template_path() -> String {
    DEFAULT_TEMPLATE_PATH.to_string()
}

fn default_output_folder() -> String {
    DEFAULT_OUTPUT_FOLDER.to_string()
}

fn default_rounding_enabled() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template_path: default_template_path(),
            output_folder: default_output_folder(),
            rounding_enabled: default_rounding_enabled(),
        }
    }
}

/// Load the engine config from the well-known location, writing defaults
/// first if no file exists yet.
pub fn load_config() -> anyhow::Result<EngineConfig> {
    load_config_from(Path::new(DEFAULT_CONFIG_PATH))
}

/// Same contract as [`load_config`] against an explicit path.
///
/// Repeated calls with no intervening edits return identical values and do
/// not rewrite the file. Path safety or writability is not validated here;
/// the export engine classifies those failures when it touches the paths.
pub fn load_config_from(path: &Path) -> anyhow::Result<EngineConfig> {
    if !path.exists() {
        write_default_config(path)?;
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;

    Ok(config)
}

fn write_default_config(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory for {}", path.display()))?;
    }

    // create_new keeps the check-then-create race harmless: the loser of the
    // race sees AlreadyExists and reads the identical file the winner wrote.
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => {
            serde_json::to_writer_pretty(file, &EngineConfig::default())
                .with_context(|| format!("failed to write defaults to {}", path.display()))?;
            info!("Created default config at {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("failed to create config at {}", path.display()))
        }
    }
}
