//! Init command implementation
//!
//! Writes a `copyedit.toml` holding every setting at its default value.

use super::output::Output;
use crate::utils::toml_config::CopyeditConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file written by `init`
pub const CONFIG_FILE_NAME: &str = "copyedit.toml";

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// copyedit.toml already exists
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing copyedit");

    let config_path = config.path.join(CONFIG_FILE_NAME);
    if config_path.exists() && !config.force {
        output.warning(&format!("{} already exists!", CONFIG_FILE_NAME));
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if let Err(e) = fs::create_dir_all(&config.path) {
        output.error(&format!("Failed to create {}: {}", config.path.display(), e));
        return InitResult::Error(e.to_string());
    }

    let content = match generate_config_toml() {
        Ok(content) => content,
        Err(e) => {
            output.error(&format!("Failed to render configuration: {}", e));
            return InitResult::Error(e);
        }
    };

    if let Err(e) = write_file(&config_path, &content) {
        output.error(&format!("Failed to write {}: {}", CONFIG_FILE_NAME, e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", &config_path.display().to_string());

    output.hint("Pull the model, then start the server:");
    output.command("ollama pull llama3.2-8b-instruct-128k");
    output.command("copyedit-server");

    InitResult::Success
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, content)
}

fn generate_config_toml() -> Result<String, String> {
    let body = CopyeditConfig::default()
        .to_toml()
        .map_err(|e| e.to_string())?;
    Ok(format!(
        "# copyedit configuration\n\
         #\n\
         # Environment overrides: COPYEDIT_OLLAMA_URL, COPYEDIT_MODEL, COPYEDIT_OUTPUT_DIR\n\n{}",
        body
    ))
}
