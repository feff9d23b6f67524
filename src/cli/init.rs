//! Init command implementation
//!
//! Scaffolds a delve.toml with default settings for the chosen LLM provider.

use super::output::Output;
use crate::utils::toml_config::{DelveConfig, LlmConfig};
use std::fs;
use std::path::Path;

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// delve.toml already exists
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: std::path::PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// LLM provider to configure (ollama or openai)
    pub provider: String,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Delve");

    let base_path = &config.path;

    let config_path = base_path.join("delve.toml");
    if config_path.exists() && !config.force {
        output.warning("delve.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            output.error(&format!("Failed to create {}: {}", base_path.display(), e));
            return InitResult::Error(e.to_string());
        }
        output.created_dir(&base_path.display().to_string());
    }

    output.subheader("Creating configuration files");

    let toml_content = match generate_delve_toml(&config) {
        Ok(content) => content,
        Err(e) => {
            output.error(&e);
            return InitResult::Error(e);
        }
    };
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create delve.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "delve.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    output.complete("Delve initialized successfully!");

    output.header("Next Steps");
    output.newline();
    if config.provider == "openai" {
        output.info("1. Set your API key:");
        output.command("cp .env.example .env");
        output.command("# Edit .env and set OPENAI_API_KEY");
    } else {
        output.info("1. Start Ollama (if not running):");
        output.command("ollama serve");
        output.command("ollama pull llama3.2");
    }
    output.newline();

    output.info("2. Start the server:");
    output.command("delve-server");
    output.newline();

    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_delve_toml(config: &InitConfig) -> Result<String, String> {
    let mut delve = DelveConfig::default();
    delve.server.host = config.host.clone();
    delve.server.port = config.port;

    match config.provider.as_str() {
        "ollama" => {}
        "openai" => {
            delve.llm = LlmConfig::OpenAI {
                api_key_env: Some("OPENAI_API_KEY".to_string()),
                api_base: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
            };
        }
        other => {
            return Err(format!(
                "Unknown provider '{}', expected 'ollama' or 'openai'",
                other
            ));
        }
    }

    let body = delve.to_toml().map_err(|e| e.to_string())?;
    Ok(format!(
        "# Delve configuration\n\
         # Changes to [research] apply to new jobs without a restart,\n\
         # except max_concurrent_jobs, which is read once at startup.\n\n{}",
        body
    ))
}

fn generate_env_example() -> String {
    r#"# Delve environment variables

# Only needed for [llm] type = "openai"
OPENAI_API_KEY=

# Overrides [server].log_level, e.g. "delve=debug,tower_http=info"
RUST_LOG=info
"#
    .to_string()
}
