//! Initialize configuration command.

use std::path::Path;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{InitOutput, OutputFormat, Render};

/// Execute the init command.
pub fn init(
    config: &CliConfig,
    config_path: &Path,
    format: OutputFormat,
    force: bool,
) -> CliResult<String> {
    if config_path.exists() && !force {
        return Err(CliError::user(format!(
            "{} already exists. Pass --force to overwrite it.",
            config_path.display()
        )));
    }

    config.save(config_path)?;

    let output = InitOutput {
        config_path: config_path.display().to_string(),
        data_dir: config.base_dir().display().to_string(),
        agent: config.agent().ok().map(|id| id.to_string()),
    };
    Ok(output.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut config = CliConfig::default();
        config.agent.identity = "0xagent".to_string();
        config.storage.base_dir = temp_dir.path().to_path_buf();

        let out = init(&config, &path, OutputFormat::Json, false).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["agent"], "0xagent");
        assert_eq!(CliConfig::load(&path).unwrap().agent.identity, "0xagent");

        assert!(init(&config, &path, OutputFormat::Json, false).is_err());
        assert!(init(&config, &path, OutputFormat::Human, true).is_ok());
    }
}
