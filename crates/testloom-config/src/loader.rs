//! Settings loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::Settings;

/// Settings loader with environment variable substitution.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load settings from a string.
    pub fn load_str(content: &str) -> Result<Settings, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let settings: Settings = toml::from_str(&expanded)?;
        Ok(settings)
    }

    /// Default settings path under the user config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("testloom")
            .join("settings.toml")
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.config`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_settings() {
        let settings = SettingsLoader::load_str("").unwrap();
        assert_eq!(settings.limits.token_warning_threshold, 10_000);
    }

    #[test]
    fn test_load_basic_settings() {
        let content = r#"
            [provider]
            selected = "openai"
            model = "gpt-4o"
        "#;
        let settings = SettingsLoader::load_str(content).unwrap();
        assert_eq!(settings.provider.selected, "openai");
        assert_eq!(settings.provider.model, "gpt-4o");
    }

    #[test]
    fn test_load_full_settings() {
        let content = r#"
            [provider]
            selected = "groq"
            model = "llama-3.3-70b-versatile"

            [provider.keys]
            groq = "gsk-test"

            [output]
            feature = true
            page = true
            language = "ts"
            engine = "playwright"

            [limits]
            test_data_max_rows = 50
        "#;
        let settings = SettingsLoader::load_str(content).unwrap();
        assert_eq!(settings.provider.selected_key(), Some("gsk-test"));
        assert!(settings.output.feature);
        assert_eq!(settings.output.engine, "playwright");
        assert_eq!(settings.limits.test_data_max_rows, 50);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[provider]").unwrap();
        writeln!(file, "selected = \"openai\"").unwrap();

        let settings = SettingsLoader::load(file.path()).unwrap();
        assert_eq!(settings.provider.selected, "openai");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = SettingsLoader::load(Path::new("/nonexistent/path/settings.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = SettingsLoader::load_str("invalid = [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: unique test-only env var, removed before the test returns
        unsafe {
            std::env::set_var("TESTLOOM_TEST_KEY", "sk-expanded");
        }
        let content = "[provider.keys]\nopenai = \"${TESTLOOM_TEST_KEY}\"";
        let settings = SettingsLoader::load_str(content).unwrap();
        assert_eq!(
            settings.provider.keys.get("openai").map(String::as_str),
            Some("sk-expanded")
        );
        unsafe {
            std::env::remove_var("TESTLOOM_TEST_KEY");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "[provider]\nselected = \"${TESTLOOM_UNSET_VAR_98765}\"";
        let result = SettingsLoader::load_str(content);
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_path() {
        let expanded = SettingsLoader::expand_path("~/testloom");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/testloom"));
    }

    #[test]
    fn test_default_path_ends_with_settings() {
        let path = SettingsLoader::default_path();
        assert!(path.ends_with("testloom/settings.toml"));
    }
}
