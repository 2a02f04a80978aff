use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "quill.config.json";

/// Quill configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory `check` walks when no path is given
    #[serde(default = "default_src_dir")]
    pub src_dir: String,

    /// Preferred locales for names in suggestions, most preferred first
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,

    /// Upper bound on suggestions printed by `complete`
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// File extensions treated as Quill sources
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_src_dir() -> String {
    "src".to_string()
}

fn default_locales() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_max_suggestions() -> usize {
    20
}

fn default_extensions() -> Vec<String> {
    vec!["quill".to_string()]
}

impl Config {
    /// Load config from `path` if given, else from the directory's default
    /// config file, else defaults
    pub fn load(cwd: &str, path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else if path.is_some() {
            Err(anyhow::anyhow!("Config file does not exist: {}", config_path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Get absolute path to source directory
    pub fn get_src_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.src_dir)
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x == e))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            locales: default_locales(),
            max_suggestions: default_max_suggestions(),
            extensions: default_extensions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "srcDir": "programs",
            "locales": ["es", "en"],
            "maxSuggestions": 5,
            "extensions": ["quill", "q"]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.src_dir, "programs");
        assert_eq!(config.locales, vec!["es", "en"]);
        assert_eq!(config.max_suggestions, 5);
        assert!(config.is_source_file(Path::new("a/b.q")));
        assert!(!config.is_source_file(Path::new("a/b.txt")));
    }

    #[test]
    fn test_missing_fields_default() {
        let config: Config = serde_json::from_str(r#"{ "locales": ["fr"] }"#).unwrap();
        assert_eq!(config.src_dir, "src");
        assert_eq!(config.locales, vec!["fr"]);
        assert_eq!(config.max_suggestions, 20);
        assert_eq!(config.extensions, vec!["quill"]);
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let missing = Path::new("definitely/not/here.json");
        assert!(Config::load(".", Some(missing)).is_err());
    }
}
