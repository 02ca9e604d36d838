use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        compilers::{Compiler, CompilerOptions, Format},
        extract::DEFAULT_TIMEOUT,
        parsers::ParserName,
        post_process::{
            KeyAsDefaultValue, KeyAsInitialDefaultValue, PostProcessor, PurgeObsoleteKeys,
            SortByKey, SortSensitivity, StringAsDefaultValue, StripPrefix,
        },
    },
    task::DEFAULT_PATTERNS,
};

pub const CONFIG_FILE_NAME: &str = ".ngx-extract.json";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_input")]
    pub input: Vec<String>,
    #[serde(default)]
    pub output: Vec<String>,
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub format: Format,
    #[serde(default = "default_format_indentation")]
    pub format_indentation: String,
    #[serde(default)]
    pub replace: bool,
    #[serde(default)]
    pub sort: bool,
    #[serde(default)]
    pub sort_sensitivity: SortSensitivity,
    #[serde(default)]
    pub clean: bool,
    #[serde(default)]
    pub key_as_default_value: bool,
    #[serde(default)]
    pub key_as_initial_default_value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_as_default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<String>,
    /// Custom marker function name. Replaces the marker parser when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(default = "ParserName::all")]
    pub parsers: Vec<ParserName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<String>,
    #[serde(default = "default_po_source_locations")]
    pub po_source_locations: bool,
    #[serde(default)]
    pub po_domain: String,
    #[serde(default = "default_worker_timeout_secs")]
    pub worker_timeout_secs: u64,
}

fn default_input() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

fn default_format_indentation() -> String {
    "\t".to_string()
}

fn default_po_source_locations() -> bool {
    true
}

fn default_worker_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: Vec::new(),
            patterns: default_patterns(),
            format: Format::default(),
            format_indentation: default_format_indentation(),
            replace: false,
            sort: false,
            sort_sensitivity: SortSensitivity::default(),
            clean: false,
            key_as_default_value: false,
            key_as_initial_default_value: false,
            string_as_default_value: None,
            strip_prefix: None,
            marker: None,
            parsers: ParserName::all(),
            cache_file: None,
            po_source_locations: default_po_source_locations(),
            po_domain: String::new(),
            worker_timeout_secs: default_worker_timeout_secs(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Rejects invalid glob patterns, more than one default-value option, an
    /// empty parser list and a zero worker timeout.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.patterns {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'patterns': \"{}\"", pattern))?;
        }

        // Inputs without wildcards are literal paths.
        for input in &self.input {
            if input.contains('*') || input.contains('?') {
                Pattern::new(input)
                    .with_context(|| format!("Invalid glob pattern in 'input': \"{}\"", input))?;
            }
        }

        let default_value_options = [
            self.key_as_default_value,
            self.key_as_initial_default_value,
            self.string_as_default_value.is_some(),
        ];
        if default_value_options.iter().filter(|set| **set).count() > 1 {
            bail!(
                "Only one of 'keyAsDefaultValue', 'keyAsInitialDefaultValue' and 'stringAsDefaultValue' can be set"
            );
        }

        if self.parsers.is_empty() {
            bail!("'parsers' must name at least one parser");
        }
        if self.worker_timeout_secs == 0 {
            bail!("'workerTimeoutSecs' must be greater than zero");
        }

        Ok(())
    }

    /// Post-processor chain: purge, default value, strip prefix, sort.
    pub fn post_processors(&self) -> Vec<PostProcessor> {
        let mut processors: Vec<PostProcessor> = Vec::new();
        if self.clean {
            processors.push(PurgeObsoleteKeys.into());
        }
        if self.key_as_default_value {
            processors.push(KeyAsDefaultValue.into());
        } else if self.key_as_initial_default_value {
            processors.push(KeyAsInitialDefaultValue.into());
        } else if let Some(value) = &self.string_as_default_value {
            processors.push(StringAsDefaultValue::new(value.as_str()).into());
        }
        if let Some(prefix) = &self.strip_prefix {
            processors.push(StripPrefix::new(prefix.as_str()).into());
        }
        if self.sort {
            processors.push(SortByKey::new(self.sort_sensitivity).into());
        }
        processors
    }

    pub fn compiler(&self) -> Compiler {
        Compiler::new(
            self.format,
            &CompilerOptions {
                indentation: self.format_indentation.clone(),
                po_source_locations: self.po_source_locations,
                po_domain: self.po_domain.clone(),
            },
        )
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }
}

/// Config written by `init`.
pub fn default_config_json() -> Result<String> {
    let config = Config {
        output: vec!["src/assets/i18n/en.json".to_string()],
        ..Default::default()
    };
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// Where the config was read from. `None` when using defaults.
    pub path: Option<PathBuf>,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                path: Some(path),
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            path: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::core::post_process::Process;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input, vec!["src"]);
        assert!(config.output.is_empty());
        assert_eq!(config.patterns, vec!["**/*.html", "**/*.ts"]);
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.format_indentation, "\t");
        assert_eq!(config.parsers, ParserName::all());
        assert!(config.po_source_locations);
        assert_eq!(config.worker_timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
              "input": ["projects/app/src"],
              "output": ["i18n/en.po", "i18n/fr.po"],
              "format": "po",
              "sortSensitivity": "insensitive",
              "parsers": ["pipe", "service"],
              "poDomain": "admin",
              "marker": "_"
          }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.input, vec!["projects/app/src"]);
        assert_eq!(config.output, vec!["i18n/en.po", "i18n/fr.po"]);
        assert_eq!(config.format, Format::Po);
        assert_eq!(config.sort_sensitivity, SortSensitivity::Insensitive);
        assert_eq!(config.parsers, vec![ParserName::Pipe, ParserName::Service]);
        assert_eq!(config.po_domain, "admin");
        assert_eq!(config.marker.as_deref(), Some("_"));
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{ "output": ["en.json"] }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.output, vec!["en.json"]);
        assert_eq!(config.input, default_input());
        assert_eq!(config.patterns, default_patterns());
        assert_eq!(config.worker_timeout_secs, 60);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let json = r#"{ "format": "yaml" }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn test_find_config_file() {
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("src").join("app");
        fs::create_dir_all(&sub_dir).unwrap();

        let config_path = dir.path().join(CONFIG_FILE_NAME);
        File::create(&config_path).unwrap();

        let found = find_config_file(&sub_dir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_stops_at_git_root() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        assert!(find_config_file(dir.path()).is_none());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, r#"{ "output": ["i18n/en.json"], "sort": true }"#).unwrap();

        let result = load_config(dir.path()).unwrap();
        assert_eq!(result.path, Some(config_path));
        assert_eq!(result.config.output, vec!["i18n/en.json"]);
        assert!(result.config.sort);
    }

    #[test]
    fn test_load_config_default_when_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let result = load_config(dir.path()).unwrap();
        assert!(result.path.is_none());
        assert_eq!(result.config.patterns, default_patterns());
    }

    #[test]
    fn test_load_config_with_invalid_pattern_fails() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "patterns": ["[invalid"] }"#,
        )
        .unwrap();

        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn test_validate_invalid_input_glob() {
        let config = Config {
            input: vec!["src/**/[invalid".to_string()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("input"));
    }

    #[test]
    fn test_validate_literal_input_with_brackets() {
        let config = Config {
            input: vec!["src/[lang]".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_conflicting_default_values() {
        let config = Config {
            key_as_default_value: true,
            string_as_default_value: Some("TODO".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Only one of"));
    }

    #[test]
    fn test_validate_empty_parsers_and_zero_timeout() {
        let config = Config {
            parsers: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            worker_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_post_processor_chain_order() {
        let config = Config {
            clean: true,
            sort: true,
            key_as_initial_default_value: true,
            strip_prefix: Some("APP.".to_string()),
            ..Default::default()
        };
        let names: Vec<String> = config
            .post_processors()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "purge-obsolete-keys",
                "key-as-initial-default-value",
                "strip-prefix",
                "sort-by-key"
            ]
        );
        assert!(Config::default().post_processors().is_empty());
    }

    #[test]
    fn test_default_config_json() {
        let json = default_config_json().unwrap();
        assert!(json.contains("\"output\""));
        assert!(json.contains("\"poSourceLocations\": true"));
        assert!(!json.contains("stripPrefix"));

        let config: Config = serde_json::from_str(&json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.output, vec!["src/assets/i18n/en.json"]);
    }
}
