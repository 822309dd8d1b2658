use crate::language::get_language_metadata;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up at the root of a documents tree.
pub const CONFIG_FILE_NAME: &str = "doc-examples.toml";

/// Configuration for doc-examples.
///
/// Deserialized from `doc-examples.toml`. Everything is optional: without a
/// file the tool lists and exports Markdown examples, and `check` has nothing
/// to run.
///
/// # Example
///
/// ```toml
/// extensions = ["md"]
///
/// [languages.python]
/// checker = "python3"
/// flags = ["-m", "py_compile"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// File extensions treated as documents
    pub extensions: Vec<String>,

    /// Language-specific checker configurations indexed by language name
    pub languages: BTreeMap<String, LanguageConfig>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string(), "markdown".to_string()],
            languages: BTreeMap::new(),
        }
    }
}

/// Checker configuration for one language.
///
/// `checker` and `flags` support `${VAR_NAME}` environment variable expansion.
///
/// # Security
///
/// Checker paths are validated to prevent command injection. Paths cannot
/// contain shell metacharacters or use parent directory traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Whether this language is enabled for checking
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Checker executable, run as `checker flags... <file>`
    pub checker: String,

    #[serde(default)]
    pub flags: Vec<String>,

    /// Optional preamble written before every block
    #[serde(default)]
    pub preamble: Option<String>,

    /// Fence markers that identify this language; defaults to the built-in
    /// aliases of the language name
    #[serde(default)]
    pub fence_markers: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl LanguageConfig {
    /// Validate the configuration for security and correctness
    pub fn validate(&self) -> Result<()> {
        if self.checker.is_empty() {
            anyhow::bail!("Checker path cannot be empty");
        }

        let dangerous_chars = [';', '|', '&', '`', '\n', '\r'];
        for ch in dangerous_chars {
            if self.checker.contains(ch) {
                anyhow::bail!(
                    "Checker path contains invalid character '{}': {}",
                    ch.escape_default(),
                    self.checker
                );
            }
        }

        let checker_path = Path::new(&self.checker);
        if checker_path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            anyhow::bail!("Checker path cannot contain '..': {}", self.checker);
        }

        if self.fence_markers.is_empty() {
            anyhow::bail!("Language configuration must have at least one fence marker");
        }

        Ok(())
    }

    /// Configured fence markers, or the built-in ones for `lang_name`.
    pub fn get_fence_markers(&self, lang_name: &str) -> Vec<String> {
        if self.fence_markers.is_empty() {
            get_language_metadata(lang_name).fence_markers
        } else {
            self.fence_markers.clone()
        }
    }
}

impl ExtractConfig {
    /// Parses a TOML configuration, expanding environment variables and
    /// validating every language.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: ExtractConfig =
            toml::from_str(content).context("Failed to parse configuration")?;

        for (name, lang_config) in config.languages.iter_mut() {
            lang_config.checker = expand_env_vars(&lang_config.checker);
            for flag in lang_config.flags.iter_mut() {
                *flag = expand_env_vars(flag);
            }
            lang_config.fence_markers = lang_config.get_fence_markers(name);

            lang_config
                .validate()
                .with_context(|| format!("Invalid configuration for language '{}'", name))?;
        }

        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration file {}", path.display()))
    }

    /// Resolves which configuration file applies to a documents tree: the
    /// explicit one, else `doc-examples.toml` at the root when it exists.
    pub fn locate(root: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let dir = if root.is_file() { root.parent()? } else { root };
        let candidate = dir.join(CONFIG_FILE_NAME);
        candidate.is_file().then_some(candidate)
    }

    /// Loads the configuration file found by [`ExtractConfig::locate`], or the
    /// defaults when there is none.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<(Option<PathBuf>, Self)> {
        match Self::locate(root, explicit) {
            Some(path) => {
                log::debug!("Using configuration {}", path.display());
                let config = Self::load(&path)?;
                Ok((Some(path), config))
            }
            None => Ok((None, Self::default())),
        }
    }

    pub fn languages(&self) -> &BTreeMap<String, LanguageConfig> {
        &self.languages
    }
}

/// Expand environment variables in a string
/// Supports ${VAR_NAME} syntax
/// This function processes the string in a single pass to avoid re-processing expanded values
fn expand_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut var_name = String::new();
        let mut found_close = false;
        for ch in chars.by_ref() {
            if ch == '}' {
                found_close = true;
                break;
            }
            var_name.push(ch);
        }

        match env::var(&var_name) {
            Ok(value) if found_close => result.push_str(&value),
            _ => {
                if found_close {
                    log::warn!(
                        "Environment variable '{}' not found, leaving unexpanded",
                        var_name
                    );
                }
                result.push_str("${");
                result.push_str(&var_name);
                if found_close {
                    result.push('}');
                }
            }
        }
    }

    result
}
