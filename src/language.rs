use crate::config::{ExtractConfig, LanguageConfig};
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Metadata for a language: its canonical name, the fence markers that
/// select it, and the extension used when a block is written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageMetadata {
    pub name: Cow<'static, str>,
    pub fence_markers: Vec<String>,
    pub file_extension: Cow<'static, str>,
}

/// (canonical name, fence markers, file extension)
///
/// Aliases follow highlight.js; extensions follow GitHub Linguist.
const KNOWN_LANGUAGES: &[(&str, &[&str], &str)] = &[
    ("bash", &["bash", "sh", "shell", "zsh", "console"], ".sh"),
    ("c", &["c", "h"], ".c"),
    ("cpp", &["cpp", "c++", "cc", "cxx", "hpp"], ".cpp"),
    ("csharp", &["csharp", "cs", "c#"], ".cs"),
    ("css", &["css"], ".css"),
    ("dart", &["dart"], ".dart"),
    ("diff", &["diff", "patch"], ".diff"),
    ("go", &["go", "golang"], ".go"),
    ("html", &["html", "xhtml"], ".html"),
    ("java", &["java", "jsp"], ".java"),
    ("javascript", &["javascript", "js", "jsx", "mjs", "cjs"], ".js"),
    ("json", &["json", "jsonc"], ".json"),
    ("kotlin", &["kotlin", "kt", "kts"], ".kt"),
    ("markdown", &["markdown", "md", "mkdown", "mkd"], ".md"),
    ("mermaid", &["mermaid", "mmd"], ".mmd"),
    ("php", &["php"], ".php"),
    ("plantuml", &["plantuml", "puml", "uml"], ".puml"),
    ("python", &["python", "py", "gyp", "python3", "py3"], ".py"),
    ("pycon", &["pycon", "python-repl"], ".txt"),
    ("ruby", &["ruby", "rb"], ".rb"),
    ("rust", &["rust", "rs"], ".rs"),
    ("scala", &["scala"], ".scala"),
    ("sql", &["sql"], ".sql"),
    ("swift", &["swift"], ".swift"),
    ("text", &["text", "txt", "plaintext", "plain"], ".txt"),
    ("toml", &["toml"], ".toml"),
    ("typescript", &["typescript", "ts", "tsx", "mts", "cts"], ".ts"),
    ("xml", &["xml", "svg", "xsd"], ".xml"),
    ("yaml", &["yaml", "yml"], ".yaml"),
];

fn metadata_from_entry(entry: &(&'static str, &'static [&'static str], &'static str)) -> LanguageMetadata {
    let (name, markers, ext) = *entry;
    LanguageMetadata {
        name: Cow::Borrowed(name),
        fence_markers: markers.iter().map(|s| s.to_string()).collect(),
        file_extension: Cow::Borrowed(ext),
    }
}

fn unknown_language(tag: &str) -> LanguageMetadata {
    if tag.is_empty() {
        return get_language_metadata("text");
    }
    LanguageMetadata {
        name: Cow::Owned(tag.to_string()),
        fence_markers: vec![tag.to_string()],
        file_extension: Cow::Owned(format!(".{}", tag)),
    }
}

/// Get language metadata for a canonical language name.
///
/// Unknown names map to themselves, with `.<name>` as extension.
///
/// # Examples
///
/// ```
/// use doc_examples::get_language_metadata;
///
/// let metadata = get_language_metadata("python");
/// assert_eq!(metadata.file_extension, ".py");
/// assert!(metadata.fence_markers.contains(&"py".to_string()));
///
/// let metadata = get_language_metadata("gdscript");
/// assert_eq!(metadata.file_extension, ".gdscript");
/// ```
pub fn get_language_metadata(lang_name: &str) -> LanguageMetadata {
    KNOWN_LANGUAGES
        .iter()
        .find(|(name, _, _)| *name == lang_name)
        .map(metadata_from_entry)
        .unwrap_or_else(|| unknown_language(lang_name))
}

/// Resolves a fence tag as written in a document (`py`, `Python`, `js`) to
/// the language it names. An empty tag resolves to `text`.
///
/// ```
/// use doc_examples::resolve_fence;
///
/// assert_eq!(resolve_fence("py").name, "python");
/// assert_eq!(resolve_fence("").name, "text");
/// ```
pub fn resolve_fence(tag: &str) -> LanguageMetadata {
    let tag = tag.to_lowercase();
    KNOWN_LANGUAGES
        .iter()
        .find(|(_, markers, _)| markers.contains(&tag.as_str()))
        .map(metadata_from_entry)
        .unwrap_or_else(|| unknown_language(&tag))
}

/// A language whose checker comes from `doc-examples.toml`.
///
/// All checking behavior comes from configuration: checker path, flags and an
/// optional preamble written before every block.
#[derive(Debug, Clone)]
pub struct ConfiguredLanguage {
    name: String,
    config: LanguageConfig,
    file_extension: String,
}

impl fmt::Display for ConfiguredLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl ConfiguredLanguage {
    pub fn new(name: String, config: LanguageConfig) -> Self {
        let file_extension = get_language_metadata(&name).file_extension.into_owned();

        Self {
            name,
            config,
            file_extension,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the file extension for this language (e.g., ".py", ".ts").
    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    async fn write_source_file(&self, code: &str, temp_file: &Path) -> Result<()> {
        let mut file = File::create(temp_file)
            .await
            .with_context(|| format!("Failed to create temporary file: {}", temp_file.display()))?;

        if let Some(ref preamble) = self.config.preamble {
            file.write_all(preamble.as_bytes()).await?;
            file.write_all(b"\n\n").await?;
        }

        file.write_all(code.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Writes `code` to `temp_file` and runs the checker on it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The temporary file cannot be created or written
    /// - The checker executable cannot be found or executed
    /// - The checker exits with a non-zero status; the error carries its
    ///   stderr, or stdout when stderr is empty
    pub async fn check(&self, code: &str, temp_file: &Path) -> Result<()> {
        self.write_source_file(code, temp_file).await?;

        let output = Command::new(&self.config.checker)
            .args(&self.config.flags)
            .arg(temp_file)
            .output()
            .await
            .with_context(|| {
                format!(
                    "Failed to execute checker '{}' for language '{}'\nFlags: {:?}\nFile: {}",
                    self.config.checker,
                    self,
                    self.config.flags,
                    temp_file.display()
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let error_msg = if !stderr.is_empty() { stderr } else { stdout };
            anyhow::bail!(
                "{} check failed\nChecker: {}\nFlags: {:?}\nFile: {}\n\n{}",
                self,
                self.config.checker,
                self.config.flags,
                temp_file.display(),
                error_msg
            );
        }

        Ok(())
    }
}

/// Registry of the languages that have a checker configured.
pub struct LanguageRegistry {
    config: ExtractConfig,
}

impl LanguageRegistry {
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Finds the enabled language whose fence markers include `fence`.
    ///
    /// Matching is case-insensitive. When several languages claim the same
    /// marker, the first by name wins.
    pub fn find_by_fence(&self, fence: &str) -> Option<ConfiguredLanguage> {
        let fence = fence.to_lowercase();
        let (name, config) = self.config.languages().iter().find(|(name, config)| {
            config.enabled
                && config
                    .get_fence_markers(name)
                    .iter()
                    .any(|m| m.to_lowercase() == fence)
        })?;

        Some(ConfiguredLanguage::new(name.clone(), config.clone()))
    }

    pub fn is_empty(&self) -> bool {
        !self.config.languages().values().any(|c| c.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(toml: &str) -> LanguageRegistry {
        LanguageRegistry::from_config(&ExtractConfig::from_toml_str(toml).unwrap())
    }

    #[test]
    fn test_resolve_fence_aliases() {
        assert_eq!(resolve_fence("py").name, "python");
        assert_eq!(resolve_fence("Python").name, "python");
        assert_eq!(resolve_fence("puml").file_extension, ".puml");
        assert_eq!(resolve_fence("cobol").name, "cobol");
        assert_eq!(resolve_fence("cobol").file_extension, ".cobol");
        assert_eq!(resolve_fence("").file_extension, ".txt");
    }

    #[test]
    fn test_find_by_fence() {
        let registry = registry(
            r#"
[languages.python]
checker = "python3"
flags = ["-m", "py_compile"]
"#,
        );

        let lang = registry.find_by_fence("py").unwrap();
        assert_eq!(lang.name(), "python");
        assert_eq!(lang.file_extension(), ".py");
        assert!(registry.find_by_fence("PYTHON").is_some());
        assert!(registry.find_by_fence("mermaid").is_none());
    }

    #[test]
    fn test_disabled_language_is_not_found() {
        let registry = registry(
            r#"
[languages.python]
enabled = false
checker = "python3"
"#,
        );
        assert!(registry.find_by_fence("python").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_custom_fence_markers() {
        let registry = registry(
            r#"
[languages.python]
checker = "python3"
fence_markers = ["python-exemplo"]
"#,
        );
        assert!(registry.find_by_fence("python-exemplo").is_some());
        assert!(registry.find_by_fence("py").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_check_reports_checker_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = registry(
            r#"
[languages.text]
checker = "false"
"#,
        );
        let lang = registry.find_by_fence("txt").unwrap();
        let err = lang
            .check("anything", &dir.path().join("block.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("text check failed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_check_writes_preamble_and_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = registry(
            r##"
[languages.text]
checker = "true"
preamble = "# preamble"
"##,
        );
        let lang = registry.find_by_fence("text").unwrap();
        let path = dir.path().join("block.txt");
        lang.check("body", &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# preamble\n\nbody");
    }
}
