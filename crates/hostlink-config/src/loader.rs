//! Configuration loader.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Config::default()),
        }
    }

    /// Substitute every `${VAR}` with its value in a single pass.
    ///
    /// Substituted values are copied verbatim, so a value that itself
    /// contains `${...}` is not expanded again. Text after an unquoted `#`
    /// is a comment and is left alone.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut expanded = String::with_capacity(content.len());

        for line in content.split_inclusive('\n') {
            let (code, comment) = line.split_at(comment_start(line));
            let mut last = 0;
            for cap in ENV_VAR_PATTERN.captures_iter(code) {
                let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                    continue;
                };
                let value = std::env::var(name.as_str())
                    .map_err(|_| ConfigError::EnvVarNotSet(name.as_str().to_string()))?;
                expanded.push_str(&code[last..whole.start()]);
                expanded.push_str(&value);
                last = whole.end();
            }
            expanded.push_str(&code[last..]);
            expanded.push_str(comment);
        }

        Ok(expanded)
    }

    /// Expand shell-style paths (e.g., `~/.hostlink/logs`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

/// Byte offset of the `#` that opens a comment on `line`, or its length.
///
/// Tracks basic (`"..."`, with escapes) and literal (`'...'`) strings on a
/// single line.
fn comment_start(line: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '#' => return i,
            None if c == '"' || c == '\'' => quote = Some(c),
            None => {}
        }
    }
    line.len()
}
