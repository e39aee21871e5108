use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::ProviderKind;

pub const DEFAULT_CONFIG_FILE: &str = "budgetwise.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    /// Unset means the provider's default, see [`Config::model`].
    pub model: Option<String>,
    pub api_base: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub default_language: String,
    pub artifacts_dir: String,
    pub save_request: bool,
    pub save_response: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: None,
            api_base: None,
            api_key: None,
            timeout_secs: 60,
            default_language: "en".into(),
            artifacts_dir: ".budgetwise/tx".into(),
            save_request: false,
            save_response: false,
        }
    }
}

impl Config {
    /// Load from `path`, or from `budgetwise.toml` in the working directory
    /// when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    /// Fill a missing API key from the environment. Call after the provider
    /// is final.
    pub fn resolve_credentials(&mut self) {
        if self.api_key.is_none() {
            self.api_key = api_key_from_env(&self.provider);
        }
    }

    /// Model sent to the provider: the configured one, or the provider default.
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or_else(|| default_model(&self.provider))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))
    }
}

pub fn default_model(provider: &ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Gemini => "gemini-2.5-flash",
        ProviderKind::OpenAI => "gpt-4.1-mini",
    }
}

/// `BUDGETWISE_API_KEY` first, then the provider's conventional variables.
pub fn api_key_from_env(provider: &ProviderKind) -> Option<String> {
    let vars: &[&str] = match provider {
        ProviderKind::Gemini => &["BUDGETWISE_API_KEY", "GEMINI_API_KEY", "API_KEY"],
        ProviderKind::OpenAI => &["BUDGETWISE_API_KEY", "OPENAI_API_KEY"],
    };
    vars.iter()
        .filter_map(|v| std::env::var(v).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "provider = \"openai\"\nmodel = \"gpt-4.1-mini\"\nsave_request = true").unwrap();

        let cfg = Config::from_file(f.path()).unwrap();
        assert!(matches!(cfg.provider, ProviderKind::OpenAI));
        assert_eq!(cfg.model(), "gpt-4.1-mini");
        assert!(cfg.save_request);
        assert_eq!(cfg.timeout_secs, 60);
        assert_eq!(cfg.default_language, "en");
    }

    #[test]
    fn model_follows_the_provider_unless_set() {
        let mut cfg = Config::default();
        assert_eq!(cfg.model(), "gemini-2.5-flash");

        cfg.provider = ProviderKind::OpenAI;
        assert_eq!(cfg.model(), "gpt-4.1-mini");

        cfg.model = Some("gpt-4o".into());
        assert_eq!(cfg.model(), "gpt-4o");
    }

    #[test]
    fn provider_only_file_gets_that_providers_model() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "provider = \"openai\"").unwrap();
        let cfg = Config::from_file(f.path()).unwrap();
        assert_eq!(cfg.model(), "gpt-4.1-mini");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "timeout_secs = \"soon\"").unwrap();
        assert!(Config::from_file(f.path()).is_err());
    }

    #[test]
    fn api_key_is_never_serialized() {
        let cfg = Config { api_key: Some("secret".into()), ..Config::default() };
        let out = toml::to_string(&cfg).unwrap();
        assert!(!out.contains("secret"));
    }
}
