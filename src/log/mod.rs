use crate::config::Config;
use crate::key::PlanKey;
use crate::wire::GenerationRequest;
use anyhow::Result;
use chrono::Utc;
use fs_err as fs;
use serde_json::{json, to_string_pretty};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Install the stderr subscriber. `RUST_LOG` wins over the `debug` flag.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "budgetwise=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Per-session directory of generation exchanges, written when the
/// corresponding config flags are on.
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    pub dir: PathBuf,
    save_request: bool,
    save_response: bool,
}

fn session_dir(root: &Path, session: Uuid) -> PathBuf {
    root.join(session.to_string())
}

impl ArtifactSink {
    /// `None` when neither requests nor responses are saved.
    pub fn from_config(cfg: &Config, session: Uuid) -> Option<Self> {
        if !cfg.save_request && !cfg.save_response {
            return None;
        }
        Some(Self {
            dir: session_dir(Path::new(&cfg.artifacts_dir), session),
            save_request: cfg.save_request,
            save_response: cfg.save_response,
        })
    }

    pub fn save_request(&self, key: &PlanKey, req: &GenerationRequest) -> Result<Option<PathBuf>> {
        if !self.save_request {
            return Ok(None);
        }
        let body = json!({ "key": key.to_string(), "saved_at": Utc::now(), "request": req });
        self.write(&format!("{key}.request.json"), &to_string_pretty(&body)?).map(Some)
    }

    pub fn save_response(&self, key: &PlanKey, raw: &str) -> Result<Option<PathBuf>> {
        if !self.save_response {
            return Ok(None);
        }
        // Keep the payload verbatim when it is not JSON; that is the interesting case.
        let payload = serde_json::from_str::<serde_json::Value>(raw).unwrap_or_else(|_| json!(raw));
        let body = json!({ "key": key.to_string(), "saved_at": Utc::now(), "response": payload });
        self.write(&format!("{key}.response.json"), &to_string_pretty(&body)?).map(Some)
    }

    fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let p = self.dir.join(name);
        fs::write(&p, contents)?;
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::build_key;
    use crate::reference::{find_language, find_region, IncomeBracket};

    fn fixture() -> (PlanKey, GenerationRequest) {
        let us = find_region("US").unwrap();
        let bracket = IncomeBracket::new(3000, Some(6000), "");
        let en = find_language("en").unwrap();
        (build_key(&us, &bracket, &en), crate::prompt::build(&us, &bracket, &en))
    }

    #[test]
    fn disabled_when_nothing_is_saved() {
        assert!(ArtifactSink::from_config(&Config::default(), Uuid::new_v4()).is_none());
    }

    #[test]
    fn writes_into_session_directory() {
        let root = tempfile::tempdir().unwrap();
        let cfg = Config {
            artifacts_dir: root.path().display().to_string(),
            save_request: true,
            save_response: true,
            ..Config::default()
        };
        let session = Uuid::new_v4();
        let sink = ArtifactSink::from_config(&cfg, session).unwrap();
        let (key, req) = fixture();

        let req_path = sink.save_request(&key, &req).unwrap().unwrap();
        let resp_path = sink.save_response(&key, "not json").unwrap().unwrap();

        assert_eq!(req_path, root.path().join(session.to_string()).join("US-3000-6000-en.request.json"));
        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&resp_path).unwrap()).unwrap();
        assert_eq!(saved["response"], "not json");
        assert_eq!(saved["key"], "US-3000-6000-en");
    }

    #[test]
    fn respects_individual_flags() {
        let root = tempfile::tempdir().unwrap();
        let cfg = Config {
            artifacts_dir: root.path().display().to_string(),
            save_response: true,
            ..Config::default()
        };
        let sink = ArtifactSink::from_config(&cfg, Uuid::new_v4()).unwrap();
        let (key, req) = fixture();
        assert!(sink.save_request(&key, &req).unwrap().is_none());
    }
}
