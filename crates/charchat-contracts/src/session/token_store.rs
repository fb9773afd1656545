use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    #[serde(rename = "authToken", default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
}

/// Durable home of the bearer token pair.
pub trait TokenStore {
    fn load(&self) -> anyhow::Result<StoredTokens>;
    fn save(&self, tokens: &StoredTokens) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}

/// JSON object file holding `authToken` / `refreshToken`.
///
/// Unrelated keys already in the file are preserved, and every call re-reads
/// the file so two handles on the same path see each other's writes.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> anyhow::Result<StoredTokens> {
        let payload = read_json_object(&self.path).unwrap_or_default();
        Ok(StoredTokens {
            auth_token: string_field(&payload, AUTH_TOKEN_KEY),
            refresh_token: string_field(&payload, REFRESH_TOKEN_KEY),
        })
    }

    fn save(&self, tokens: &StoredTokens) -> anyhow::Result<()> {
        let mut payload = read_json_object(&self.path).unwrap_or_default();
        set_or_remove(&mut payload, AUTH_TOKEN_KEY, tokens.auth_token.as_deref());
        set_or_remove(
            &mut payload,
            REFRESH_TOKEN_KEY,
            tokens.refresh_token.as_deref(),
        );
        write_json_object(&self.path, &payload)
    }

    fn clear(&self) -> anyhow::Result<()> {
        let Some(mut payload) = read_json_object(&self.path) else {
            return Ok(());
        };
        payload.remove(AUTH_TOKEN_KEY);
        payload.remove(REFRESH_TOKEN_KEY);
        write_json_object(&self.path, &payload)
    }
}

/// Process-local store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    inner: Arc<Mutex<StoredTokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tokens)),
        }
    }

    pub fn snapshot(&self) -> StoredTokens {
        self.inner
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> anyhow::Result<StoredTokens> {
        Ok(self.snapshot())
    }

    fn save(&self, tokens: &StoredTokens) -> anyhow::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("token store lock poisoned"))?;
        *guard = tokens.clone();
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.save(&StoredTokens::default())
    }
}

fn string_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn set_or_remove(payload: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => {
            payload.insert(key.to_string(), Value::String(value.to_string()));
        }
        None => {
            payload.remove(key);
        }
    }
}

fn read_json_object(path: &Path) -> Option<Map<String, Value>> {
    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    parsed.as_object().cloned()
}

fn write_json_object(path: &Path, payload: &Map<String, Value>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    std::fs::write(
        path,
        serde_json::to_string_pretty(&Value::Object(payload.clone()))?,
    )
    .with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}
