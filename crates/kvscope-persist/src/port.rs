//! Persistence port: the store's one gateway to durable state.
//!
//! The port composes an optional durable medium with an optional cookie
//! mirror under a single namespace. Saving is fire-and-forget from the
//! store's point of view: a failing channel logs a warning and the
//! in-memory state stays authoritative. Loading prefers the mirror when
//! one is attached, falling back to the durable medium.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::cookie::{CookieJar, CookieRecord, FileCookieJar};
use crate::error::{PersistError, Result};
use crate::medium::Medium;
use crate::sqlite::SqliteMedium;

/// Gateway from logical keys to durable record keys.
///
/// Record keys are `namespace + "." + key`; the namespace is validated by
/// the caller before the port is built.
pub struct PersistencePort {
    medium: Option<Arc<dyn Medium>>,
    jar: Option<Arc<dyn CookieJar>>,
    namespace: String,
}

impl PersistencePort {
    /// A port with no channels at all. Loads miss, saves are no-ops.
    pub fn disabled() -> Self {
        Self {
            medium: None,
            jar: None,
            namespace: String::new(),
        }
    }

    /// An enabled port with no channels attached yet.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            medium: None,
            jar: None,
            namespace: namespace.into(),
        }
    }

    /// Attach a durable medium.
    pub fn with_medium(mut self, medium: Arc<dyn Medium>) -> Self {
        self.medium = Some(medium);
        self
    }

    /// Attach a cookie mirror.
    pub fn with_jar(mut self, jar: Arc<dyn CookieJar>) -> Self {
        self.jar = Some(jar);
        self
    }

    /// Probe the platform's local data directory for the default channels:
    /// `kvscope/store.db` and, when `mirror` is set, `kvscope/cookies.txt`.
    ///
    /// An environment without a usable data directory degrades to a
    /// memory-only port with one warning instead of failing the store.
    pub fn ambient(namespace: impl Into<String>, mirror: bool) -> Self {
        Self::ambient_at(dirs::data_local_dir(), namespace, mirror)
    }

    fn ambient_at(data_dir: Option<PathBuf>, namespace: impl Into<String>, mirror: bool) -> Self {
        let namespace = namespace.into();
        match ambient_channels(data_dir, mirror) {
            Ok((medium, jar)) => Self {
                medium: Some(medium),
                jar,
                namespace,
            },
            Err(error) => {
                tracing::warn!(%error, "durable storage unavailable, continuing in memory only");
                Self {
                    medium: None,
                    jar: None,
                    namespace,
                }
            }
        }
    }

    /// Whether a durable medium is attached.
    pub fn is_durable(&self) -> bool {
        self.medium.is_some()
    }

    /// Whether a cookie mirror is attached.
    pub fn mirrors(&self) -> bool {
        self.jar.is_some()
    }

    fn record_key(&self, key: &str) -> String {
        format!("{}.{}", self.namespace, key)
    }

    /// Load the stored value for a logical key.
    ///
    /// The mirror is consulted first when attached; a missing, unreadable,
    /// or corrupt mirror record falls through to the durable medium. Any
    /// channel failure is logged and treated as a miss.
    pub fn load(&self, key: &str) -> Option<Value> {
        let record_key = self.record_key(key);

        if let Some(jar) = &self.jar {
            match jar.read(&record_key) {
                Ok(Some(raw)) => match serde_json::from_str(&raw) {
                    Ok(value) => return Some(value),
                    Err(error) => {
                        tracing::warn!(
                            key = record_key.as_str(),
                            %error,
                            "cookie mirror record corrupt, falling back to durable medium"
                        );
                    }
                },
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(key = record_key.as_str(), %error, "cookie mirror read failed");
                }
            }
        }

        let medium = self.medium.as_ref()?;
        match medium.read(&record_key) {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(value) => Some(value),
                Err(error) => {
                    tracing::warn!(key = record_key.as_str(), %error, "stored payload corrupt");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(key = record_key.as_str(), %error, "durable read failed");
                None
            }
        }
    }

    /// Save a value for a logical key: durable medium first, then mirror.
    ///
    /// Failures are logged and do not propagate; the in-memory store is
    /// the source of truth and keeps serving the new value either way.
    pub fn save(&self, key: &str, value: &Value) {
        if self.medium.is_none() && self.jar.is_none() {
            return;
        }

        let record_key = self.record_key(key);
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(key = record_key.as_str(), %error, "value not serializable");
                return;
            }
        };

        if let Some(medium) = &self.medium {
            if let Err(error) = medium.write(&record_key, &payload) {
                tracing::warn!(key = record_key.as_str(), %error, "durable write failed");
            }
        }

        if let Some(jar) = &self.jar {
            let record = CookieRecord::new(record_key.clone(), payload);
            if let Err(error) = jar.write(&record) {
                tracing::warn!(key = record_key.as_str(), %error, "cookie mirror write failed");
            }
        }
    }
}

fn ambient_channels(
    data_dir: Option<PathBuf>,
    mirror: bool,
) -> Result<(Arc<dyn Medium>, Option<Arc<dyn CookieJar>>)> {
    let base = data_dir
        .ok_or_else(|| PersistError::Unavailable("no local data directory".into()))?
        .join("kvscope");
    std::fs::create_dir_all(&base)?;

    let medium: Arc<dyn Medium> = Arc::new(SqliteMedium::open(base.join("store.db"))?);
    let jar = mirror
        .then(|| Arc::new(FileCookieJar::new(base.join("cookies.txt"))) as Arc<dyn CookieJar>);
    Ok((medium, jar))
}
