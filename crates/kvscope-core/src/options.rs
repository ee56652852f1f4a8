//! Store configuration.

use crate::error::ConfigError;

/// Persistence namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "kvscope-default";

/// Configuration for one store instance.
///
/// The default is a plain shared in-memory store: `persistent`,
/// `isolated` and `mirror_to_cookies` all off, namespace
/// [`DEFAULT_NAMESPACE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Write values through the durable medium and hydrate from it on
    /// every mount.
    pub persistent: bool,

    /// Resolve keys through the owner/follower scope protocol instead of
    /// using the caller-supplied key directly.
    pub isolated: bool,

    /// Mirror persisted records into the cookie jar so an external
    /// rendering path that can only read cookies still sees them.
    pub mirror_to_cookies: bool,

    /// Prefix for persistence record keys (`namespace + "." + key`).
    pub namespace: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            persistent: false,
            isolated: false,
            mirror_to_cookies: false,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl StoreOptions {
    /// Plain shared store: in-memory only, no scoping.
    pub fn shared() -> Self {
        Self::default()
    }

    /// Shared store persisted through the durable medium.
    pub fn persistent() -> Self {
        Self {
            persistent: true,
            ..Self::default()
        }
    }

    /// Persistent store that also mirrors every record into the cookie
    /// jar.
    pub fn persistent_with_cookies() -> Self {
        Self {
            persistent: true,
            mirror_to_cookies: true,
            ..Self::default()
        }
    }

    /// Scope-isolated store: keys resolve through the owner/follower
    /// protocol, in-memory only.
    pub fn isolated() -> Self {
        Self {
            isolated: true,
            ..Self::default()
        }
    }

    /// Replace the persistence namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Check the option set for conflicts.
    ///
    /// Called by the store factory before any table is built, so a bad
    /// configuration never produces a half-working store.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if self.mirror_to_cookies && !self.persistent {
            return Err(ConfigError::MirrorWithoutPersistence);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_validate() {
        assert_eq!(StoreOptions::default().validate(), Ok(()));
        assert_eq!(StoreOptions::default().namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_presets_validate() {
        assert_eq!(StoreOptions::shared().validate(), Ok(()));
        assert_eq!(StoreOptions::persistent().validate(), Ok(()));
        assert_eq!(StoreOptions::persistent_with_cookies().validate(), Ok(()));
        assert_eq!(StoreOptions::isolated().validate(), Ok(()));
    }

    #[test]
    fn test_mirror_without_persistence_rejected() {
        let options = StoreOptions {
            mirror_to_cookies: true,
            ..StoreOptions::default()
        };
        assert_eq!(
            options.validate(),
            Err(ConfigError::MirrorWithoutPersistence)
        );
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let options = StoreOptions::persistent().with_namespace("");
        assert_eq!(options.validate(), Err(ConfigError::EmptyNamespace));
    }

    #[test]
    fn test_namespace_override() {
        let options = StoreOptions::persistent().with_namespace("settings");
        assert_eq!(options.namespace, "settings");
        assert_eq!(options.validate(), Ok(()));
    }
}
