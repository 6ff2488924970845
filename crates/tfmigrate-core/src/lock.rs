//! Advisory migration lock over the keyed store
//!
//! The store cannot compare-and-swap, so each lock generation is encoded
//! as its own key. Releasing the lock writes a fresh token twice:
//!
//! 1. `<lock key>_<token> = <token>`  (the record an acquirer will consume)
//! 2. `<lock key> = <token>`          (published to the next job's environment)
//!
//! Acquiring reads `<lock key>` from the job's snapshot and deletes
//! `<lock key>_<token>`. A given record can be deleted once, so at most one
//! job observes success per generation. A job whose snapshot predates a
//! rotation gets "lock not found" even without real contention.
//!
//! The two release writes are separate requests. If the second fails the
//! token record is left orphaned and the canonical key still names the
//! previous generation; an operator recovers with `force-unlock`.

use std::fmt;
use std::time::Instant;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::errors::{MigrateError, Result};
use crate::snapshot::EnvSnapshot;
use crate::store::{DeleteOutcome, KeyedStore};
use crate::{log_op_end, log_op_error, log_op_start};

/// Base name of the lock variable
pub const BASE_LOCK_NAME: &str = "TF_MIGRATION_LOCK";

/// Variable holding the optional environment discriminator
pub const ENV_DISCRIMINATOR: &str = "TF_ENV";

/// Name of the canonical lock variable for one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockKey(String);

impl LockKey {
    /// `TF_MIGRATION_LOCK`, or `TF_MIGRATION_LOCK_<ENV>` when a discriminator is set
    pub fn for_environment(environment: Option<&str>) -> Self {
        match environment.filter(|e| !e.is_empty()) {
            Some(env) => Self(format!("{}_{}", BASE_LOCK_NAME, env)),
            None => Self(BASE_LOCK_NAME.to_string()),
        }
    }

    /// Derive the key from `TF_ENV` in the snapshot
    pub fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self::for_environment(snapshot.get(ENV_DISCRIMINATOR))
    }

    /// Key of the record that represents one token generation
    pub fn token_key(&self, token: &str) -> String {
        format!("{}_{}", self.0, token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One generation of the lock: 128 random bits
///
/// Rendered as `8_4_4_4_12` hex groups joined by underscores so that
/// `<lock key>_<token>` stays a legal environment variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(String);

impl LockToken {
    /// Draw a fresh token from the OS random source
    ///
    /// # Errors
    ///
    /// Returns `RandomSource` if the OS cannot provide entropy.
    pub fn generate() -> Result<Self> {
        let mut buf = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| MigrateError::RandomSource {
                reason: e.to_string(),
            })?;
        Ok(Self::from_bytes(&buf))
    }

    /// Render raw bytes in token form
    pub fn from_bytes(bytes: &[u8; 16]) -> Self {
        Self(format!(
            "{}_{}_{}_{}_{}",
            hex::encode(&bytes[0..4]),
            hex::encode(&bytes[4..6]),
            hex::encode(&bytes[6..8]),
            hex::encode(&bytes[8..10]),
            hex::encode(&bytes[10..16]),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What `initialize` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// A lock value was already visible; nothing was written
    AlreadyInitialized,
    /// A first generation was published
    Released(LockToken),
}

/// Acquire/release protocol for one lock key
pub struct LockManager<'a> {
    key: LockKey,
    snapshot: &'a EnvSnapshot,
    store: &'a dyn KeyedStore,
}

impl<'a> LockManager<'a> {
    pub fn new(snapshot: &'a EnvSnapshot, store: &'a dyn KeyedStore) -> Self {
        Self {
            key: LockKey::from_snapshot(snapshot),
            snapshot,
            store,
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// Token visible in the snapshot, if any
    pub fn current_token(&self) -> Option<&str> {
        self.snapshot.get(self.key.as_str())
    }

    /// Whether a lock generation is visible locally
    pub fn is_held(&self) -> bool {
        self.current_token().is_some()
    }

    /// Consume the generation named by the snapshot
    ///
    /// # Errors
    ///
    /// - `LockNotFound` when no token is visible, or when the token record
    ///   was already consumed (contention; never retried)
    /// - `LockFailed` for any other store answer
    pub fn acquire(&self) -> Result<()> {
        let start = Instant::now();
        log_op_start!("lock", lock_key = %self.key);

        let result = self.try_acquire();
        match &result {
            Ok(()) => {
                log_op_end!("lock", start, lock_key = %self.key);
            }
            Err(e) => {
                log_op_error!("lock", start, e, lock_key = %self.key);
            }
        }
        result
    }

    fn try_acquire(&self) -> Result<()> {
        let token = self.current_token().ok_or(MigrateError::LockNotFound)?;
        match self.store.delete(&self.key.token_key(token))? {
            DeleteOutcome::Deleted => Ok(()),
            DeleteOutcome::NotFound => Err(MigrateError::LockNotFound),
        }
    }

    /// Publish a fresh generation
    ///
    /// # Errors
    ///
    /// Returns `UnlockFailed` wrapping the first failing step. A failure on
    /// the second write leaves the first one in place.
    pub fn release(&self) -> Result<LockToken> {
        let start = Instant::now();
        log_op_start!("unlock", lock_key = %self.key);

        let result = self.try_release().map_err(MigrateError::unlock_failed);
        match &result {
            Ok(_) => {
                log_op_end!("unlock", start, lock_key = %self.key);
            }
            Err(e) => {
                log_op_error!("unlock", start, e, lock_key = %self.key);
            }
        }
        result
    }

    fn try_release(&self) -> Result<LockToken> {
        let token = LockToken::generate()?;
        self.store
            .put(&self.key.token_key(token.as_str()), token.as_str())?;
        self.store.put(self.key.as_str(), token.as_str())?;
        Ok(token)
    }

    /// Publish the first generation unless one is already visible
    ///
    /// # Errors
    ///
    /// Propagates `release` failures.
    pub fn initialize(&self) -> Result<InitOutcome> {
        if self.is_held() {
            tracing::info!(lock_key = %self.key, "lock already initialized");
            return Ok(InitOutcome::AlreadyInitialized);
        }
        self.release().map(InitOutcome::Released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_lock_key_without_environment() {
        assert_eq!(LockKey::for_environment(None).as_str(), "TF_MIGRATION_LOCK");
        assert_eq!(LockKey::for_environment(Some("")).as_str(), "TF_MIGRATION_LOCK");
    }

    #[test]
    fn test_lock_key_with_environment() {
        let snapshot = EnvSnapshot::from_pairs([("TF_ENV", "production")]);
        let key = LockKey::from_snapshot(&snapshot);
        assert_eq!(key.as_str(), "TF_MIGRATION_LOCK_production");
        assert_eq!(key.token_key("abc"), "TF_MIGRATION_LOCK_production_abc");
    }

    #[test]
    fn test_token_from_bytes_groups() {
        let bytes = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ];
        assert_eq!(
            LockToken::from_bytes(&bytes).as_str(),
            "00112233_4455_6677_8899_aabbccddeeff"
        );
    }

    #[test]
    fn test_generated_tokens_differ() {
        let a = LockToken::generate().unwrap();
        let b = LockToken::generate().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_release_writes_token_record_then_canonical_key() {
        let snapshot = EnvSnapshot::default();
        let store = MemoryStore::new();
        let token = LockManager::new(&snapshot, &store).release().unwrap();

        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries.get("TF_MIGRATION_LOCK").map(String::as_str),
            Some(token.as_str())
        );
        assert_eq!(
            entries
                .get(&format!("TF_MIGRATION_LOCK_{}", token))
                .map(String::as_str),
            Some(token.as_str())
        );
    }

    #[test]
    fn test_acquire_without_visible_token() {
        let snapshot = EnvSnapshot::default();
        let store = MemoryStore::new();
        let err = LockManager::new(&snapshot, &store).acquire().unwrap_err();
        assert_eq!(err, MigrateError::LockNotFound);
        assert!(store.is_empty());
    }

    #[test]
    fn test_initialize_skips_when_held() {
        let snapshot = EnvSnapshot::from_pairs([("TF_MIGRATION_LOCK", "t")]);
        let store = MemoryStore::new();
        let outcome = LockManager::new(&snapshot, &store).initialize().unwrap();
        assert_eq!(outcome, InitOutcome::AlreadyInitialized);
        assert!(store.is_empty());
    }

    #[test]
    fn test_initialize_releases_when_free() {
        let snapshot = EnvSnapshot::default();
        let store = MemoryStore::new();
        let outcome = LockManager::new(&snapshot, &store).initialize().unwrap();
        match outcome {
            InitOutcome::Released(token) => {
                assert_eq!(store.get("TF_MIGRATION_LOCK"), Some(token.to_string()))
            }
            other => panic!("expected release, got {:?}", other),
        }
    }
}
