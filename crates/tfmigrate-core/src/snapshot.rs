//! Local view of the environment
//!
//! CircleCI materializes project environment variables into the job before
//! the binary starts. The lock value and the ledger version are read from
//! that view exactly once, at startup, and never re-fetched: writes made
//! during the run go to the remote store only.

use std::collections::BTreeMap;
use std::fmt;

/// Immutable snapshot of environment variables taken at process start
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn from_env() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    /// Build a snapshot from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a variable, treating an empty value as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

// Values include CIRCLE_TOKEN; only names are printed.
impl fmt::Debug for EnvSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvSnapshot")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_value_reads_as_unset() {
        let snapshot = EnvSnapshot::from_pairs([("TF_ENV", ""), ("TF_MIGRATION_VERSION", "3")]);
        assert_eq!(snapshot.get("TF_ENV"), None);
        assert_eq!(snapshot.get("TF_MIGRATION_VERSION"), Some("3"));
        assert_eq!(snapshot.get("MISSING"), None);
    }

    #[test]
    fn test_from_env_sees_process_variables() {
        std::env::set_var("TFMIGRATE_SNAPSHOT_PROBE", "present");
        let snapshot = EnvSnapshot::from_env();
        assert_eq!(snapshot.get("TFMIGRATE_SNAPSHOT_PROBE"), Some("present"));
        std::env::remove_var("TFMIGRATE_SNAPSHOT_PROBE");
    }

    #[test]
    fn test_snapshot_does_not_follow_later_changes() {
        std::env::set_var("TFMIGRATE_SNAPSHOT_FROZEN", "before");
        let snapshot = EnvSnapshot::from_env();
        std::env::set_var("TFMIGRATE_SNAPSHOT_FROZEN", "after");
        assert_eq!(snapshot.get("TFMIGRATE_SNAPSHOT_FROZEN"), Some("before"));
        std::env::remove_var("TFMIGRATE_SNAPSHOT_FROZEN");
    }

    #[test]
    fn test_debug_hides_values() {
        let snapshot = EnvSnapshot::from_pairs([("CIRCLE_TOKEN", "t0k-secret")]);
        let rendered = format!("{:?}", snapshot);
        assert!(rendered.contains("CIRCLE_TOKEN"));
        assert!(!rendered.contains("t0k-secret"));
    }
}
