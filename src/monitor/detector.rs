//! Change detection.
//!
//! Classifies one freshly extracted text against the last stored snapshot:
//! - first-observation: nothing stored yet; store, do not notify
//! - unchanged: exact match after normalization; store nothing
//! - changed: anything else; store, then notify
//!
//! Comparison is exact string equality over normalized visible text. No
//! fuzzy matching: extraction already strips markup, scripts and styles,
//! so only reader-visible changes reach this point.

use tracing::warn;

use crate::store::{self, SnapshotStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    FirstObservation,
    Unchanged,
    Changed,
}

/// Pure classification of current text against the previous snapshot.
pub fn evaluate(previous: Option<&str>, current: &str) -> Outcome {
    match previous {
        None => Outcome::FirstObservation,
        Some(prev) if prev == current => Outcome::Unchanged,
        Some(_) => Outcome::Changed,
    }
}

/// Runs one detection step for a target: reads the last snapshot,
/// classifies, and persists when the content is new or changed.
///
/// A read failure is logged and treated as never-observed; worst case is a
/// duplicate notification on the next cycle, which beats halting the
/// monitor on a corrupt row. A write failure is logged but the outcome
/// stands, so a detected change still notifies even if persistence failed.
pub fn apply(store: &mut dyn SnapshotStore, url: &str, current: &str) -> Outcome {
    let key = store::target_key(url);

    let previous = match store.most_recent(&key) {
        Ok(previous) => previous,
        Err(e) => {
            warn!(url, error = %e, "failed to read last snapshot, treating target as never observed");
            None
        }
    };

    let outcome = evaluate(previous.as_ref().map(|s| s.content.as_str()), current);

    match outcome {
        Outcome::FirstObservation | Outcome::Changed => {
            if let Err(e) = store.append(&key, url, current) {
                warn!(url, error = %e, "failed to persist snapshot");
            }
        }
        Outcome::Unchanged => {}
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::store::{Snapshot, Store};

    #[test]
    fn absent_previous_is_first_observation() {
        assert_eq!(evaluate(None, "Hello"), Outcome::FirstObservation);
    }

    #[test]
    fn identical_text_is_unchanged() {
        assert_eq!(evaluate(Some("Hello"), "Hello"), Outcome::Unchanged);
    }

    #[test]
    fn any_difference_is_a_change() {
        assert_eq!(evaluate(Some("Hello"), "Hello World"), Outcome::Changed);
        assert_eq!(evaluate(Some("Hello"), "hello"), Outcome::Changed);
        assert_eq!(evaluate(Some("price: 10"), "price: 11"), Outcome::Changed);
    }

    #[test]
    fn empty_strings_compare_exactly() {
        assert_eq!(evaluate(Some(""), ""), Outcome::Unchanged);
        assert_eq!(evaluate(Some(""), "x"), Outcome::Changed);
    }

    #[test]
    fn apply_stores_on_first_observation_and_change_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(&dir.path().join("vigil.db")).unwrap();
        let url = "https://example.com/a";
        let key = store::target_key(url);

        assert_eq!(apply(&mut store, url, "Hello"), Outcome::FirstObservation);
        assert_eq!(store.list(Some(&key)).unwrap().len(), 1);

        assert_eq!(apply(&mut store, url, "Hello"), Outcome::Unchanged);
        assert_eq!(store.list(Some(&key)).unwrap().len(), 1);

        assert_eq!(apply(&mut store, url, "Hello World"), Outcome::Changed);
        assert_eq!(store.list(Some(&key)).unwrap().len(), 2);
        assert_eq!(
            store.most_recent(&key).unwrap().unwrap().content,
            "Hello World"
        );
    }

    /// In-memory store with switchable failure modes for the degraded paths.
    struct FlakyStore {
        rows: Vec<Snapshot>,
        fail_reads: bool,
        fail_appends: bool,
    }

    impl FlakyStore {
        fn seeded(url: &str, content: &str) -> Self {
            FlakyStore {
                rows: vec![Snapshot {
                    id: 1,
                    target_key: store::target_key(url),
                    url: url.to_string(),
                    captured_ms: 1_000,
                    content: content.to_string(),
                }],
                fail_reads: false,
                fail_appends: false,
            }
        }
    }

    fn disk_failure() -> StorageError {
        StorageError::Io {
            path: "/nowhere/vigil.db".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
        }
    }

    impl SnapshotStore for FlakyStore {
        fn most_recent(&self, key: &str) -> Result<Option<Snapshot>, StorageError> {
            if self.fail_reads {
                return Err(disk_failure());
            }
            Ok(self.rows.iter().rev().find(|s| s.target_key == key).cloned())
        }

        fn append(&mut self, key: &str, url: &str, content: &str) -> Result<Snapshot, StorageError> {
            if self.fail_appends {
                return Err(disk_failure());
            }
            let snapshot = Snapshot {
                id: self.rows.len() as i64 + 1,
                target_key: key.to_string(),
                url: url.to_string(),
                captured_ms: self.rows.len() as i64 + 1_000,
                content: content.to_string(),
            };
            self.rows.push(snapshot.clone());
            Ok(snapshot)
        }

        fn prune(&mut self, _key: &str, _keep: usize) -> Result<usize, StorageError> {
            Ok(0)
        }
    }

    #[test]
    fn read_failure_is_treated_as_never_observed() {
        let url = "https://example.com/a";
        let mut store = FlakyStore::seeded(url, "Hello");
        store.fail_reads = true;

        // the stored row is unreadable, so identical content classifies as
        // a first observation and a fresh snapshot is written
        assert_eq!(apply(&mut store, url, "Hello"), Outcome::FirstObservation);
        assert_eq!(store.rows.len(), 2);
    }

    #[test]
    fn append_failure_does_not_change_the_outcome() {
        let url = "https://example.com/a";
        let mut store = FlakyStore::seeded(url, "Hello");
        store.fail_appends = true;

        assert_eq!(apply(&mut store, url, "Hello World"), Outcome::Changed);
        assert_eq!(store.rows.len(), 1);
    }

    #[test]
    fn append_failure_on_first_observation_keeps_the_outcome() {
        let url = "https://example.com/new";
        let mut store = FlakyStore {
            rows: Vec::new(),
            fail_reads: false,
            fail_appends: true,
        };

        assert_eq!(apply(&mut store, url, "Hello"), Outcome::FirstObservation);
        assert!(store.rows.is_empty());
    }
}
