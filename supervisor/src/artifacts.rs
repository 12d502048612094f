//! In-memory artifact store shared by the supervisor and its workers.
//!
//! Handles are cheap clones of one underlying map. The loop never holds a
//! live reference: it only receives [`ArtifactStore::snapshot`] copies.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use similar::TextDiff;
use tracing::debug;

use crate::error::SupervisorError;

/// One find/replace step; every occurrence of `find` is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub find: String,
    pub replace: String,
}

/// Edit payload: a literal full replacement, or ordered find/replace steps
/// applied to the current content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Patch {
    Replace(String),
    Edits(Vec<Replacement>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReceipt {
    pub path: String,
    pub bytes_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditReceipt {
    pub path: String,
    pub diff: String,
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    files: Arc<Mutex<BTreeMap<String, String>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read(&self, path: &str) -> Result<String, SupervisorError> {
        self.files()
            .get(path)
            .cloned()
            .ok_or_else(|| SupervisorError::NotFound(path.to_string()))
    }

    pub fn write(&self, path: &str, content: &str) -> WriteReceipt {
        self.files().insert(path.to_string(), content.to_string());
        debug!(path, bytes = content.len(), "artifact written");
        WriteReceipt {
            path: path.to_string(),
            bytes_written: content.len(),
        }
    }

    /// Apply `patch` to an existing artifact and return a unified diff of the
    /// change.
    pub fn edit(&self, path: &str, patch: &Patch) -> Result<EditReceipt, SupervisorError> {
        let mut files = self.files();
        let current = files
            .get_mut(path)
            .ok_or_else(|| SupervisorError::NotFound(path.to_string()))?;

        let old = current.clone();
        let new = match patch {
            Patch::Replace(content) => content.clone(),
            Patch::Edits(edits) => edits.iter().fold(old.clone(), |content, edit| {
                content.replace(&edit.find, &edit.replace)
            }),
        };
        *current = new.clone();
        drop(files);

        debug!(path, "artifact edited");
        Ok(EditReceipt {
            path: path.to_string(),
            diff: unified_diff(path, &old, &new),
        })
    }

    /// Value copy of every artifact. Mutating it never reaches the store.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.files().clone()
    }
}

fn unified_diff(path: &str, old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let old_header = format!("a/{path}");
    let new_header = format!("b/{path}");
    diff.unified_diff()
        .context_radius(3)
        .header(&old_header, &new_header)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let store = ArtifactStore::new();
        let receipt = store.write("notes.txt", "hello");
        assert_eq!(
            receipt,
            WriteReceipt {
                path: "notes.txt".to_string(),
                bytes_written: 5,
            }
        );
        assert_eq!(store.read("notes.txt").expect("read"), "hello");
    }

    #[test]
    fn read_missing_is_not_found() {
        let store = ArtifactStore::new();
        assert_eq!(
            store.read("missing.txt"),
            Err(SupervisorError::NotFound("missing.txt".to_string()))
        );
    }

    #[test]
    fn snapshot_mutation_never_reaches_store() {
        let store = ArtifactStore::new();
        store.write("a", "A");

        let mut snapshot = store.snapshot();
        snapshot.insert("a".to_string(), "changed".to_string());
        snapshot.insert("b".to_string(), "B".to_string());

        assert_eq!(store.read("a").expect("read"), "A");
        assert!(store.read("b").is_err());
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn clones_share_the_same_files() {
        let store = ArtifactStore::new();
        let handle = store.clone();
        handle.write("a", "A");
        assert_eq!(store.read("a").expect("read"), "A");
    }

    #[test]
    fn edits_apply_sequentially_to_current_content() {
        let store = ArtifactStore::new();
        store.write("doc.txt", "Hello World");

        let receipt = store
            .edit(
                "doc.txt",
                &Patch::Edits(vec![
                    Replacement {
                        find: "World".to_string(),
                        replace: "Rust".to_string(),
                    },
                    Replacement {
                        find: "Rust".to_string(),
                        replace: "Rustaceans".to_string(),
                    },
                ]),
            )
            .expect("edit");

        assert_eq!(store.read("doc.txt").expect("read"), "Hello Rustaceans");
        assert!(receipt.diff.contains("-Hello World"));
        assert!(receipt.diff.contains("+Hello Rustaceans"));
    }

    #[test]
    fn literal_patch_replaces_whole_content() {
        let store = ArtifactStore::new();
        store.write("doc.txt", "old content");
        store
            .edit("doc.txt", &Patch::Replace("new content".to_string()))
            .expect("edit");
        assert_eq!(store.read("doc.txt").expect("read"), "new content");
    }

    #[test]
    fn edit_of_unwritten_path_is_not_found() {
        let store = ArtifactStore::new();
        let err = store
            .edit("ghost.txt", &Patch::Replace("x".to_string()))
            .expect_err("missing");
        assert_eq!(err, SupervisorError::NotFound("ghost.txt".to_string()));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn patch_deserializes_from_string_or_list() {
        let literal: Patch = serde_json::from_str("\"full\"").expect("literal");
        assert_eq!(literal, Patch::Replace("full".to_string()));
        let edits: Patch =
            serde_json::from_str(r#"[{"find":"a","replace":"b"}]"#).expect("edits");
        assert!(matches!(edits, Patch::Edits(ref list) if list.len() == 1));
    }
}
