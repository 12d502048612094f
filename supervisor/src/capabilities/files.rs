//! File capabilities backed by the shared [`ArtifactStore`].

use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{Capability, CapabilityHandle, parse_args};
use crate::artifacts::{ArtifactStore, Patch};
use crate::error::SupervisorError;

pub fn file_capabilities(store: &ArtifactStore) -> Vec<CapabilityHandle> {
    vec![
        Arc::new(ReadFile::new(store.clone())),
        Arc::new(WriteFile::new(store.clone())),
        Arc::new(EditFile::new(store.clone())),
    ]
}

#[derive(Debug, Deserialize)]
struct PathArgs {
    path: String,
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct EditArgs {
    path: String,
    #[serde(alias = "patch")]
    edits: Patch,
}

#[derive(Debug, Clone)]
pub struct ReadFile {
    store: ArtifactStore,
}

impl ReadFile {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }
}

impl Capability for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read an artifact. Args: {\"path\": string}."
    }

    fn invoke(&self, args: &Value) -> String {
        let args: PathArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(message) => return message,
        };
        self.store
            .read(&args.path)
            .unwrap_or_else(|err| format!("Error: {err}"))
    }
}

#[derive(Debug, Clone)]
pub struct WriteFile {
    store: ArtifactStore,
}

impl WriteFile {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }
}

impl Capability for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create or overwrite an artifact. Args: {\"path\": string, \"content\": string}."
    }

    fn invoke(&self, args: &Value) -> String {
        let args: WriteArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(message) => return message,
        };
        let receipt = self.store.write(&args.path, &args.content);
        json!(receipt).to_string()
    }
}

#[derive(Debug, Clone)]
pub struct EditFile {
    store: ArtifactStore,
}

impl EditFile {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }
}

impl Capability for EditFile {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Edit an existing artifact. Args: {\"path\": string, \"edits\": string | \
         [{\"find\": string, \"replace\": string}]}. Returns a unified diff."
    }

    fn invoke(&self, args: &Value) -> String {
        let args: EditArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(message) => return message,
        };
        match self.store.edit(&args.path, &args.edits) {
            Ok(receipt) => json!(receipt).to_string(),
            Err(err @ SupervisorError::NotFound(_)) => json!({ "error": err.to_string() }).to_string(),
            Err(err) => format!("Error: {err}"),
        }
    }
}
