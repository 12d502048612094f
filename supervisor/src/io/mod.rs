//! I/O helpers for the supervisor: configuration, child processes, prompts,
//! command-backed oracles and run reports.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub mod config;
pub mod oracle;
pub mod process;
pub mod prompt;
pub mod report;

/// Write `contents` to `path` via a sibling temp file and rename.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut tmp_name = path
        .file_name()
        .map(OsString::from)
        .with_context(|| format!("path has no file name {}", path.display()))?;
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parents_and_leaves_no_temp() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested/dir/out.json");
        write_atomic(&path, "{}").expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "{}");
        assert!(!temp.path().join("nested/dir/out.json.tmp").exists());
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("out.txt");
        write_atomic(&path, "first").expect("first");
        write_atomic(&path, "second").expect("second");
        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
    }
}
