//! Circuit metadata lookup
//!
//! Resolves the biological reference dataset for a validation task from the
//! circuit's bioname directory:
//!
//! 1. `BioName <dir>` line in the circuit config, else `<config dir>/bioname`
//! 2. `<bioname>/s2f.yaml`
//! 3. `<task>.bio_data` in that descriptor

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the s2f descriptor inside the bioname directory.
pub const S2F_DESCRIPTOR: &str = "s2f.yaml";

/// Outcome of a reference dataset lookup. The caller decides whether
/// `Unresolved` is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceLookup {
    Resolved(PathBuf),
    Unresolved(String),
}

impl ReferenceLookup {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ReferenceLookup::Resolved(path) => Some(path),
            ReferenceLookup::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for ReferenceLookup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReferenceLookup::Resolved(path) => write!(f, "resolved to {}", path.display()),
            ReferenceLookup::Unresolved(reason) => write!(f, "unresolved: {}", reason),
        }
    }
}

/// Bioname directory declared by (or implied for) a circuit config.
pub fn bioname_dir(circuit_config: &Path) -> std::io::Result<PathBuf> {
    let text = fs::read_to_string(circuit_config)?;
    Ok(bioname_from_config(&text).unwrap_or_else(|| {
        circuit_config
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join("bioname")
    }))
}

fn bioname_from_config(text: &str) -> Option<PathBuf> {
    text.lines().find_map(|line| {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["BioName", dir] => Some(PathBuf::from(*dir)),
            _ => None,
        }
    })
}

/// Look up `<task>.bio_data` for a circuit.
pub fn lookup_reference(circuit_config: &Path, task: &str) -> ReferenceLookup {
    let bioname = match bioname_dir(circuit_config) {
        Ok(dir) => dir,
        Err(e) => {
            return ReferenceLookup::Unresolved(format!(
                "cannot read circuit config {}: {}",
                circuit_config.display(),
                e
            ))
        }
    };

    let descriptor = bioname.join(S2F_DESCRIPTOR);
    let text = match fs::read_to_string(&descriptor) {
        Ok(text) => text,
        Err(e) => {
            return ReferenceLookup::Unresolved(format!(
                "cannot read {}: {}",
                descriptor.display(),
                e
            ))
        }
    };

    let tasks: serde_yaml::Value = match serde_yaml::from_str(&text) {
        Ok(tasks) => tasks,
        Err(e) => {
            return ReferenceLookup::Unresolved(format!(
                "cannot parse {}: {}",
                descriptor.display(),
                e
            ))
        }
    };

    let bio_data = tasks
        .get(task)
        .and_then(|entry| entry.get("bio_data"))
        .and_then(serde_yaml::Value::as_str);
    match bio_data {
        Some(path) => {
            tracing::debug!("Reference for {} found in {}", task, descriptor.display());
            ReferenceLookup::Resolved(PathBuf::from(path))
        }
        None => ReferenceLookup::Unresolved(format!(
            "{} has no {}.bio_data entry",
            descriptor.display(),
            task
        )),
    }
}
