use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Manifest key holding the list of packages excluded from auto-discovery
pub const DONT_DISCOVER_KEY: &str = "dont-discover";

/// Errors raised when an edit targets a manifest key that already holds an
/// incompatible shape
#[derive(Debug, Error)]
pub enum SectionError {
    #[error("manifest key `{path}` exists but is not an object")]
    NotAnObject { path: String },

    #[error("manifest key `{path}` exists but is neither a list nor a string")]
    NotAList { path: String },
}

/// Typed view of `composer.json`.
///
/// Only the sections this tool edits are modeled; every other top-level key
/// round-trips untouched through `rest`.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require: Option<BTreeMap<String, String>>,

    #[serde(
        default,
        rename = "require-dev",
        skip_serializing_if = "Option::is_none"
    )]
    pub require_dev: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Manifest {
    /// Remove a package entry from whichever of `require` / `require-dev`
    /// holds it. Returns whether anything was removed; a missing key is a
    /// no-op, never an error.
    pub fn remove_requirement(&mut self, package: &str) -> bool {
        for section in [&mut self.require, &mut self.require_dev] {
            if let Some(map) = section {
                if map.remove(package).is_some() {
                    return true;
                }
            }
        }
        false
    }

    /// Dedup-merge `packages` into `extra.<namespace>.dont-discover`,
    /// creating missing intermediate objects.
    ///
    /// # Errors
    ///
    /// Returns an error if an intermediate key or the list key already holds
    /// an incompatible value.
    pub fn add_dont_discover(
        &mut self,
        namespace: &str,
        packages: &[String],
    ) -> Result<(), SectionError> {
        let extra = self.extra.get_or_insert_with(Map::new);
        let section = ensure_nested_object(extra, &[namespace])?;
        let existing = take_list(section, DONT_DISCOVER_KEY)?;
        let merged = merge_unique_ordered(
            existing,
            packages.iter().map(|package| Value::String(package.clone())),
        );
        section.insert(DONT_DISCOVER_KEY.to_string(), Value::Array(merged));
        Ok(())
    }

    /// Dedup-merge a command string into the `scripts.<hook>` list, creating
    /// the hook if missing. A hook that currently holds a single command
    /// string is treated as a one-element list.
    ///
    /// # Errors
    ///
    /// Returns an error if the hook key already holds an incompatible value.
    pub fn add_script(&mut self, hook: &str, command: &str) -> Result<(), SectionError> {
        let scripts = self.scripts.get_or_insert_with(Map::new);
        let existing = take_list(scripts, hook)?;
        let merged = merge_unique_ordered(
            existing,
            std::iter::once(Value::String(command.to_string())),
        );
        scripts.insert(hook.to_string(), Value::Array(merged));
        Ok(())
    }
}

/// Walk `root` along `path`, creating an empty object for every missing
/// intermediate key, and return the innermost object. Idempotent: a second
/// call with the same path changes nothing.
///
/// # Errors
///
/// Returns an error if an intermediate key exists but holds a non-object.
pub fn ensure_nested_object<'m>(
    root: &'m mut Map<String, Value>,
    path: &[&str],
) -> Result<&'m mut Map<String, Value>, SectionError> {
    let mut current = root;
    for (depth, key) in path.iter().enumerate() {
        let entry = current
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(map) => map,
            _ => {
                return Err(SectionError::NotAnObject {
                    path: path[..=depth].join("."),
                });
            }
        };
    }
    Ok(current)
}

/// Append each item of `new_items` to `existing` unless already present,
/// keeping the original order and the relative order of appended items.
/// Idempotent: merging the same items twice equals merging them once.
#[must_use]
pub fn merge_unique_ordered(
    existing: Vec<Value>,
    new_items: impl IntoIterator<Item = Value>,
) -> Vec<Value> {
    let mut merged = existing;
    for item in new_items {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    merged
}

/// Take the list stored at `key` out of `map`. A missing key yields an empty
/// list and a bare string is wrapped into a one-element list.
fn take_list(map: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>, SectionError> {
    match map.remove(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(Value::String(single)) => Ok(vec![Value::String(single)]),
        Some(other) => {
            map.insert(key.to_string(), other);
            Err(SectionError::NotAList {
                path: key.to_string(),
            })
        }
    }
}
