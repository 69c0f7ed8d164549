use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    writer: String,
}

/// Request-scoped key/value state shared by pipeline steps and agents.
///
/// Keys are never removed. A key belongs to the step that first wrote it;
/// that step may overwrite it, any other step is refused.
#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
    entries: BTreeMap<String, Slot>,
}

impl WorkflowContext {
    /// Create an empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `key` on behalf of `writer`
    pub fn insert(
        &mut self,
        writer: &str,
        key: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        let key = key.into();
        self.check_writable(writer, &key)?;
        self.entries.insert(
            key,
            Slot {
                value,
                writer: writer.to_string(),
            },
        );
        Ok(())
    }

    /// Write every entry on behalf of `writer`, or none of them.
    ///
    /// All keys are checked before the first write, so a refused entry
    /// leaves the context untouched.
    pub fn merge(&mut self, writer: &str, entries: Vec<(String, Value)>) -> Result<()> {
        for (key, _) in &entries {
            self.check_writable(writer, key)?;
        }
        for (key, value) in entries {
            self.entries.insert(
                key,
                Slot {
                    value,
                    writer: writer.to_string(),
                },
            );
        }
        Ok(())
    }

    fn check_writable(&self, writer: &str, key: &str) -> Result<()> {
        match self.entries.get(key) {
            Some(existing) if existing.writer != writer => Err(Error::Fatal(format!(
                "step '{writer}' cannot overwrite '{key}' written by '{}'",
                existing.writer
            ))),
            _ => Ok(()),
        }
    }

    /// Value stored under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// String value stored under `key`
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Step that wrote `key`
    #[must_use]
    pub fn writer(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|slot| slot.writer.as_str())
    }

    /// Check if `key` has been written
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as a JSON object
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, slot)| (k.clone(), slot.value.clone()))
            .collect();
        Value::Object(map)
    }
}
