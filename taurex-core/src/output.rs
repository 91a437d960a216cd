//! Sinks that models and profiles write their description into.
//!
//! The on-disk formats live outside this crate. Writers only rely on the
//! [`Output`] trait: nested groups holding named strings, scalars and arrays.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A hierarchical output sink
pub trait Output {
    /// Create (or reopen) a named child group
    fn create_group(&mut self, name: &str) -> &mut dyn Output;

    fn write_string(&mut self, key: &str, value: &str);

    fn write_scalar(&mut self, key: &str, value: f64);

    fn write_array(&mut self, key: &str, values: &[f64]);
}

/// A value stored in a [`MemoryOutput`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputValue {
    String(String),
    Scalar(f64),
    Array(Vec<f64>),
    Group(MemoryOutput),
}

/// In-memory [`Output`] tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryOutput {
    entries: BTreeMap<String, OutputValue>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&OutputValue> {
        self.entries.get(key)
    }

    pub fn group(&self, name: &str) -> Option<&MemoryOutput> {
        match self.entries.get(name) {
            Some(OutputValue::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(OutputValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn scalar(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(OutputValue::Scalar(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn array(&self, key: &str) -> Option<&[f64]> {
        match self.entries.get(key) {
            Some(OutputValue::Array(values)) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

impl Output for MemoryOutput {
    fn create_group(&mut self, name: &str) -> &mut dyn Output {
        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| OutputValue::Group(MemoryOutput::new()));
        if !matches!(entry, OutputValue::Group(_)) {
            *entry = OutputValue::Group(MemoryOutput::new());
        }
        match entry {
            OutputValue::Group(group) => group,
            _ => unreachable!("entry was just replaced with a group"),
        }
    }

    fn write_string(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_string(), OutputValue::String(value.to_string()));
    }

    fn write_scalar(&mut self, key: &str, value: f64) {
        self.entries
            .insert(key.to_string(), OutputValue::Scalar(value));
    }

    fn write_array(&mut self, key: &str, values: &[f64]) {
        self.entries
            .insert(key.to_string(), OutputValue::Array(values.to_vec()));
    }
}
