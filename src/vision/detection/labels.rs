// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class names for the detector
//!
//! Ultralytics ONNX exports store names in the `names` metadata entry as a
//! Python dict literal, e.g. `{0: 'Holstein', 1: 'Jersey'}`.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

/// Mapping from class id to display name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassNames {
    names: BTreeMap<usize, String>,
}

impl ClassNames {
    /// Names listed in order, one per class id starting at 0
    pub fn from_list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .enumerate()
                .map(|(id, name)| (id, name.into()))
                .collect(),
        }
    }

    /// Parse the Ultralytics `names` metadata value
    pub fn parse_metadata(value: &str) -> Result<Self> {
        let pattern = Regex::new(r#"(\d+)\s*:\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")"#)
            .context("Failed to compile class name pattern")?;

        let mut names = BTreeMap::new();
        for caps in pattern.captures_iter(value) {
            let id: usize = caps[1]
                .parse()
                .with_context(|| format!("Invalid class id '{}'", &caps[1]))?;
            let name = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().replace("\\'", "'").replace("\\\"", "\""))
                .unwrap_or_default();
            names.insert(id, name);
        }

        if names.is_empty() && !value.trim().trim_matches(|c| c == '{' || c == '}').trim().is_empty() {
            bail!("Could not parse class names from model metadata: {}", value);
        }

        Ok(Self { names })
    }

    /// Load a labels file with one class name per line (blank lines ignored)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read labels file {}", path.display()))?;

        let names: Vec<&str> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if names.is_empty() {
            bail!("Labels file {} contains no class names", path.display());
        }

        Ok(Self::from_list(names))
    }

    /// Display name for a class id, `class_<id>` when unknown
    pub fn name(&self, class_id: usize) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
