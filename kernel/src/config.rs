//! Run configuration and the named partition-size presets.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::SimError;
use crate::partition::PARTITION_COUNT;
use crate::policy::Algorithm;

/// Everything the engine needs besides the process list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimConfig {
    pub algorithm: Algorithm,
    /// `None` runs without memory management: admission is unconditional.
    pub partitions: Option<[usize; PARTITION_COUNT]>,
}

impl SimConfig {
    pub fn scheduler(algorithm: Algorithm) -> SimConfig {
        SimConfig {
            algorithm,
            partitions: None,
        }
    }

    pub fn memory(partitions: [usize; PARTITION_COUNT]) -> SimConfig {
        SimConfig {
            algorithm: Algorithm::Fcfs,
            partitions: Some(partitions),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> SimConfig {
        self.algorithm = algorithm;
        self
    }
}

#[derive(Debug, Deserialize)]
struct PresetFile {
    #[serde(default)]
    presets: BTreeMap<String, PresetEntry>,
}

#[derive(Debug, Deserialize)]
struct PresetEntry {
    partitions: Vec<usize>,
}

/// Named partition capacity tables.
#[derive(Debug, Clone)]
pub struct PresetTable {
    presets: BTreeMap<String, [usize; PARTITION_COUNT]>,
}

impl PresetTable {
    pub fn builtin() -> PresetTable {
        let mut presets = BTreeMap::new();
        presets.insert("size1".to_string(), [500, 250, 150, 100]);
        presets.insert("size2".to_string(), [300, 300, 350, 50]);
        PresetTable { presets }
    }

    /// Adds (or overrides) presets from TOML text of the form
    /// `[presets.<name>] partitions = [a, b, c, d]`.
    pub fn merge_toml(&mut self, text: &str) -> Result<(), SimError> {
        let file: PresetFile = toml::from_str(text)
            .map_err(|e| SimError::Config(e.to_string()))?;
        for (name, entry) in file.presets {
            let sizes: [usize; PARTITION_COUNT] =
                entry.partitions.as_slice().try_into().map_err(|_| {
                    SimError::Config(format!(
                        "preset '{}' lists {} partitions, expected {}",
                        name,
                        entry.partitions.len(),
                        PARTITION_COUNT
                    ))
                })?;
            self.presets.insert(name, sizes);
        }
        Ok(())
    }

    pub fn load(&mut self, path: &Path) -> Result<(), SimError> {
        let text = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        self.merge_toml(&text)
    }

    pub fn get(&self, name: &str) -> Result<[usize; PARTITION_COUNT], SimError> {
        self.presets
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownPreset(name.to_string()))
    }
}
