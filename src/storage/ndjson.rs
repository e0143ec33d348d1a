//! NDJSON (Newline Delimited JSON) file operations

use crate::etl::{Extractor, Loader};
use crate::ticker::TickerRecord;

use eyre::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Read NDJSON from a file
pub struct NdjsonReader {
    path: PathBuf,
}

impl NdjsonReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read all non-empty lines as `T`
    pub fn read<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read NDJSON file: {}", self.path.display()))?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).with_context(|| {
                    format!("Failed to parse line {} of {}", i + 1, self.path.display())
                })
            })
            .collect()
    }
}

// Snapshots written by `fetch` load back as ticker records

impl Extractor for NdjsonReader {
    type Item = TickerRecord;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        let records: Vec<TickerRecord> = self.read()?;
        log::info!(
            "Read {} ticker(s) from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }
}

/// Write NDJSON to a file
pub struct NdjsonWriter {
    path: PathBuf,
}

impl NdjsonWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write items as NDJSON, replacing the file
    pub fn write<T: Serialize>(&self, items: &[T]) -> Result<()> {
        let ndjson = items
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?
            .join("\n");

        // Add trailing newline
        let content = if ndjson.is_empty() {
            String::new()
        } else {
            format!("{}\n", ndjson)
        };

        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write NDJSON file: {}", self.path.display()))?;

        Ok(())
    }
}

impl Loader for NdjsonWriter {
    type Item = TickerRecord;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        self.write(&items)?;
        log::info!("Wrote {} ticker(s) to {}", items.len(), self.path.display());
        Ok(items.len())
    }
}
