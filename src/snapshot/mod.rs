use crate::vehicle::Vehicle;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub mod config;


/// Supplies the full fleet snapshot.
///
/// Invoked once at startup; may be invoked again at any time to refresh
/// the whole snapshot.
pub trait SnapshotSource: Send + Sync {
    fn load(&self) -> Result<Vec<Vehicle>>;
}

/// Snapshot source backed by a JSON file holding an array of vehicles.
///
/// Files ending in `.gz` are gzip-decompressed first.
#[derive(Clone, Debug)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn load(&self) -> Result<Vec<Vehicle>> {
        load_vehicles_from_file(&self.path)
    }
}

/// Load a vehicle array from `.json` or gzip-compressed `.json.gz`
pub fn load_vehicles_from_file(path: &Path) -> Result<Vec<Vehicle>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open snapshot file {}", path.display()))?;

    let is_compressed = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let mut json = String::new();
    if is_compressed {
        GzDecoder::new(file)
            .read_to_string(&mut json)
            .context("Failed to decompress snapshot file")?;
    } else {
        let mut file = file;
        file.read_to_string(&mut json)
            .context("Failed to read snapshot file")?;
    }

    let vehicles: Vec<Vehicle> =
        serde_json::from_str(&json).context("Failed to deserialize snapshot JSON")?;

    Ok(vehicles)
}
