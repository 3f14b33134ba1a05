//! Writing emitted units to disk.
use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;

use crate::{compile::Unit, error::IlangResult};

/// Writes each unit to `<dir>/<name>.j`, creating the directory when
/// missing. Returns the written paths in unit order.
pub fn write_units(dir: impl AsRef<Path>, units: &[Unit]) -> IlangResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity(units.len());
    for unit in units {
        let path = dir.join(unit.file_name());
        fs::write(&path, unit.to_string())?;
        info!("wrote {}", path.display());
        paths.push(path);
    }

    Ok(paths)
}
