//! Reading stop lists and fix traces from disk.

use std::io::{self, BufReader};

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use courier_core::{PositionFix, Stop};
use serde::de::DeserializeOwned;

use crate::CliError;

/// Check that `path` names an existing regular file.
pub(crate) fn require_file(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load a JSON array of stops.
pub(crate) fn load_stops(path: &Utf8Path, field: &'static str) -> Result<Vec<Stop>, CliError> {
    load_json(path, field)
}

/// Load a JSON array of position fixes.
pub(crate) fn load_fixes(
    path: &Utf8Path,
    field: &'static str,
) -> Result<Vec<PositionFix>, CliError> {
    load_json(path, field)
}

fn load_json<T: DeserializeOwned>(path: &Utf8Path, field: &'static str) -> Result<T, CliError> {
    let file = fs_utf8::File::open_ambient(path, ambient_authority()).map_err(|source| {
        CliError::OpenInput {
            field,
            path: path.to_path_buf(),
            source,
        }
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseInput {
        field,
        path: path.to_path_buf(),
        source,
    })
}

fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "path has no file name"))?;
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.metadata(name).map(|meta| meta.is_file())
}
