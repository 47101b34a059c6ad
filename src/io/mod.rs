// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! File stuff (reading/writing, globs) for aligned power data, ephemerides,
//! beam models and outputs.

mod aligned;
mod error;
mod models;
#[cfg(test)]
mod tests;

pub use aligned::{aligned_path, AlignedPair, AlignedTrace};
pub use error::{ReadInputError, WriteOutputError};
pub use models::BeamModels;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use ndarray::{Array, Array1, Dimension};
use ndarray_npy::{NpzReader, ReadNpyExt, WriteNpyExt};
use serde::{de::DeserializeOwned, Serialize};

fn open(path: &Path) -> Result<File, ReadInputError> {
    File::open(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ReadInputError::NotFound(path.to_path_buf())
        } else {
            ReadInputError::Io {
                path: path.to_path_buf(),
                err,
            }
        }
    })
}

/// Deserialise a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ReadInputError> {
    let f = open(path)?;
    serde_json::from_reader(BufReader::new(f)).map_err(|err| ReadInputError::Json {
        path: path.to_path_buf(),
        err,
    })
}

/// Deserialise a gzip-compressed JSON file.
pub fn read_json_gz<T: DeserializeOwned>(path: &Path) -> Result<T, ReadInputError> {
    let f = open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(f));
    let mut decompressed = vec![];
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|err| ReadInputError::Io {
            path: path.to_path_buf(),
            err,
        })?;
    serde_json::from_slice(&decompressed).map_err(|err| ReadInputError::Json {
        path: path.to_path_buf(),
        err,
    })
}

fn create(path: &Path) -> Result<BufWriter<File>, WriteOutputError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| WriteOutputError::Io {
            path: parent.to_path_buf(),
            err,
        })?;
    }
    let f = File::create(path).map_err(|err| WriteOutputError::Io {
        path: path.to_path_buf(),
        err,
    })?;
    Ok(BufWriter::new(f))
}

/// Serialise to a JSON file, creating any missing parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), WriteOutputError> {
    let mut w = create(path)?;
    serde_json::to_writer(&mut w, value).map_err(|err| WriteOutputError::Json {
        path: path.to_path_buf(),
        err,
    })?;
    w.flush().map_err(|err| WriteOutputError::Io {
        path: path.to_path_buf(),
        err,
    })
}

/// Serialise to a gzip-compressed JSON file.
pub fn write_json_gz<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), WriteOutputError> {
    let w = create(path)?;
    let mut encoder = GzEncoder::new(w, Compression::default());
    serde_json::to_writer(&mut encoder, value).map_err(|err| WriteOutputError::Json {
        path: path.to_path_buf(),
        err,
    })?;
    encoder
        .finish()
        .and_then(|mut w| w.flush())
        .map_err(|err| WriteOutputError::Io {
            path: path.to_path_buf(),
            err,
        })
}

/// Read a one-dimensional npy array.
pub(crate) fn read_npy_1d(path: &Path) -> Result<Array1<f64>, ReadInputError> {
    let f = open(path)?;
    Array1::<f64>::read_npy(BufReader::new(f)).map_err(|e| ReadInputError::Npy {
        path: path.to_path_buf(),
        err: e.to_string(),
    })
}

/// Write a one-dimensional npy array.
pub(crate) fn write_npy_1d(path: &Path, array: &Array1<f64>) -> Result<(), WriteOutputError> {
    let mut w = create(path)?;
    array.write_npy(&mut w).map_err(|e| WriteOutputError::Npy {
        path: path.to_path_buf(),
        err: e.to_string(),
    })?;
    w.flush().map_err(|err| WriteOutputError::Io {
        path: path.to_path_buf(),
        err,
    })
}

/// Given a glob pattern, get all of the matches from the filesystem, sorted.
pub(crate) fn get_all_matches_from_glob(g: &str) -> Result<Vec<PathBuf>, ReadInputError> {
    let pattern = glob::glob(g).map_err(|e| ReadInputError::Glob {
        glob: g.to_string(),
        err: e.to_string(),
    })?;
    let mut entries = vec![];
    for entry in pattern {
        match entry {
            Ok(e) => entries.push(e),
            Err(e) => {
                return Err(ReadInputError::Glob {
                    glob: g.to_string(),
                    err: e.to_string(),
                })
            }
        }
    }
    entries.sort();
    Ok(entries)
}

/// Read an array out of an npz archive. Archived arrays usually carry a `.npy`
/// suffix; names with or without it are accepted.
fn read_npz_array<R, D>(
    npz: &mut NpzReader<R>,
    path: &Path,
    name: &str,
) -> Result<Array<f64, D>, ReadInputError>
where
    R: Read + Seek,
    D: Dimension,
{
    let names = npz.names().map_err(|e| ReadInputError::Npz {
        path: path.to_path_buf(),
        err: e.to_string(),
    })?;
    let with_suffix = format!("{name}.npy");
    let key = if names.iter().any(|n| n == name) {
        name
    } else if names.iter().any(|n| n == &with_suffix) {
        with_suffix.as_str()
    } else {
        return Err(ReadInputError::MissingKey {
            path: path.to_path_buf(),
            key: name.to_string(),
        });
    };
    npz.by_name(key).map_err(|e| ReadInputError::Npz {
        path: path.to_path_buf(),
        err: format!("{key}: {e}"),
    })
}

/// Does an npz archive contain the named array?
fn npz_has<R: Read + Seek>(npz: &mut NpzReader<R>, name: &str) -> bool {
    let with_suffix = format!("{name}.npy");
    npz.names()
        .map(|names| names.iter().any(|n| n == name || n == &with_suffix))
        .unwrap_or(false)
}

fn open_npz(path: &Path) -> Result<NpzReader<File>, ReadInputError> {
    NpzReader::new(open(path)?).map_err(|e| ReadInputError::Npz {
        path: path.to_path_buf(),
        err: e.to_string(),
    })
}
