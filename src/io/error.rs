// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading and writing files.

use std::path::PathBuf;

use thiserror::Error;

use crate::healpix::HealpixError;

#[derive(Error, Debug)]
pub enum ReadInputError {
    #[error("File '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("Couldn't read '{}': {err}", .path.display())]
    Io { path: PathBuf, err: std::io::Error },

    #[error("Couldn't parse '{}' as JSON: {err}", .path.display())]
    Json {
        path: PathBuf,
        err: serde_json::Error,
    },

    #[error("Couldn't read npz file '{}': {err}", .path.display())]
    Npz { path: PathBuf, err: String },

    #[error("Couldn't read npy file '{}': {err}", .path.display())]
    Npy { path: PathBuf, err: String },

    #[error("'{}' has no array named '{key}'", .path.display())]
    MissingKey { path: PathBuf, key: String },

    #[error("Arrays in '{}' have inconsistent shapes: {what}", .path.display())]
    ShapeMismatch { path: PathBuf, what: String },

    #[error("Beam model '{}' doesn't suit the healpix grid: {err}", .path.display())]
    Healpix { path: PathBuf, err: HealpixError },

    #[error("Couldn't glob '{glob}': {err}")]
    Glob { glob: String, err: String },
}

impl ReadInputError {
    /// Is this error only due to the file not existing? Missing inputs are
    /// expected when data is sparse.
    pub fn is_missing(&self) -> bool {
        matches!(self, ReadInputError::NotFound(_))
    }
}

#[derive(Error, Debug)]
pub enum WriteOutputError {
    #[error("Couldn't write to '{}': {err}", .path.display())]
    Io { path: PathBuf, err: std::io::Error },

    #[error("Couldn't serialise '{}' as JSON: {err}", .path.display())]
    Json {
        path: PathBuf,
        err: serde_json::Error,
    },

    #[error("Couldn't write npy file '{}': {err}", .path.display())]
    Npy { path: PathBuf, err: String },
}
