// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use log::info;

use crate::{
    io::{write_json, WriteOutputError},
    windows::ObservationWindow,
};

pub(crate) struct WindowsParams {
    pub(crate) windows: Vec<ObservationWindow>,

    /// If given, the windows are also written here as JSON.
    pub(crate) output: Option<PathBuf>,
}

impl WindowsParams {
    pub(crate) fn run(&self) -> Result<(), WriteOutputError> {
        for w in &self.windows {
            info!("{} {:.0} {:.0}", w.id, w.start_unix, w.end_unix);
        }
        if let Some(output) = &self.output {
            write_json(output, &self.windows)?;
            info!("Wrote {} windows to {}", self.windows.len(), output.display());
        }
        Ok(())
    }
}
