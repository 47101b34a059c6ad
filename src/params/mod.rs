// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters for each stage of the pipeline.
//!
//! The code here "mirrors" the code within the `cli` module; `cli` is
//! unparsed, user-facing code, whereas parameters have been parsed and
//! validated and are ready to be run directly.

mod beam_map;
mod channel_map;
mod ephem_chrono;
mod gain_cal;
#[cfg(test)]
mod tests;
mod windows;

pub(crate) use beam_map::BeamMapParams;
pub(crate) use channel_map::ChannelMapParams;
pub(crate) use ephem_chrono::EphemChronoParams;
pub(crate) use gain_cal::{GainCalError, GainCalParams};
pub(crate) use windows::WindowsParams;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::PROGRESS_BARS;

/// A progress bar in the style used by every stage. Hidden unless progress
/// bars were requested.
fn progress_bar(len: usize, message: &'static str, units: &str) -> ProgressBar {
    let draw_target = if PROGRESS_BARS.load() {
        ProgressDrawTarget::stdout()
    } else {
        ProgressDrawTarget::hidden()
    };
    ProgressBar::with_draw_target(Some(len as u64), draw_target)
        .with_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{msg:17}}: [{{wide_bar:.blue}}] {{pos:2}}/{{len:2}} {units} ({{elapsed_precise}}<{{eta_precise}})"
                ))
                .unwrap()
                .progress_chars("=> "),
        )
        .with_position(0)
        .with_message(message)
}
