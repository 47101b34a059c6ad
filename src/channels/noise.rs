// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

use crate::math::{mad, median, std_dev};

/// The noise level of a trace.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseFloor {
    /// The median power of the noise-only channels \[dBm\].
    pub median: f64,

    /// The noise threshold, relative to `median` \[dB\].
    pub threshold: f64,

    /// The trace with `median` subtracted, so the noise sits at zero.
    pub shifted: Array2<f64>,
}

impl NoiseFloor {
    /// Channels whose peak is less than `sat_thresh` standard deviations above
    /// the median of the whole trace are assumed to contain only noise. The
    /// median and MAD of all of their samples set the threshold `noi_thresh`
    /// MADs above the median.
    pub fn compute(
        power: ArrayView2<f64>,
        sat_thresh: f64,
        noi_thresh: f64,
    ) -> Result<NoiseFloor, NoiseFloorError> {
        let sigma = std_dev(power.iter().filter(|p| p.is_finite()))
            .ok_or(NoiseFloorError::EmptyTrace)?;
        let all: Vec<f64> = power.iter().copied().collect();
        let trace_median = median(&all).ok_or(NoiseFloorError::EmptyTrace)?;
        let sat_cut = trace_median + sat_thresh * sigma;

        let mut noise = vec![];
        for column in power.columns() {
            let peak = column
                .iter()
                .copied()
                .filter(|p| !p.is_nan())
                .fold(f64::NEG_INFINITY, f64::max);
            if peak < sat_cut {
                noise.extend(column.iter().copied());
            }
        }

        let (median, mad) = match (median(&noise), mad(&noise)) {
            (Some(median), Some(mad)) => (median, mad),
            _ => return Err(NoiseFloorError::NoNoiseChannels { sat_cut }),
        };

        Ok(NoiseFloor {
            median,
            threshold: noi_thresh * mad,
            shifted: power.mapv(|p| p - median),
        })
    }

    /// The noise threshold in the trace's own units \[dBm\].
    pub fn absolute_threshold(&self) -> f64 {
        self.median + self.threshold
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum NoiseFloorError {
    #[error("The power trace is empty")]
    EmptyTrace,

    #[error("Every channel peaks above {sat_cut:.2} dBm; there are no noise-only channels")]
    NoNoiseChannels { sat_cut: f64 },
}
