// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use wellcp_core::{EventKind, SignalMatrix, WcpError};

/// Peak multiplier of the time ramp.
pub const WEIGHT_GAIN: f64 = 10.0;

/// Linear ramp over the recording used to favour early or late frames.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeRamp {
    /// Frame `t` is scaled by `GAIN * t / T`.
    Increasing,
    /// Frame `t` is scaled by `GAIN * (T - 1 - t) / T`.
    Decreasing,
}

impl TimeRamp {
    /// Ramp that favours the frames where `kind` is expected.
    pub const fn for_event(kind: EventKind) -> Self {
        match kind {
            EventKind::Eclosion => Self::Increasing,
            EventKind::Pupariation | EventKind::Death => Self::Decreasing,
        }
    }

    fn factor(self, frame: usize, n_frames: usize) -> f64 {
        let position = match self {
            Self::Increasing => frame,
            Self::Decreasing => n_frames - 1 - frame,
        };
        WEIGHT_GAIN * (position as f64 / n_frames as f64)
    }
}

/// Multiplies each frame of every well by the ramp factor.
pub fn weight_by_time(matrix: &SignalMatrix, ramp: TimeRamp) -> Result<SignalMatrix, WcpError> {
    let (n_frames, n_wells) = matrix.shape();
    let values = matrix
        .values()
        .chunks_exact(n_wells)
        .enumerate()
        .flat_map(|(frame, row)| {
            let factor = ramp.factor(frame, n_frames);
            row.iter().map(move |value| value * factor)
        })
        .collect::<Vec<_>>();
    SignalMatrix::new(values, n_frames, n_wells)
}

#[cfg(test)]
mod tests {
    use super::{TimeRamp, weight_by_time};
    use wellcp_core::{EventKind, SignalMatrix};

    #[test]
    fn ramps_scale_frames_linearly() {
        let matrix = SignalMatrix::from_columns(&[vec![1.0; 4], vec![2.0; 4]]).unwrap();

        let up = weight_by_time(&matrix, TimeRamp::Increasing).unwrap();
        assert_eq!(up.column(0).unwrap(), vec![0.0, 2.5, 5.0, 7.5]);
        assert_eq!(up.column(1).unwrap(), vec![0.0, 5.0, 10.0, 15.0]);

        let down = weight_by_time(&matrix, TimeRamp::Decreasing).unwrap();
        assert_eq!(down.column(0).unwrap(), vec![7.5, 5.0, 2.5, 0.0]);
    }

    #[test]
    fn default_ramp_follows_event_edge() {
        assert_eq!(TimeRamp::for_event(EventKind::Eclosion), TimeRamp::Increasing);
        assert_eq!(TimeRamp::for_event(EventKind::Death), TimeRamp::Decreasing);
        assert_eq!(TimeRamp::for_event(EventKind::Pupariation), TimeRamp::Decreasing);
    }
}
