// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::WcpError;

/// Biological event detected from a well's signal.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Pupariation,
    Eclosion,
    Death,
}

impl EventKind {
    pub const ALL: [Self; 3] = [Self::Pupariation, Self::Eclosion, Self::Death];

    /// Stable user-facing name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pupariation => "pupariation",
            Self::Eclosion => "eclosion",
            Self::Death => "death",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, WcpError> {
        match raw {
            "pupariation" => Ok(Self::Pupariation),
            "eclosion" => Ok(Self::Eclosion),
            "death" => Ok(Self::Death),
            _ => Err(WcpError::invalid_input(format!(
                "invalid event '{raw}'; expected one of: pupariation, eclosion, death"
            ))),
        }
    }

    /// Edge on which the event shows up in the activity signal.
    ///
    /// Pupariation and death end a period of movement (falling edge);
    /// eclosion starts one (rising edge).
    pub const fn direction(self) -> Direction {
        match self {
            Self::Pupariation | Self::Death => Direction::Falling,
            Self::Eclosion => Direction::Rising,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scan direction for event-time extraction.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Rising,
    Falling,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
        }
    }
}

/// Owned `frames x wells` matrix stored row-major (one row per frame).
///
/// Every well has the same number of frames; the column index is the stable
/// well key used by blacklists and manual evaluations.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalMatrix {
    values: Vec<f64>,
    n_frames: usize,
    n_wells: usize,
}

impl SignalMatrix {
    pub fn new(values: Vec<f64>, n_frames: usize, n_wells: usize) -> Result<Self, WcpError> {
        if n_frames == 0 {
            return Err(WcpError::invalid_input("n_frames must be >= 1"));
        }
        if n_wells == 0 {
            return Err(WcpError::invalid_input("n_wells must be >= 1"));
        }
        let expected_len = n_frames.checked_mul(n_wells).ok_or_else(|| {
            WcpError::invalid_input("n_frames*n_wells overflow while validating shape")
        })?;
        if values.len() != expected_len {
            return Err(WcpError::invalid_input(format!(
                "value length mismatch: got {}, expected {expected_len} (n_frames={n_frames}, n_wells={n_wells})",
                values.len()
            )));
        }
        Ok(Self {
            values,
            n_frames,
            n_wells,
        })
    }

    /// Builds a matrix from per-well columns of identical length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self, WcpError> {
        let Some(first) = columns.first() else {
            return Err(WcpError::invalid_input("at least one well column is required"));
        };
        let n_frames = first.len();
        if let Some((well, column)) = columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.len() != n_frames)
        {
            return Err(WcpError::invalid_input(format!(
                "well {well} has {} frames but well 0 has {n_frames}",
                column.len()
            )));
        }

        let n_wells = columns.len();
        let mut values = Vec::with_capacity(n_frames.saturating_mul(n_wells));
        for t in 0..n_frames {
            values.extend(columns.iter().map(|column| column[t]));
        }
        Self::new(values, n_frames, n_wells)
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn n_wells(&self) -> usize {
        self.n_wells
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_frames, self.n_wells)
    }

    /// Row-major backing buffer.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn get(&self, frame: usize, well: usize) -> Option<f64> {
        if frame >= self.n_frames || well >= self.n_wells {
            return None;
        }
        Some(self.values[frame * self.n_wells + well])
    }

    pub fn row(&self, frame: usize) -> Option<&[f64]> {
        if frame >= self.n_frames {
            return None;
        }
        let start = frame * self.n_wells;
        Some(&self.values[start..start + self.n_wells])
    }

    /// Copies out one well's time series.
    pub fn column(&self, well: usize) -> Result<Vec<f64>, WcpError> {
        if well >= self.n_wells {
            return Err(WcpError::invalid_input(format!(
                "well index {well} out of range for {} wells",
                self.n_wells
            )));
        }
        Ok(self
            .values
            .iter()
            .skip(well)
            .step_by(self.n_wells)
            .copied()
            .collect())
    }

    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.n_wells)
            .map(|well| {
                self.values
                    .iter()
                    .skip(well)
                    .step_by(self.n_wells)
                    .copied()
                    .collect()
            })
            .collect()
    }

    /// Fails unless `other` has exactly the same shape.
    pub fn ensure_same_shape(&self, other: &Self) -> Result<(), WcpError> {
        if self.shape() != other.shape() {
            return Err(WcpError::invalid_input(format!(
                "shape mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            )));
        }
        Ok(())
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::{Direction, EventKind};

    #[test]
    fn wire_names_are_lowercase() {
        for kind in EventKind::ALL {
            let json = serde_json::to_string(&kind).expect("kind should serialize");
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: EventKind = serde_json::from_str(&json).expect("kind should deserialize");
            assert_eq!(back, kind);
        }
        assert_eq!(serde_json::to_string(&Direction::Rising).unwrap(), "\"rising\"");
        assert_eq!(serde_json::to_string(&Direction::Falling).unwrap(), "\"falling\"");
        assert!(serde_json::from_str::<EventKind>("\"Death\"").is_err());
    }
}
