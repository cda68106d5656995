// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use wellcp_core::{SignalMatrix, WcpError, population_mean_std};

/// Decision boundary applied to each well.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Debug, PartialEq)]
pub enum Threshold {
    /// One value shared by every well.
    Global(f64),
    /// One value per well, indexed by well.
    PerWell(Vec<f64>),
}

impl Threshold {
    /// Threshold for `well`; a global threshold broadcasts to any well.
    pub fn for_well(&self, well: usize) -> Result<f64, WcpError> {
        match self {
            Self::Global(value) => Ok(*value),
            Self::PerWell(values) => values.get(well).copied().ok_or_else(|| {
                WcpError::invalid_input(format!(
                    "no threshold for well {well}; {} per-well thresholds given",
                    values.len()
                ))
            }),
        }
    }

    /// Fails unless this threshold covers exactly `n_wells` wells.
    pub fn ensure_covers(&self, n_wells: usize) -> Result<(), WcpError> {
        match self {
            Self::Global(_) => Ok(()),
            Self::PerWell(values) if values.len() == n_wells => Ok(()),
            Self::PerWell(values) => Err(WcpError::invalid_input(format!(
                "per-well threshold length mismatch: got {}, expected {n_wells}",
                values.len()
            ))),
        }
    }

    /// Expands into one value per well.
    pub fn broadcast(&self, n_wells: usize) -> Result<Vec<f64>, WcpError> {
        self.ensure_covers(n_wells)?;
        match self {
            Self::Global(value) => Ok(vec![*value; n_wells]),
            Self::PerWell(values) => Ok(values.clone()),
        }
    }
}

/// `mean + coef * std` over every value of every well.
///
/// The same scalar applies to each well; only `coef` is tunable.
pub fn population_threshold(population: &SignalMatrix, coef: f64) -> Result<Threshold, WcpError> {
    if !coef.is_finite() {
        return Err(WcpError::invalid_input(format!(
            "threshold coefficient must be finite; got {coef}"
        )));
    }
    let stats = population_mean_std(population)?;
    Ok(Threshold::Global(stats.mean + coef * stats.std))
}

#[cfg(test)]
mod tests {
    use super::{Threshold, population_threshold};
    use wellcp_core::SignalMatrix;

    #[test]
    fn known_population_gives_exact_threshold() {
        let population =
            SignalMatrix::from_columns(&[vec![8.0, 12.0, 8.0], vec![12.0, 8.0, 12.0]]).unwrap();
        let threshold = population_threshold(&population, 1.5).unwrap();
        assert_eq!(threshold, Threshold::Global(13.0));
    }

    #[test]
    fn statistics_span_wells_not_columns() {
        // Per-well stds are zero; the population std is not.
        let population = SignalMatrix::from_columns(&[vec![0.0; 4], vec![2.0; 4]]).unwrap();
        let threshold = population_threshold(&population, 1.0).unwrap();
        assert_eq!(threshold, Threshold::Global(2.0));
        assert_eq!(threshold.broadcast(2).unwrap(), vec![2.0, 2.0]);
    }

    #[test]
    fn negative_coefficient_lowers_the_bar() {
        let population = SignalMatrix::from_columns(&[vec![8.0, 12.0]]).unwrap();
        let threshold = population_threshold(&population, -0.5).unwrap();
        assert_eq!(threshold.for_well(0).unwrap(), 9.0);
    }

    #[test]
    fn non_finite_coefficient_is_rejected() {
        let population = SignalMatrix::from_columns(&[vec![1.0, 2.0]]).unwrap();
        let err = population_threshold(&population, f64::NAN).expect_err("NaN coef");
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn per_well_thresholds_must_cover_every_well() {
        let threshold = Threshold::PerWell(vec![1.0, 2.0]);
        assert_eq!(threshold.for_well(1).unwrap(), 2.0);
        assert!(threshold.for_well(2).is_err());
        assert!(threshold.ensure_covers(2).is_ok());
        assert!(threshold.broadcast(3).is_err());
    }
}
