use serde::{Deserialize, Serialize};

use crate::validation::{at_least, finite, path, positive, range_error, Result, Validate};

/// Wavefront estimation methods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorKind {
    /// Exact numerical answer from the full model
    #[default]
    #[serde(rename = "exact", alias = "perfect")]
    Exact,
    /// Pairwise probing with batch process estimation
    #[serde(rename = "pairwise-probing-batch", alias = "pwp-bp")]
    PairwiseProbingBatch,
    /// Pairwise probing with a Kalman filter
    #[serde(rename = "pairwise-probing-kalman", alias = "pwp-kf")]
    PairwiseProbingKalman,
    /// Pairwise probing with an iterated extended Kalman filter
    #[serde(rename = "pairwise-probing-iekf", alias = "pwp-iekf")]
    PairwiseProbingIekf,
}
impl EstimatorKind {
    /// Returns `true` for the Kalman filter variants that have not been verified yet
    pub fn is_experimental(&self) -> bool {
        matches!(
            self,
            Self::PairwiseProbingKalman | Self::PairwiseProbingIekf
        )
    }
    /// Returns `true` if the estimator applies probes with a DM
    pub fn is_probing(&self) -> bool {
        !matches!(self, Self::Exact)
    }
}

/// Axis of the probe phase discontinuity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeAxis {
    X,
    Y,
    #[default]
    #[serde(alias = "alt", alias = "xy")]
    Alternate,
}

/// Pairwise probe parameters
///
/// Lengths are given in actuator pitches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    /// Number of probe pairs
    pub n_pair: usize,
    /// DM used for probing: 1 or 2
    pub dm: usize,
    /// Maximum x/y extent of the probed region
    pub radius: f64,
    pub x_offset: f64,
    pub y_offset: f64,
    pub axis: ProbeAxis,
    /// Empirical factor matching the average probe amplitude to the requested one
    pub gain_fudge: f64,
}
impl Default for Probe {
    fn default() -> Self {
        Self {
            n_pair: 3,
            dm: 1,
            radius: 12.,
            x_offset: 0.,
            y_offset: 14.,
            axis: ProbeAxis::Alternate,
            gain_fudge: 1.,
        }
    }
}
impl Validate for Probe {
    fn validate(&self, prefix: &str) -> Result<()> {
        at_least(prefix, "n_pair", self.n_pair, 1)?;
        if !(1..=2).contains(&self.dm) {
            return Err(range_error(path(prefix, "dm"), "1 or 2", self.dm));
        }
        positive(prefix, "radius", self.radius)?;
        finite(prefix, "x_offset", self.x_offset)?;
        finite(prefix, "y_offset", self.y_offset)?;
        positive(prefix, "gain_fudge", self.gain_fudge)
    }
}

/// Wavefront estimation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Estimator {
    pub kind: EstimatorKind,
    pub probe: Probe,
}
impl Estimator {
    pub fn new(kind: EstimatorKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }
    /// Returns `true` if the estimator kind is accepted but not verified
    pub fn is_experimental(&self) -> bool {
        self.kind.is_experimental()
    }
}
impl Validate for Estimator {
    fn validate(&self, prefix: &str) -> Result<()> {
        self.probe.validate(&path(prefix, "probe"))
    }
}
