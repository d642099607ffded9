use serde::{Deserialize, Serialize};

use crate::validation::{finite, path, positive, range_error, Result, Validate};

/// Core throughput metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThroughputMetric {
    /// Energy within the half-max isophote over the energy at the telescope pupil
    #[serde(rename = "half-max-isophote", alias = "HMI")]
    HalfMaxIsophote,
    /// Energy within [`Throughput::radius`] over the energy at the telescope pupil
    #[default]
    #[serde(rename = "encircled-energy", alias = "EE")]
    EncircledEnergy,
}

/// Core throughput evaluation, lengths in λ0/D
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Throughput {
    pub metric: ThroughputMetric,
    /// Photometric aperture radius, encircled energy only
    pub radius: f64,
    pub x: f64,
    pub y: f64,
}
impl Default for Throughput {
    fn default() -> Self {
        Self {
            metric: ThroughputMetric::EncircledEnergy,
            radius: 0.7,
            x: 7.,
            y: 0.,
        }
    }
}

/// Source location, in λ0/D, for the intensity normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// Zernike sensitivities evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensitivity {
    /// Noll indices of the Zernike modes
    pub noll_indices: Vec<usize>,
    /// [inner radius, outer radius] of the annuli in λ0/D
    pub annuli: Vec<[f64; 2]>,
}
impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            noll_indices: (2..=6).collect(),
            annuli: vec![[2., 3.], [3., 4.], [4., 5.]],
        }
    }
}

/// Performance evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Include a planet in the images
    pub planet: bool,
    pub throughput: Throughput,
    pub normalization: Offset,
    pub sensitivity: Sensitivity,
}
impl Default for Evaluation {
    fn default() -> Self {
        Self {
            planet: false,
            throughput: Default::default(),
            normalization: Offset { x: 7., y: 0. },
            sensitivity: Default::default(),
        }
    }
}
impl Validate for Evaluation {
    fn validate(&self, prefix: &str) -> Result<()> {
        let throughput = path(prefix, "throughput");
        if self.throughput.metric == ThroughputMetric::EncircledEnergy {
            positive(&throughput, "radius", self.throughput.radius)?;
        }
        finite(&throughput, "x", self.throughput.x)?;
        finite(&throughput, "y", self.throughput.y)?;
        let normalization = path(prefix, "normalization");
        finite(&normalization, "x", self.normalization.x)?;
        finite(&normalization, "y", self.normalization.y)?;
        let sensitivity = path(prefix, "sensitivity");
        if let Some(j) = self.sensitivity.noll_indices.iter().find(|&&j| j == 0) {
            return Err(range_error(
                path(&sensitivity, "noll_indices"),
                "Noll indices >= 1",
                j,
            ));
        }
        for (i, &[inner, outer]) in self.sensitivity.annuli.iter().enumerate() {
            if !(inner.is_finite() && outer.is_finite()) || inner < 0. || outer <= inner {
                return Err(range_error(
                    format!("{}[{i}]", path(&sensitivity, "annuli")),
                    "[inner radius >= 0, outer radius > inner radius]",
                    format!("{:?}", [inner, outer]),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annuli() {
        assert!(Evaluation::default().validate("evaluation").is_ok());
        let mut eval = Evaluation::default();
        eval.sensitivity.annuli.push([5., 4.]);
        assert_eq!(
            eval.validate("evaluation").unwrap_err().field(),
            "evaluation.sensitivity.annuli[3]"
        );
    }

    #[test]
    fn non_finite_locations() {
        let mut eval = Evaluation::default();
        eval.throughput.y = f64::NAN;
        assert_eq!(
            eval.validate("evaluation").unwrap_err().field(),
            "evaluation.throughput.y"
        );
        let mut eval = Evaluation::default();
        eval.normalization.x = f64::INFINITY;
        assert_eq!(
            eval.validate("evaluation").unwrap_err().field(),
            "evaluation.normalization.x"
        );
        let mut eval = Evaluation::default();
        eval.sensitivity.annuli[0] = [2., f64::INFINITY];
        assert_eq!(
            eval.validate("evaluation").unwrap_err().field(),
            "evaluation.sensitivity.annuli[0]"
        );
    }

    #[test]
    fn half_max_isophote_ignores_radius() {
        let eval = Evaluation {
            throughput: Throughput {
                metric: ThroughputMetric::HalfMaxIsophote,
                radius: 0.,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(eval.validate("evaluation").is_ok());
        let eval = Evaluation {
            throughput: Throughput {
                radius: 0.,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            eval.validate("evaluation").unwrap_err().field(),
            "evaluation.throughput.radius"
        );
    }
}
