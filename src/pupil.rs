use serde::{Deserialize, Serialize};

use crate::validation::{non_negative, path, positive, range_error, Result, Validate};

/// Pupil planes of the optical train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    /// Telescope entrance pupil
    P1,
    /// DM1 pupil
    P2,
    P3,
    /// Lyot stop
    P4,
}
impl Plane {
    pub const ALL: [Plane; 4] = [Plane::P1, Plane::P2, Plane::P3, Plane::P4];
    /// Key of the plane section in the configuration
    pub fn key(&self) -> &'static str {
        match self {
            Self::P1 => "p1",
            Self::P2 => "p2",
            Self::P3 => "p3",
            Self::P4 => "p4",
        }
    }
}

/// Optical model fidelity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fidelity {
    Full,
    Compact,
}
impl Fidelity {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Compact => "compact",
        }
    }
}

/// Number of pixels across the beam in the full and compact models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamSampling {
    pub full: Option<usize>,
    pub compact: Option<usize>,
}
impl BeamSampling {
    pub fn new(full: usize, compact: usize) -> Self {
        Self {
            full: Some(full),
            compact: Some(compact),
        }
    }
    pub fn get(&self, fidelity: Fidelity) -> Option<usize> {
        match fidelity {
            Fidelity::Full => self.full,
            Fidelity::Compact => self.compact,
        }
    }
}

/// Pupil plane geometry
///
/// Diameters ratios are normalized to the pupil outer diameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PupilPlane {
    /// Diameter in meters, see [`Config::pupil_diameter`](crate::Config::pupil_diameter) when not set
    pub diameter: Option<f64>,
    /// Central obscuration diameter
    pub inner_diameter: f64,
    pub outer_diameter: f64,
    pub n_strut: usize,
    /// Strut angles in degrees
    pub strut_angles: Vec<f64>,
    /// Strut width
    pub strut_width: f64,
    pub stretch: f64,
    /// Padding in percent of the outer diameter
    pub padding_pct: f64,
    pub n_beam: BeamSampling,
}
impl Default for PupilPlane {
    fn default() -> Self {
        Self {
            diameter: None,
            inner_diameter: 0.,
            outer_diameter: 1.,
            n_strut: 0,
            strut_angles: vec![],
            strut_width: 0.,
            stretch: 1.,
            padding_pct: 0.,
            n_beam: Default::default(),
        }
    }
}
impl PupilPlane {
    /// Telescope entrance pupil: 4m unobscured, 434px (full) and 248px (compact) across
    pub fn telescope() -> Self {
        Self {
            diameter: Some(4.),
            n_beam: BeamSampling::new(62 * 7, 62 * 4),
            ..Default::default()
        }
    }
    /// Lyot stop: 95% of the telescope pupil
    pub fn lyot_stop() -> Self {
        Self {
            outer_diameter: 0.95,
            ..Default::default()
        }
    }
    /// Sets the normalized inner and outer diameters
    pub fn annulus(self, inner_diameter: f64, outer_diameter: f64) -> Self {
        Self {
            inner_diameter,
            outer_diameter,
            ..self
        }
    }
    /// Sets the struts angles in degrees and width
    pub fn struts(self, strut_angles: Vec<f64>, strut_width: f64) -> Self {
        Self {
            n_strut: strut_angles.len(),
            strut_angles,
            strut_width,
            ..self
        }
    }
}
impl Validate for PupilPlane {
    fn validate(&self, prefix: &str) -> Result<()> {
        if let Some(diameter) = self.diameter {
            positive(prefix, "diameter", diameter)?;
        }
        if !(0. ..=1.).contains(&self.outer_diameter) || self.outer_diameter == 0. {
            return Err(range_error(
                path(prefix, "outer_diameter"),
                "in (0, 1]",
                self.outer_diameter,
            ));
        }
        if !(0. ..self.outer_diameter).contains(&self.inner_diameter) {
            return Err(range_error(
                path(prefix, "inner_diameter"),
                &format!("in [0, outer_diameter = {})", self.outer_diameter),
                self.inner_diameter,
            ));
        }
        if self.strut_angles.len() != self.n_strut {
            return Err(crate::ValidationError::Mismatch {
                field: path(prefix, "strut_angles"),
                value: format!("{} angles", self.strut_angles.len()),
                other: path(prefix, "n_strut"),
                other_value: self.n_strut.to_string(),
                reason: "one angle per strut".into(),
            });
        }
        if let Some(angle) = self.strut_angles.iter().find(|a| !a.is_finite()) {
            return Err(range_error(path(prefix, "strut_angles"), "finite angles", angle));
        }
        non_negative(prefix, "strut_width", self.strut_width)?;
        positive(prefix, "stretch", self.stretch)?;
        non_negative(prefix, "padding_pct", self.padding_pct)?;
        for (fidelity, n) in [
            (Fidelity::Full, self.n_beam.full),
            (Fidelity::Compact, self.n_beam.compact),
        ] {
            if n == Some(0) {
                return Err(range_error(
                    path(&path(prefix, "n_beam"), fidelity.key()),
                    "> 0",
                    0,
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
    fn obscuration() {
        assert!(PupilPlane::telescope().validate("p1").is_ok());
        assert!(PupilPlane::lyot_stop().validate("p4").is_ok());
        let err = PupilPlane::default()
            .annulus(0.5, 0.5)
            .validate("p1")
            .unwrap_err();
        assert_eq!(err.field(), "p1.inner_diameter");
        let err = PupilPlane::default()
            .annulus(0., 1.2)
            .validate("p4")
            .unwrap_err();
        assert_eq!(err.field(), "p4.outer_diameter");
    }

    #[test]
    fn struts() {
        let p1 = PupilPlane::telescope().struts(vec![90., 210., 330.], 0.01);
        assert_eq!(p1.n_strut, 3);
        assert!(p1.validate("p1").is_ok());
        let p1 = PupilPlane {
            n_strut: 2,
            ..p1
        };
        assert_eq!(p1.validate("p1").unwrap_err().field(), "p1.strut_angles");
        let p1 = PupilPlane::telescope().struts(vec![90., f64::NAN], 0.01);
        assert_eq!(p1.validate("p1").unwrap_err().field(), "p1.strut_angles");
    }

    #[test]
    fn beam_sampling() {
        let p1 = PupilPlane::telescope();
        assert_eq!(p1.n_beam.get(Fidelity::Full), Some(434));
        assert_eq!(p1.n_beam.get(Fidelity::Compact), Some(248));
        let p1 = PupilPlane {
            n_beam: BeamSampling {
                full: Some(0),
                compact: None,
            },
            ..p1
        };
        assert_eq!(p1.validate("p1").unwrap_err().field(), "p1.n_beam.full");
    }
}
