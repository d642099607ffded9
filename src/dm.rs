//!
//! # Deformable mirrors
//!
//! Physical and control parameters of the two DMs.
//! The voltage limits are carried through to the consumer of the configuration,
//! they are not enforced on DM commands.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{
    validation::{finite, non_negative, path, positive, range_error, Result, Validate},
    ValidationError,
};

/// DM influence function models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Influence {
    #[default]
    #[serde(rename = "Xinetics", alias = "xinetics")]
    Xinetics,
    #[serde(rename = "BMC-2K", alias = "bmc-2k")]
    Bmc2k,
    #[serde(rename = "BMC-kilo", alias = "bmc-kilo")]
    BmcKilo,
}
impl Influence {
    /// Name of the influence function calibration file
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Xinetics => "influence_dm5v2.fits",
            Self::Bmc2k => "influence_BMC_2kDM_400micron_res10.fits",
            Self::BmcKilo => "influence_BMC_kiloDM_300micron_res10_spline.fits",
        }
    }
}

/// Sign of the influence function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfluenceSign {
    #[default]
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "-")]
    Negative,
}
impl InfluenceSign {
    pub fn signum(&self) -> f64 {
        match self {
            Self::Positive => 1.,
            Self::Negative => -1.,
        }
    }
}

/// Aperture stop at the DM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Iris {
    pub enabled: bool,
    /// Iris diameter in meters
    pub diameter: f64,
}

/// Deformable mirror
///
/// Default properties:
///  * \# actuator    : 64x64
///  * gain          : 1nm/V for all actuators
///  * pitch         : 400micron
///  * influence     : Xinetics (+)
///  * tilts         : 0degree
///  * center        : center of the actuator grid
///  * edge buffer   : 1 actuator
///  * voltage range : +/-1000V, 1000V steps
///  * iris          : off, 100mm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeformableMirror {
    /// Number of actuators across the DM
    pub n_actuator: usize,
    /// Voltage to height gains of all actuators [m/V]
    #[serde(with = "crate::utilities::grid")]
    pub gain: DMatrix<f64>,
    /// Actuator pitch in meters
    pub pitch: f64,
    pub influence: Influence,
    pub influence_sign: InfluenceSign,
    /// Rotation about the x-axis for foreshortening in degrees
    pub x_tilt: f64,
    /// Rotation about the y-axis for foreshortening in degrees
    pub y_tilt: f64,
    /// Clocking of the DM surface in degrees
    pub z_rotation: f64,
    /// x center of the DM surface in actuator widths
    pub x_center: Option<f64>,
    /// y center of the DM surface in actuator widths
    pub y_center: Option<f64>,
    /// Radius outside the beam where influence functions are computed, in actuator widths
    pub edge_buffer: f64,
    /// Control weight
    pub weight: f64,
    /// Maximum absolute voltage in volts
    pub max_abs_voltage: f64,
    /// Maximum absolute voltage step in volts
    pub max_abs_voltage_step: f64,
    pub iris: Iris,
}
impl Default for DeformableMirror {
    fn default() -> Self {
        let n_actuator = 64;
        Self {
            n_actuator,
            gain: DMatrix::from_element(n_actuator, n_actuator, 1e-9),
            pitch: 400e-6,
            influence: Influence::Xinetics,
            influence_sign: InfluenceSign::Positive,
            x_tilt: 0.,
            y_tilt: 0.,
            z_rotation: 0.,
            x_center: None,
            y_center: None,
            edge_buffer: 1.,
            weight: 1.,
            max_abs_voltage: 1000.,
            max_abs_voltage_step: 1000.,
            iris: Iris {
                enabled: false,
                diameter: 100e-3,
            },
        }
    }
}
impl DeformableMirror {
    /// Sets the number of actuators across the DM
    ///
    /// Resets the gains to 1nm/V
    pub fn n_actuator(self, n_actuator: usize) -> Self {
        Self {
            n_actuator,
            gain: DMatrix::from_element(n_actuator, n_actuator, 1e-9),
            ..self
        }
    }
    /// Sets the actuator gains
    pub fn gain(self, gain: DMatrix<f64>) -> Self {
        Self { gain, ..self }
    }
    /// Sets the actuator pitch in meters
    pub fn pitch(self, pitch: f64) -> Self {
        Self { pitch, ..self }
    }
    /// Sets the influence function
    pub fn influence(self, influence: Influence) -> Self {
        Self { influence, ..self }
    }
    /// Sets the iris diameter and turns it on
    pub fn iris(self, diameter: f64) -> Self {
        Self {
            iris: Iris {
                enabled: true,
                diameter,
            },
            ..self
        }
    }
    /// (x,y) center of the DM surface in actuator widths
    ///
    /// Defaults to the center of the actuator grid
    pub fn center(&self) -> (f64, f64) {
        let c = 0.5 * self.n_actuator as f64 - 0.5;
        (self.x_center.unwrap_or(c), self.y_center.unwrap_or(c))
    }
    /// DM width in meters
    pub fn width(&self) -> f64 {
        self.n_actuator as f64 * self.pitch
    }
}
impl Validate for DeformableMirror {
    fn validate(&self, prefix: &str) -> Result<()> {
        if self.n_actuator == 0 {
            return Err(range_error(path(prefix, "n_actuator"), "> 0", 0));
        }
        let expected = (self.n_actuator, self.n_actuator);
        if self.gain.shape() != expected {
            return Err(ValidationError::Shape {
                field: path(prefix, "gain"),
                expected,
                found: self.gain.shape(),
            });
        }
        if self.gain.iter().any(|g| !g.is_finite()) {
            return Err(range_error(path(prefix, "gain"), "finite", "NaN or infinite"));
        }
        positive(prefix, "pitch", self.pitch)?;
        finite(prefix, "x_tilt", self.x_tilt)?;
        finite(prefix, "y_tilt", self.y_tilt)?;
        finite(prefix, "z_rotation", self.z_rotation)?;
        if let Some(x_center) = self.x_center {
            finite(prefix, "x_center", x_center)?;
        }
        if let Some(y_center) = self.y_center {
            finite(prefix, "y_center", y_center)?;
        }
        non_negative(prefix, "edge_buffer", self.edge_buffer)?;
        non_negative(prefix, "weight", self.weight)?;
        positive(prefix, "max_abs_voltage", self.max_abs_voltage)?;
        positive(prefix, "max_abs_voltage_step", self.max_abs_voltage_step)?;
        if self.iris.enabled {
            positive(&path(prefix, "iris"), "diameter", self.iris.diameter)?;
        }
        Ok(())
    }
}
