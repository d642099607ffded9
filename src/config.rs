//!
//! # Coronagraph simulation configuration
//!
//! [`Config`] gathers every setting of a high-contrast imaging simulation run:
//! bandpass, wavefront estimation and control, deformable mirrors, pupil and focal planes
//! and the full and compact optical models.
//! It is built once with a [`ConfigBuilder`], validated and then only read.
//!
//! # Examples
//!
//! - default Habex vortex coronagraph
//!
//! ```
//! use coronagraph_config::{Builder, Config, FromBuilder};
//! let config = Config::builder().build().unwrap();
//! assert_eq!(config.full_nout(), 182);
//! ```
//!
//! - overriding settings by their path
//!
//! ```
//! use coronagraph_config::{Builder, Config, FromBuilder};
//! let config = Config::builder()
//!     .set("estimator.kind", "pwp-bp")
//!     .set("fend.resolution", 2.5)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.full_nout(), 152);
//! ```

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use skyangle::Conversion;

use crate::{
    bandpass::Bandpass,
    controller::Controller,
    dm::{DeformableMirror, Iris},
    estimator::Estimator,
    evaluation::Evaluation,
    focal_plane::FocalPlane,
    jacobian::Jacobian,
    models::{CompactModel, FullModel},
    optics::Optics,
    pupil::{Fidelity, Plane, PupilPlane},
    utilities::next_pow2,
    validation::{self, path, Validate},
    vortex::VortexMask,
    FromBuilder, ValidationError,
};

mod builder;
pub use builder::{ConfigBuilder, ConfigBuilderError};

/// P2, P3 and P4 default diameter in units of DM1 actuator pitch
pub const PUPIL_DIAMETER_IN_PITCH: f64 = 60.8985;

/// Pixel centering of the arrays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Centering {
    #[default]
    Pixel,
    Interpixel,
}

/// Configuration record, one field per subsystem
///
/// The field names are the top level keys of the TOML representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub series: u32,
    pub trial: u32,
    pub multiprocessing: bool,
    pub plotting: bool,
    pub gpu: bool,
    pub centering: Centering,
    pub bandpass: Bandpass,
    pub estimator: Estimator,
    pub controller: Controller,
    pub jacobian: Jacobian,
    pub evaluation: Evaluation,
    pub dm1: DeformableMirror,
    pub dm2: DeformableMirror,
    pub optics: Optics,
    pub p1: PupilPlane,
    pub p2: PupilPlane,
    pub p3: PupilPlane,
    pub p4: PupilPlane,
    pub fend: FocalPlane,
    pub compact: CompactModel,
    pub full: FullModel,
    pub vortex: VortexMask,
}
/// Habex vortex coronagraph
impl Default for Settings {
    fn default() -> Self {
        Self {
            series: 867,
            trial: 5309,
            multiprocessing: false,
            plotting: false,
            gpu: false,
            centering: Centering::Pixel,
            bandpass: Default::default(),
            estimator: Default::default(),
            controller: Default::default(),
            jacobian: Default::default(),
            evaluation: Default::default(),
            dm1: Default::default(),
            dm2: DeformableMirror {
                iris: Iris {
                    enabled: false,
                    diameter: 50e-3,
                },
                ..Default::default()
            },
            optics: Default::default(),
            p1: PupilPlane::telescope(),
            p2: Default::default(),
            p3: Default::default(),
            p4: PupilPlane::lyot_stop(),
            fend: Default::default(),
            compact: Default::default(),
            full: Default::default(),
            vortex: Default::default(),
        }
    }
}
impl Settings {
    pub fn pupil(&self, plane: Plane) -> &PupilPlane {
        match plane {
            Plane::P1 => &self.p1,
            Plane::P2 => &self.p2,
            Plane::P3 => &self.p3,
            Plane::P4 => &self.p4,
        }
    }
}
impl Validate for Settings {
    fn validate(&self, prefix: &str) -> validation::Result<()> {
        self.bandpass.validate(&path(prefix, "bandpass"))?;
        self.estimator.validate(&path(prefix, "estimator"))?;
        self.controller.validate(&path(prefix, "controller"))?;
        self.jacobian.validate(&path(prefix, "jacobian"))?;
        self.evaluation.validate(&path(prefix, "evaluation"))?;
        self.dm1.validate(&path(prefix, "dm1"))?;
        self.dm2.validate(&path(prefix, "dm2"))?;
        self.optics.validate(&path(prefix, "optics"))?;
        for plane in Plane::ALL {
            self.pupil(plane).validate(&path(prefix, plane.key()))?;
        }
        self.fend.validate(&path(prefix, "fend"))?;
        self.compact.validate(&path(prefix, "compact"))?;
        self.full.validate(&path(prefix, "full"))?;
        self.vortex.validate(&path(prefix, "vortex"))
    }
}

/// Validated coronagraph simulation configuration
///
/// `Config` is immutable: settings are read through accessors and
/// the derived quantities are computed from the settings they depend on.
/// A new run with different settings starts from [`ConfigBuilder::from`]
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    settings: Settings,
    telescope_diameter: f64,
    n_beam_full: usize,
    n_beam_compact: usize,
    dm1_flat_map: DMatrix<f64>,
    dm2_flat_map: DMatrix<f64>,
}
impl FromBuilder for Config {
    type ComponentBuilder = ConfigBuilder;
}

/// Settings
impl Config {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    /// Returns the value of a setting given its dotted path, e.g. `dm1.n_actuator`
    ///
    /// Only the top level section named by the path is serialized
    pub fn value(&self, path: &str) -> Option<toml::Value> {
        let mut keys = path.split('.');
        let mut value = self.section(keys.next()?)?;
        for key in keys {
            value = value.get(key)?.clone();
        }
        Some(value)
    }
    fn section(&self, key: &str) -> Option<toml::Value> {
        use toml::Value;
        let s = &self.settings;
        let value = match key {
            "series" => Value::try_from(s.series),
            "trial" => Value::try_from(s.trial),
            "multiprocessing" => Value::try_from(s.multiprocessing),
            "plotting" => Value::try_from(s.plotting),
            "gpu" => Value::try_from(s.gpu),
            "centering" => Value::try_from(s.centering),
            "bandpass" => Value::try_from(&s.bandpass),
            "estimator" => Value::try_from(&s.estimator),
            "controller" => Value::try_from(&s.controller),
            "jacobian" => Value::try_from(&s.jacobian),
            "evaluation" => Value::try_from(&s.evaluation),
            "dm1" => Value::try_from(&s.dm1),
            "dm2" => Value::try_from(&s.dm2),
            "optics" => Value::try_from(&s.optics),
            "p1" => Value::try_from(&s.p1),
            "p2" => Value::try_from(&s.p2),
            "p3" => Value::try_from(&s.p3),
            "p4" => Value::try_from(&s.p4),
            "fend" => Value::try_from(&s.fend),
            "compact" => Value::try_from(&s.compact),
            "full" => Value::try_from(&s.full),
            "vortex" => Value::try_from(&s.vortex),
            _ => return None,
        };
        value.ok()
    }
    pub fn centering(&self) -> Centering {
        self.settings.centering
    }
    pub fn bandpass(&self) -> &Bandpass {
        &self.settings.bandpass
    }
    pub fn estimator(&self) -> &Estimator {
        &self.settings.estimator
    }
    pub fn controller(&self) -> &Controller {
        &self.settings.controller
    }
    pub fn jacobian(&self) -> &Jacobian {
        &self.settings.jacobian
    }
    pub fn evaluation(&self) -> &Evaluation {
        &self.settings.evaluation
    }
    pub fn dm1(&self) -> &DeformableMirror {
        &self.settings.dm1
    }
    pub fn dm2(&self) -> &DeformableMirror {
        &self.settings.dm2
    }
    /// Returns DM 1 or DM 2
    pub fn dm(&self, index: usize) -> Option<&DeformableMirror> {
        match index {
            1 => Some(&self.settings.dm1),
            2 => Some(&self.settings.dm2),
            _ => None,
        }
    }
    pub fn optics(&self) -> &Optics {
        &self.settings.optics
    }
    pub fn pupil(&self, plane: Plane) -> &PupilPlane {
        self.settings.pupil(plane)
    }
    /// Final focal plane
    pub fn fend(&self) -> &FocalPlane {
        &self.settings.fend
    }
    pub fn full(&self) -> &FullModel {
        &self.settings.full
    }
    pub fn compact(&self) -> &CompactModel {
        &self.settings.compact
    }
    pub fn vortex(&self) -> &VortexMask {
        &self.settings.vortex
    }
    /// DM1 flat map, all zeros when no map directory is given
    pub fn dm1_flat_map(&self) -> &DMatrix<f64> {
        &self.dm1_flat_map
    }
    pub fn dm2_flat_map(&self) -> &DMatrix<f64> {
        &self.dm2_flat_map
    }
    /// Returns `true` if either the estimator or the controller is unverified
    pub fn is_experimental(&self) -> bool {
        self.estimator().is_experimental() || self.controller().is_experimental()
    }
}

/// Derived quantities
impl Config {
    /// Full model output image size in pixels
    pub fn full_nout(&self) -> usize {
        self.settings.fend.n_out()
    }
    /// Full model final sampling in λ0/D
    pub fn final_sampling(&self) -> f64 {
        self.settings.fend.sampling()
    }
    /// Full model pupil array size
    pub fn full_narr(&self) -> usize {
        next_pow2(self.n_beam_full)
    }
    /// Full model pupil diameter in pixels
    pub fn full_pupil_diam_pix(&self) -> usize {
        self.n_beam_full
    }
    /// Full model reference wavelength in micrometers
    pub fn lambda0_um(&self) -> f64 {
        self.settings.bandpass.wavelength_um()
    }
    /// Pupil plane diameter in meters
    ///
    /// P2, P3 and P4 default to [`PUPIL_DIAMETER_IN_PITCH`] DM1 actuator pitches
    pub fn pupil_diameter(&self, plane: Plane) -> f64 {
        match plane {
            Plane::P1 => self.telescope_diameter,
            _ => self
                .pupil(plane)
                .diameter
                .unwrap_or(PUPIL_DIAMETER_IN_PITCH * self.settings.dm1.pitch),
        }
    }
    /// Number of pixels across the beam
    ///
    /// P4 defaults to P1 sampling
    pub fn n_beam(&self, plane: Plane, fidelity: Fidelity) -> Option<usize> {
        let p1 = match fidelity {
            Fidelity::Full => self.n_beam_full,
            Fidelity::Compact => self.n_beam_compact,
        };
        match plane {
            Plane::P1 => Some(p1),
            Plane::P4 => self.settings.p4.n_beam.get(fidelity).or(Some(p1)),
            _ => self.pupil(plane).n_beam.get(fidelity),
        }
    }
    /// Field stop radius in λ0/D, defaults to the correction region outer radius
    pub fn field_stop_radius(&self) -> f64 {
        self.settings
            .full
            .field_stop
            .radius
            .unwrap_or(self.settings.fend.correction.outer_radius)
    }
    /// Lyot stop outer diameter normalized to the telescope diameter
    pub fn norm_lyot_diam(&self) -> f64 {
        self.settings.p4.outer_diameter
    }
    pub fn vortex_charge(&self) -> u32 {
        self.settings.vortex.charge
    }
    /// λ0/D in milliarcseconds
    pub fn lambda0_d_mas(&self) -> f64 {
        (self.settings.bandpass.wavelength / self.telescope_diameter).to_mas()
    }
    pub fn mas_to_lambda0_d(&self, mas: f64) -> f64 {
        mas / self.lambda0_d_mas()
    }
    pub fn lambda0_d_to_mas(&self, lambda0_d: f64) -> f64 {
        lambda0_d * self.lambda0_d_mas()
    }
}

impl Config {
    /// Checks the settings and resolves the entrance pupil
    pub(crate) fn new(settings: Settings) -> Result<Self, ValidationError> {
        settings.validate("")?;
        let required = |field: &str| ValidationError::Invalid {
            field: field.into(),
            reason: "the entrance pupil requires a value".into(),
        };
        let telescope_diameter = settings.p1.diameter.ok_or_else(|| required("p1.diameter"))?;
        let n_beam_full = settings
            .p1
            .n_beam
            .full
            .ok_or_else(|| required("p1.n_beam.full"))?;
        let n_beam_compact = settings
            .p1
            .n_beam
            .compact
            .ok_or_else(|| required("p1.n_beam.compact"))?;
        let n1 = settings.dm1.n_actuator;
        let n2 = settings.dm2.n_actuator;
        let config = Self {
            settings,
            telescope_diameter,
            n_beam_full,
            n_beam_compact,
            dm1_flat_map: DMatrix::zeros(n1, n1),
            dm2_flat_map: DMatrix::zeros(n2, n2),
        };
        config.check_consistency()?;
        Ok(config)
    }
    /// Cross-section constraints
    fn check_consistency(&self) -> Result<(), ValidationError> {
        if self.settings.optics.coronagraph.is_vortex() {
            for fidelity in [Fidelity::Full, Fidelity::Compact] {
                let p1 = self.n_beam(Plane::P1, fidelity);
                let p4 = self.n_beam(Plane::P4, fidelity);
                if p1 != p4 {
                    return Err(ValidationError::Mismatch {
                        field: format!("p4.n_beam.{}", fidelity.key()),
                        value: format!("{p4:?}"),
                        other: format!("p1.n_beam.{}", fidelity.key()),
                        other_value: format!("{p1:?}"),
                        reason: "the Lyot stop must be sampled like the entrance pupil with a vortex coronagraph".into(),
                    });
                }
            }
        }
        if self.settings.optics.pupil.is_simple() {
            let p2 = self.pupil_diameter(Plane::P2);
            for plane in [Plane::P3, Plane::P4] {
                let d = self.pupil_diameter(plane);
                if d != p2 {
                    return Err(ValidationError::Mismatch {
                        field: path(plane.key(), "diameter"),
                        value: d.to_string(),
                        other: "p2.diameter".into(),
                        other_value: p2.to_string(),
                        reason: "P2, P3 and P4 diameters are equal for a simple pupil".into(),
                    });
                }
            }
        }
        let probe = &self.settings.estimator.probe;
        if self.settings.estimator.kind.is_probing()
            && !self.settings.controller.dm_ind.contains(&probe.dm)
        {
            log::warn!(
                "probing with DM{} that is not used by the controller ({:?})",
                probe.dm,
                self.settings.controller.dm_ind
            );
        }
        Ok(())
    }
    pub(crate) fn with_dm1_flat_map(self, dm1_flat_map: DMatrix<f64>) -> Self {
        Self {
            dm1_flat_map,
            ..self
        }
    }
}
