//!
//! # Full and compact optical models
//!
//! The full model is the "truth" optical prescription used to simulate images,
//! the compact model is the Fourier model used for the Jacobian and the control.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::validation::{positive, Result, Validate};

/// Number of re-imaging relays between pupil planes in the compact model
///
/// Used to keep track of the 180degree rotations compared to the full model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relays {
    pub p1_to_p2: usize,
    pub p2_to_p3: usize,
    pub p3_to_p4: usize,
    /// Number of 180degree rotations of the final image
    pub final_image: usize,
}
impl Default for Relays {
    fn default() -> Self {
        Self {
            p1_to_p2: 1,
            p2_to_p3: 1,
            p3_to_p4: 1,
            final_image: 0,
        }
    }
}
impl Relays {
    /// Returns `true` if the final image is rotated by 180degree with respect to the entrance pupil
    pub fn is_flipped(&self) -> bool {
        (self.p1_to_p2 + self.p2_to_p3 + self.p3_to_p4 + self.final_image) % 2 == 1
    }
}

/// Compact model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactModel {
    /// Focal length used for all Fourier transforms in meters
    pub focal_length: f64,
    pub relays: Relays,
}
impl Default for CompactModel {
    fn default() -> Self {
        Self {
            focal_length: 1.,
            relays: Default::default(),
        }
    }
}
impl Validate for CompactModel {
    fn validate(&self, prefix: &str) -> Result<()> {
        positive(prefix, "focal_length", self.focal_length)
    }
}

/// Focal plane field stop
///
/// The radius defaults to the correction region outer radius,
/// see [`Config::field_stop_radius`](crate::Config::field_stop_radius)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStop {
    pub enabled: bool,
    /// Radius in λ0/D
    pub radius: Option<f64>,
}

/// Full model
///
/// Default properties:
///  * PROPER prescription : habex
///  * error maps          : on, no map directory
///  * DM1 flat map        : flat_map.fits
///  * field stop          : on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullModel {
    /// Whether the full model is a PROPER prescription
    pub proper: bool,
    pub prescription: String,
    /// Directory with the optical surface error maps
    pub map_dir: Option<PathBuf>,
    /// DM1 flat map file name in `map_dir`
    pub dm1_flat_map: String,
    pub use_errors: bool,
    pub field_stop: FieldStop,
}
impl Default for FullModel {
    fn default() -> Self {
        Self {
            proper: true,
            prescription: "habex".into(),
            map_dir: None,
            dm1_flat_map: "flat_map.fits".into(),
            use_errors: true,
            field_stop: FieldStop {
                enabled: true,
                radius: None,
            },
        }
    }
}
impl FullModel {
    /// Sets the directory of the error maps
    pub fn map_dir<P: AsRef<Path>>(self, map_dir: P) -> Self {
        Self {
            map_dir: Some(map_dir.as_ref().to_path_buf()),
            ..self
        }
    }
    /// Path to the DM1 flat map, if a map directory is set
    pub fn dm1_flat_map_path(&self) -> Option<PathBuf> {
        self.map_dir
            .as_ref()
            .map(|dir| dir.join(&self.dm1_flat_map))
    }
}
impl Validate for FullModel {
    fn validate(&self, prefix: &str) -> Result<()> {
        if self.prescription.is_empty() {
            return Err(crate::ValidationError::Invalid {
                field: crate::validation::path(prefix, "prescription"),
                reason: "empty prescription name".into(),
            });
        }
        if let Some(radius) = self.field_stop.radius {
            positive(
                &crate::validation::path(prefix, "field_stop"),
                "radius",
                radius,
            )?;
        }
        Ok(())
    }
}
