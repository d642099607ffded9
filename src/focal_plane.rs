use serde::{Deserialize, Serialize};

use crate::{
    utilities::ceil_even,
    validation::{finite, non_negative, path, positive, range_error, within, Result, Validate},
};

/// Largest full model output image size in pixels
pub const MAX_N_OUT: usize = 1 << 20;

/// Side(s) of the focal plane where the dark hole is dug
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sides {
    #[default]
    Both,
    Left,
    Right,
    Top,
    Bottom,
}

/// Annular sector of the focal plane, radii in λ0/D
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Angular opening in degrees
    pub angle: f64,
}
impl Default for Region {
    fn default() -> Self {
        Self {
            inner_radius: 2.,
            outer_radius: 26.,
            angle: 180.,
        }
    }
}
impl Validate for Region {
    fn validate(&self, prefix: &str) -> Result<()> {
        non_negative(prefix, "inner_radius", self.inner_radius)?;
        finite(prefix, "outer_radius", self.outer_radius)?;
        if self.outer_radius <= self.inner_radius {
            return Err(range_error(
                path(prefix, "outer_radius"),
                &format!("> inner_radius ({})", self.inner_radius),
                self.outer_radius,
            ));
        }
        within(prefix, "angle", self.angle, (0., 360.), false)
    }
}

/// Final focal plane
///
/// Default properties:
///  * resolution            : 3px per λ0/D
///  * field of view         : +/-30λ0/D
///  * correction & scoring  : 2 to 26λ0/D over 180degree
///  * sides                 : both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocalPlane {
    /// Sampling in pixels per λ0/D
    pub resolution: f64,
    /// Half-width of the field of view in λ0/D
    pub half_fov: f64,
    /// Dark hole correction region
    pub correction: Region,
    /// Dark hole scoring region
    pub scoring: Region,
    pub sides: Sides,
}
impl Default for FocalPlane {
    fn default() -> Self {
        Self {
            resolution: 3.,
            half_fov: 30.,
            correction: Default::default(),
            scoring: Default::default(),
            sides: Sides::Both,
        }
    }
}
impl FocalPlane {
    /// Size in pixels of the full model output image
    ///
    /// Smallest even integer >= 1 + 2 x resolution x half FOV
    pub fn n_out(&self) -> usize {
        ceil_even(1. + self.resolution * 2. * self.half_fov)
    }
    /// Sampling of the output image in λ0/D
    pub fn sampling(&self) -> f64 {
        self.resolution.recip()
    }
}
impl Validate for FocalPlane {
    fn validate(&self, prefix: &str) -> Result<()> {
        positive(prefix, "resolution", self.resolution)?;
        positive(prefix, "half_fov", self.half_fov)?;
        let n_out = 1. + self.resolution * 2. * self.half_fov;
        if n_out > MAX_N_OUT as f64 {
            return Err(range_error(
                path(prefix, "resolution"),
                &format!(
                    "such that 1 + 2 x resolution x half_fov ({}) <= {MAX_N_OUT}",
                    self.half_fov
                ),
                self.resolution,
            ));
        }
        self.correction.validate(&path(prefix, "correction"))?;
        self.scoring.validate(&path(prefix, "scoring"))?;
        for (name, region) in [("correction", &self.correction), ("scoring", &self.scoring)] {
            if region.outer_radius > self.half_fov {
                log::warn!(
                    "{} region outer radius ({}λ0/D) extends beyond the field of view ({}λ0/D)",
                    name,
                    region.outer_radius,
                    self.half_fov
                );
            }
        }
        Ok(())
    }
}
