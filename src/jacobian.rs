use serde::{Deserialize, Serialize};

use crate::{
    validation::{path, Result, Validate},
    ValidationError,
};

/// Zernike modes included in the control Jacobian
///
/// The on-axis piston mode (Noll index 1) is always included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jacobian {
    /// Noll indices
    pub zernikes: Vec<usize>,
    /// RMS of the Zernike aberrations in meters
    pub zernike_coefs: Vec<f64>,
}
impl Default for Jacobian {
    fn default() -> Self {
        Self {
            zernikes: vec![1],
            zernike_coefs: vec![1e-9],
        }
    }
}
impl Validate for Jacobian {
    fn validate(&self, prefix: &str) -> Result<()> {
        if !self.zernikes.contains(&1) || self.zernikes.contains(&0) {
            return Err(ValidationError::Invalid {
                field: path(prefix, "zernikes"),
                reason: format!(
                    "Noll indices must be >= 1 and include the piston mode, found {:?}",
                    self.zernikes
                ),
            });
        }
        if self.zernike_coefs.len() != self.zernikes.len() {
            return Err(ValidationError::Mismatch {
                field: path(prefix, "zernike_coefs"),
                value: format!("{} coefficients", self.zernike_coefs.len()),
                other: path(prefix, "zernikes"),
                other_value: format!("{} modes", self.zernikes.len()),
                reason: "one coefficient per mode".into(),
            });
        }
        if let Some(c) = self.zernike_coefs.iter().find(|c| !c.is_finite()) {
            return Err(crate::validation::range_error(
                path(prefix, "zernike_coefs"),
                "finite",
                c,
            ));
        }
        Ok(())
    }
}
