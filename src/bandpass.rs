use serde::{Deserialize, Serialize};

use crate::{
    utilities::linspace,
    validation::{at_least, between, positive, Result, Validate},
};

/// Spectral sampling of the whole bandpass
///
/// Default properties:
///  * wavelength           : 550nm
///  * fractional bandwidth : 10%
///  * \# sub-bands          : 5
///  * \# wavelengths       : 1 per sub-band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bandpass {
    /// Center wavelength of the whole bandpass in meters
    pub wavelength: f64,
    /// Bandwidth over center wavelength
    pub fractional_bandwidth: f64,
    /// Number of sub-bands used for estimation and control
    pub n_subband: usize,
    /// Number of wavelengths approximating an image in each sub-band
    pub n_wavelength: usize,
}
impl Default for Bandpass {
    fn default() -> Self {
        Self {
            wavelength: 550e-9,
            fractional_bandwidth: 0.1,
            n_subband: 5,
            n_wavelength: 1,
        }
    }
}
impl Bandpass {
    /// Center wavelength in micrometers
    pub fn wavelength_um(&self) -> f64 {
        self.wavelength * 1e6
    }
    /// Width of one sub-band in meters
    pub fn subband_width(&self) -> f64 {
        self.fractional_bandwidth * self.wavelength / self.n_subband as f64
    }
    /// Center wavelengths of the sub-bands in meters
    pub fn subband_centers(&self) -> Vec<f64> {
        if self.n_subband < 2 {
            return vec![self.wavelength];
        }
        let half_bw = 0.5 * self.fractional_bandwidth;
        let half_sbp = half_bw / self.n_subband as f64;
        linspace(1. - half_bw + half_sbp, 1. + half_bw - half_sbp, self.n_subband)
            .into_iter()
            .map(|x| x * self.wavelength)
            .collect()
    }
    /// Wavelengths sampling the sub-band `subband` (zero based index)
    ///
    /// Returns `None` if the sub-band does not exist
    pub fn wavelengths(&self, subband: usize) -> Option<Vec<f64>> {
        let center = *self.subband_centers().get(subband)?;
        if self.n_wavelength < 2 {
            return Some(vec![center]);
        }
        let half_width = if self.n_subband < 2 {
            0.5 * self.fractional_bandwidth * self.wavelength
        } else {
            0.5 * self.subband_width()
        };
        Some(linspace(
            center - half_width,
            center + half_width,
            self.n_wavelength,
        ))
    }
}
impl Validate for Bandpass {
    fn validate(&self, prefix: &str) -> Result<()> {
        positive(prefix, "wavelength", self.wavelength)?;
        between(
            prefix,
            "fractional_bandwidth",
            self.fractional_bandwidth,
            (0., 1.),
        )?;
        at_least(prefix, "n_subband", self.n_subband, 1)?;
        at_least(prefix, "n_wavelength", self.n_wavelength, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subband_centers() {
        let bp = Bandpass::default();
        let centers = bp.subband_centers();
        assert_eq!(centers.len(), 5);
        assert!((centers[2] - 550e-9).abs() < 1e-18);
        assert!((centers[0] - 550e-9 * 0.96).abs() < 1e-18);
        assert!((centers[4] - 550e-9 * 1.04).abs() < 1e-18);
    }

    #[test]
    fn monochromatic() {
        let bp = Bandpass {
            n_subband: 1,
            ..Default::default()
        };
        assert_eq!(bp.subband_centers(), vec![550e-9]);
        assert_eq!(bp.wavelengths(0), Some(vec![550e-9]));
        assert_eq!(bp.wavelengths(1), None);
    }

    #[test]
    fn wavelengths_span_subband() {
        let bp = Bandpass {
            n_wavelength: 3,
            ..Default::default()
        };
        let lambdas = bp.wavelengths(2).unwrap();
        assert_eq!(lambdas.len(), 3);
        assert!((lambdas[1] - 550e-9).abs() < 1e-18);
        assert!((lambdas[2] - lambdas[0] - bp.subband_width()).abs() < 1e-18);
    }

    #[test]
    fn bandwidth_bounds() {
        assert!(Bandpass::default().validate("bandpass").is_ok());
        for fractional_bandwidth in [0., 1., -0.1] {
            let err = Bandpass {
                fractional_bandwidth,
                ..Default::default()
            }
            .validate("bandpass")
            .unwrap_err();
            assert_eq!(err.field(), "bandpass.fractional_bandwidth");
        }
        let err = Bandpass {
            n_subband: 0,
            ..Default::default()
        }
        .validate("bandpass")
        .unwrap_err();
        assert_eq!(err.field(), "bandpass.n_subband");
    }
}
