//! Range checks shared by the configuration sections

use std::fmt::Display;

use crate::ValidationError;

pub type Result<T> = std::result::Result<T, ValidationError>;

/// A configuration section that checks its own invariants
///
/// `prefix` is the dotted path of the section in the configuration (`dm1`, `fend.correction`, ...)
pub trait Validate {
    fn validate(&self, prefix: &str) -> Result<()>;
}

/// Joins a section prefix and a field name into a dotted path
pub fn path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}

pub(crate) fn range_error<T: Display>(field: String, constraint: &str, value: T) -> ValidationError {
    ValidationError::Range {
        field,
        constraint: constraint.to_owned(),
        value: value.to_string(),
    }
}

/// Checks that `value` is neither NaN nor infinite
pub(crate) fn finite(prefix: &str, name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(range_error(path(prefix, name), "finite", value))
    }
}

pub(crate) fn positive(prefix: &str, name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(range_error(path(prefix, name), "finite and > 0", value))
    }
}

pub(crate) fn non_negative(prefix: &str, name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0. {
        Ok(())
    } else {
        Err(range_error(path(prefix, name), "finite and >= 0", value))
    }
}

pub(crate) fn at_least(prefix: &str, name: &str, value: usize, min: usize) -> Result<()> {
    if value >= min {
        Ok(())
    } else {
        Err(range_error(path(prefix, name), &format!(">= {min}"), value))
    }
}

/// Checks that `value` lies in the interval `(lower, upper]` or `[lower, upper]`
pub(crate) fn within(
    prefix: &str,
    name: &str,
    value: f64,
    (lower, upper): (f64, f64),
    lower_inclusive: bool,
) -> Result<()> {
    let above = if lower_inclusive {
        value >= lower
    } else {
        value > lower
    };
    if value.is_finite() && above && value <= upper {
        Ok(())
    } else {
        let open = if lower_inclusive { '[' } else { '(' };
        Err(range_error(
            path(prefix, name),
            &format!("in {open}{lower}, {upper}]"),
            value,
        ))
    }
}

/// Checks that `value` lies in the open interval `(lower, upper)`
pub(crate) fn between(prefix: &str, name: &str, value: f64, (lower, upper): (f64, f64)) -> Result<()> {
    if value.is_finite() && value > lower && value < upper {
        Ok(())
    } else {
        Err(range_error(
            path(prefix, name),
            &format!("in ({lower}, {upper})"),
            value,
        ))
    }
}

/// Checks that every DM index is 1 or 2 and that there are no duplicates
pub(crate) fn dm_indices(prefix: &str, name: &str, dms: &[usize]) -> Result<()> {
    if dms.is_empty() {
        return Err(range_error(path(prefix, name), "a non-empty subset of {1, 2}", "[]"));
    }
    let mut seen = [false; 2];
    for &dm in dms {
        match dm {
            1 | 2 if !seen[dm - 1] => seen[dm - 1] = true,
            _ => {
                return Err(range_error(
                    path(prefix, name),
                    "a subset of {1, 2} without duplicates",
                    format!("{dms:?}"),
                ))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_path() {
        assert_eq!(path("", "series"), "series");
        assert_eq!(path("fend.correction", "angle"), "fend.correction.angle");
    }

    #[test]
    fn interval_bounds() {
        assert!(within("fend.correction", "angle", 360., (0., 360.), false).is_ok());
        let err = within("fend.correction", "angle", 0., (0., 360.), false).unwrap_err();
        assert_eq!(err.field(), "fend.correction.angle");
        assert!(within("p1", "inner_diameter", 0., (0., 1.), true).is_ok());
        assert!(between("bandpass", "fractional_bandwidth", 1., (0., 1.)).is_err());
        assert!(within("p4", "outer_diameter", f64::NAN, (0., 1.), false).is_err());
    }

    #[test]
    fn non_finite() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(positive("dm1", "pitch", value).unwrap_err().field(), "dm1.pitch");
            assert!(non_negative("dm1", "weight", value).is_err());
            assert!(finite("dm1", "x_tilt", value).is_err());
        }
        assert!(positive("fend", "resolution", 1e300).is_ok());
        assert!(finite("dm1", "x_tilt", -3.).is_ok());
    }

    #[test]
    fn dm_index_set() {
        assert!(dm_indices("controller", "dm_ind", &[1, 2]).is_ok());
        assert!(dm_indices("controller", "dm_ind", &[2]).is_ok());
        assert!(dm_indices("controller", "dm_ind", &[]).is_err());
        assert!(dm_indices("controller", "dm_ind", &[1, 1]).is_err());
        assert!(dm_indices("controller", "dm_ind", &[3]).is_err());
    }
}
