//! DM calibration maps read from FITS files

use std::path::Path;

use fitsio::{hdu::HduInfo, FitsFile};
use nalgebra::DMatrix;

use crate::ResourceError;

/// Reads a `n_actuator`x`n_actuator` DM map from the primary HDU of a FITS file
pub fn read_dm_map<P: AsRef<Path>>(
    path: P,
    n_actuator: usize,
) -> std::result::Result<DMatrix<f64>, ResourceError> {
    let path = path.as_ref();
    match path.try_exists() {
        Ok(true) => (),
        Ok(false) => return Err(ResourceError::Missing(path.to_path_buf())),
        Err(e) => return Err(ResourceError::Access(e, path.to_path_buf())),
    }
    let fits_error = |e: fitsio::errors::Error| ResourceError::Fits(e, path.to_path_buf());
    let mut fptr = FitsFile::open(path).map_err(fits_error)?;
    let hdu = fptr.primary_hdu().map_err(fits_error)?;
    let shape = match &hdu.info {
        HduInfo::ImageInfo { shape, .. } if shape.len() == 2 => shape.clone(),
        _ => return Err(ResourceError::NotAnImage(path.to_path_buf())),
    };
    let expected = (n_actuator, n_actuator);
    if (shape[0], shape[1]) != expected {
        return Err(ResourceError::Shape {
            path: path.to_path_buf(),
            expected,
            found: shape,
        });
    }
    let data: Vec<f64> = hdu.read_image(&mut fptr).map_err(fits_error)?;
    log::debug!(
        "read {}x{} DM map from {}",
        shape[0],
        shape[1],
        path.display()
    );
    Ok(DMatrix::from_row_slice(shape[0], shape[1], &data))
}
