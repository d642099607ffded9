//! Serde adapter writing a [`DMatrix`] as a list of rows
//!
//! Use with `#[serde(with = "crate::utilities::grid")]`

use nalgebra::DMatrix;
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S: Serializer>(grid: &DMatrix<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    let rows: Vec<Vec<f64>> = grid
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect();
    rows.serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DMatrix<f64>, D::Error> {
    let rows = Vec::<Vec<f64>>::deserialize(deserializer)?;
    let n_row = rows.len();
    let n_col = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n_col) {
        return Err(D::Error::custom(format!(
            "ragged grid: row {i} has {} columns, expected {n_col}",
            row.len()
        )));
    }
    Ok(DMatrix::from_row_iterator(
        n_row,
        n_col,
        rows.into_iter().flatten(),
    ))
}

#[cfg(test)]
mod tests {
    use nalgebra::DMatrix;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        grid: DMatrix<f64>,
    }

    #[test]
    fn row_major_layout() {
        let holder = Holder {
            grid: DMatrix::from_row_slice(2, 3, &[1., 2., 3., 4., 5., 6.]),
        };
        let toml = toml::to_string(&holder).unwrap();
        let table: toml::Table = toml::from_str(&toml).unwrap();
        let rows = table["grid"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].as_array().unwrap()[0].as_float(), Some(4.));
        let back: Holder = toml::from_str(&toml).unwrap();
        assert_eq!(back, holder);
    }

    #[test]
    fn ragged_rows() {
        let err = toml::from_str::<Holder>("grid = [[1.0, 2.0], [3.0]]").unwrap_err();
        assert!(err.message().contains("ragged grid"));
    }
}
