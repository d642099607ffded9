use serde::{Deserialize, Serialize};

use crate::validation::{dm_indices, path, range_error, Result};

/// Largest number of estimation and control iterations of a run
pub const MAX_ITERATIONS: usize = 100_000;

/// Regularization applied at one iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regularization {
    /// log10 of the regularization
    Fixed(f64),
    /// Offset added to the best log10 regularization found by the grid search
    RelativeToBest(f64),
}
impl Regularization {
    pub fn is_relative(&self) -> bool {
        matches!(self, Self::RelativeToBest(_))
    }
}

/// One line of a planned EFC schedule
///
/// The row settings apply to each of its `iterations`.
/// A row with 0 iterations and `relinearize` set asks for the Jacobian
/// to be recomputed at the next iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub iterations: usize,
    pub regularization: Regularization,
    /// DMs used for control at these iterations
    pub dms: Vec<usize>,
    /// Recompute the control Jacobian
    pub relinearize: bool,
    /// Search the EFC parameters giving the best contrast
    pub grid_search: bool,
}
impl ScheduleRow {
    pub fn new(iterations: usize, regularization: Regularization) -> Self {
        Self {
            iterations,
            regularization,
            dms: vec![1, 2],
            relinearize: true,
            grid_search: true,
        }
    }
}

/// Expanded iteration by iteration control plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// Total number of estimation and control iterations
    pub n_itr: usize,
    /// Iterations (zero based) at which the Jacobian is recomputed
    pub relin_itr: Vec<usize>,
    /// Iterations at which an EFC parameter grid search is performed
    pub grid_search_itr: Vec<usize>,
    /// Regularization of each iteration
    pub regularization: Vec<Regularization>,
    /// DMs used at each iteration
    pub dms: Vec<Vec<usize>>,
}
impl Plan {
    /// Sorted union of the DMs used over the whole plan
    pub fn dm_union(&self) -> Vec<usize> {
        let mut dms: Vec<usize> = self.dms.iter().flatten().copied().collect();
        dms.sort_unstable();
        dms.dedup();
        dms
    }
}

/// Expands schedule rows into a [`Plan`]
pub fn expand(rows: &[ScheduleRow]) -> Plan {
    let mut plan = Plan::default();
    let mut pending_relin = false;
    for row in rows {
        if row.iterations == 0 {
            pending_relin |= row.relinearize;
            continue;
        }
        for _ in 0..row.iterations {
            let itr = plan.n_itr;
            if row.relinearize || pending_relin {
                plan.relin_itr.push(itr);
                pending_relin = false;
            }
            if row.grid_search {
                plan.grid_search_itr.push(itr);
            }
            plan.regularization.push(row.regularization);
            plan.dms.push(row.dms.clone());
            plan.n_itr += 1;
        }
    }
    plan
}

/// Total number of iterations of a schedule, `None` on overflow
pub(crate) fn total_iterations(rows: &[ScheduleRow]) -> Option<usize> {
    rows.iter()
        .try_fold(0usize, |total, row| total.checked_add(row.iterations))
}

pub(crate) fn validate_rows(prefix: &str, rows: &[ScheduleRow]) -> Result<()> {
    let constraint = format!("a schedule of 1 to {MAX_ITERATIONS} iterations");
    match total_iterations(rows) {
        Some(n_itr) if (1..=MAX_ITERATIONS).contains(&n_itr) => (),
        Some(n_itr) => return Err(range_error(prefix.to_owned(), &constraint, n_itr)),
        None => return Err(range_error(prefix.to_owned(), &constraint, "overflow")),
    }
    for (i, row) in rows.iter().enumerate() {
        let row_path = format!("{prefix}[{i}]");
        if row.iterations == 0 {
            continue;
        }
        dm_indices(&row_path, "dms", &row.dms)?;
        match row.regularization {
            Regularization::RelativeToBest(_) if !row.grid_search => {
                return Err(crate::ValidationError::Invalid {
                    field: path(&row_path, "grid_search"),
                    reason: "a regularization relative to the best one requires a grid search"
                        .into(),
                })
            }
            Regularization::Fixed(x) | Regularization::RelativeToBest(x) if !x.is_finite() => {
                return Err(range_error(path(&row_path, "regularization"), "finite", x))
            }
            _ => (),
        }
    }
    Ok(())
}
