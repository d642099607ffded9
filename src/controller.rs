//!
//! # Wavefront control settings
//!
//! The controller kind is a tagged variant: each kind carries its own parameters,
//! the unselected kinds are simply not constructed.
//!
//! ```toml
//! [controller]
//! kind = "grid-search-EFC"
//! use_model = true
//! dm_ind = [1, 2]
//! log_g_min = -6.0
//! spatial_weights = []
//! log10_reg = [-6.0, -5.5, -5.0, -4.5, -4.0, -3.5, -3.0, -2.5, -2.0]
//! dm_fac = [1.0]
//! n_itr = 5
//! relin_itr = [0, 1, 2, 3, 4]
//! ```

use serde::{Deserialize, Serialize};

use crate::validation::{dm_indices, path, range_error, Result, Validate};

mod schedule;
pub use schedule::{expand, Plan, Regularization, ScheduleRow, MAX_ITERATIONS};

/// Empirical grid search over the EFC tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSearch {
    /// log10 of the regularization values to search over
    pub log10_reg: Vec<f64>,
    /// Gains applied to the total DM command
    pub dm_fac: Vec<f64>,
    /// Number of estimation and control iterations
    pub n_itr: usize,
    /// Iterations (zero based) at which the control Jacobian is recomputed
    pub relin_itr: Vec<usize>,
}
impl Default for GridSearch {
    fn default() -> Self {
        let n_itr = 5;
        Self {
            log10_reg: (0..9).map(|i| -6. + 0.5 * i as f64).collect(),
            dm_fac: vec![1.],
            n_itr,
            relin_itr: (0..n_itr).collect(),
        }
    }
}
impl GridSearch {
    fn plan(&self, dm_ind: &[usize]) -> Plan {
        Plan {
            n_itr: self.n_itr,
            relin_itr: self.relin_itr.clone(),
            grid_search_itr: (0..self.n_itr).collect(),
            regularization: vec![Regularization::RelativeToBest(0.); self.n_itr],
            dms: vec![dm_ind.to_vec(); self.n_itr],
        }
    }
    fn validate(&self, prefix: &str) -> Result<()> {
        sweep(prefix, &self.log10_reg, &self.dm_fac)?;
        if !(1..=MAX_ITERATIONS).contains(&self.n_itr) {
            return Err(range_error(
                path(prefix, "n_itr"),
                &format!("in [1, {MAX_ITERATIONS}]"),
                self.n_itr,
            ));
        }
        if let Some(itr) = self.relin_itr.iter().find(|&&itr| itr >= self.n_itr) {
            return Err(range_error(
                path(prefix, "relin_itr"),
                &format!("iterations < n_itr ({})", self.n_itr),
                itr,
            ));
        }
        Ok(())
    }
}

/// EFC with a planned regularization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannedSchedule {
    pub log10_reg: Vec<f64>,
    pub dm_fac: Vec<f64>,
    pub schedule: Vec<ScheduleRow>,
}
/// 4 iterations at the best regularization, 25 at one decade below the best
/// and a final one at the best, relinearizing and searching at every iteration
impl Default for PlannedSchedule {
    fn default() -> Self {
        Self {
            log10_reg: GridSearch::default().log10_reg,
            dm_fac: vec![1.],
            schedule: vec![
                ScheduleRow::new(4, Regularization::RelativeToBest(0.)),
                ScheduleRow::new(25, Regularization::RelativeToBest(-1.)),
                ScheduleRow::new(1, Regularization::RelativeToBest(0.)),
            ],
        }
    }
}
impl PlannedSchedule {
    pub fn plan(&self) -> Plan {
        expand(&self.schedule)
    }
    fn validate(&self, prefix: &str) -> Result<()> {
        sweep(prefix, &self.log10_reg, &self.dm_fac)?;
        schedule::validate_rows(&path(prefix, "schedule"), &self.schedule)
    }
}

/// Wavefront control law
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ControllerKind {
    #[serde(rename = "grid-search-EFC", alias = "gridsearchEFC")]
    GridSearchEfc(GridSearch),
    #[serde(rename = "planned-EFC", alias = "plannedEFC")]
    PlannedEfc(PlannedSchedule),
    /// Constrained EFC with a convex solver, development only
    #[serde(rename = "convex-EFC", alias = "SM-CVX")]
    ConvexEfc(GridSearch),
}
impl Default for ControllerKind {
    fn default() -> Self {
        Self::GridSearchEfc(Default::default())
    }
}
impl ControllerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GridSearchEfc(_) => "grid-search-EFC",
            Self::PlannedEfc(_) => "planned-EFC",
            Self::ConvexEfc(_) => "convex-EFC",
        }
    }
    pub fn is_experimental(&self) -> bool {
        matches!(self, Self::ConvexEfc(_))
    }
}

/// Wavefront control settings
///
/// Default properties:
///  * kind      : grid search EFC, 5 iterations, log10(regularization) from -6 to -2 by 0.5
///  * use model : true
///  * DMs       : 1 and 2
///  * log10(G) min : -6
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    #[serde(flatten)]
    pub kind: ControllerKind,
    /// Model-based grid search with the compact model
    pub use_model: bool,
    /// DMs used by the controller at any time
    pub dm_ind: Vec<usize>,
    /// Actuators with a Jacobian intensity below 10^log_g_min are culled
    pub log_g_min: f64,
    /// Spatial Jacobian weighting by annulus: [inner radius, outer radius, weight]
    pub spatial_weights: Vec<[f64; 3]>,
}
impl Default for Controller {
    fn default() -> Self {
        Self {
            kind: Default::default(),
            use_model: true,
            dm_ind: vec![1, 2],
            log_g_min: -6.,
            spatial_weights: vec![],
        }
    }
}
impl Controller {
    pub fn new(kind: ControllerKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }
    /// Iteration by iteration control plan
    pub fn plan(&self) -> Plan {
        match &self.kind {
            ControllerKind::GridSearchEfc(gs) | ControllerKind::ConvexEfc(gs) => {
                gs.plan(&self.dm_ind)
            }
            ControllerKind::PlannedEfc(planned) => planned.plan(),
        }
    }
    /// Number of estimation and control iterations
    pub fn n_itr(&self) -> usize {
        match &self.kind {
            ControllerKind::GridSearchEfc(gs) | ControllerKind::ConvexEfc(gs) => gs.n_itr,
            ControllerKind::PlannedEfc(planned) => {
                schedule::total_iterations(&planned.schedule).unwrap_or(usize::MAX)
            }
        }
    }
    /// log10 of the regularization values searched over
    pub fn regularization_sweep(&self) -> &[f64] {
        match &self.kind {
            ControllerKind::GridSearchEfc(gs) | ControllerKind::ConvexEfc(gs) => &gs.log10_reg,
            ControllerKind::PlannedEfc(planned) => &planned.log10_reg,
        }
    }
    /// DM command gains searched over
    pub fn dm_gains(&self) -> &[f64] {
        match &self.kind {
            ControllerKind::GridSearchEfc(gs) | ControllerKind::ConvexEfc(gs) => &gs.dm_fac,
            ControllerKind::PlannedEfc(planned) => &planned.dm_fac,
        }
    }
    pub fn is_experimental(&self) -> bool {
        self.kind.is_experimental()
    }
}
impl Validate for Controller {
    fn validate(&self, prefix: &str) -> Result<()> {
        dm_indices(prefix, "dm_ind", &self.dm_ind)?;
        if !self.log_g_min.is_finite() {
            return Err(range_error(
                path(prefix, "log_g_min"),
                "finite",
                self.log_g_min,
            ));
        }
        for (i, &[inner, outer, weight]) in self.spatial_weights.iter().enumerate() {
            let field = format!("{}[{i}]", path(prefix, "spatial_weights"));
            let finite = inner.is_finite() && outer.is_finite() && weight.is_finite();
            if !finite || !(0. ..outer).contains(&inner) || weight < 0. {
                return Err(range_error(
                    field,
                    "finite [inner radius >= 0, outer radius > inner radius, weight >= 0]",
                    format!("{:?}", [inner, outer, weight]),
                ));
            }
        }
        match &self.kind {
            ControllerKind::GridSearchEfc(gs) | ControllerKind::ConvexEfc(gs) => {
                gs.validate(prefix)
            }
            ControllerKind::PlannedEfc(planned) => {
                planned.validate(prefix)?;
                let unused = planned
                    .schedule
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| row.iterations > 0)
                    .find(|(_, row)| row.dms.iter().any(|dm| !self.dm_ind.contains(dm)));
                if let Some((i, row)) = unused {
                    return Err(crate::ValidationError::Mismatch {
                        field: format!("{}[{i}].dms", path(prefix, "schedule")),
                        value: format!("{:?}", row.dms),
                        other: path(prefix, "dm_ind"),
                        other_value: format!("{:?}", self.dm_ind),
                        reason: "scheduled DMs must be a subset of the controller DMs".into(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Checks the grid search values: regularization non-empty and strictly monotonic, gains positive
fn sweep(prefix: &str, log10_reg: &[f64], dm_fac: &[f64]) -> Result<()> {
    let field = path(prefix, "log10_reg");
    if log10_reg.is_empty() || log10_reg.iter().any(|x| !x.is_finite()) {
        return Err(range_error(
            field,
            "a non-empty sequence of finite values",
            format!("{log10_reg:?}"),
        ));
    }
    let increasing = log10_reg.windows(2).all(|w| w[0] < w[1]);
    let decreasing = log10_reg.windows(2).all(|w| w[0] > w[1]);
    if !(increasing || decreasing) {
        return Err(range_error(
            field,
            "strictly monotonic",
            format!("{log10_reg:?}"),
        ));
    }
    if dm_fac.is_empty() || dm_fac.iter().any(|&x| !(x.is_finite() && x > 0.)) {
        return Err(range_error(
            path(prefix, "dm_fac"),
            "a non-empty sequence of finite positive gains",
            format!("{dm_fac:?}"),
        ));
    }
    Ok(())
}
