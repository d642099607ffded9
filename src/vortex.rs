use serde::{Deserialize, Serialize};

use crate::validation::{path, range_error, Result, Validate};

/// Vortex focal plane mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VortexMask {
    /// Topological charge
    pub charge: u32,
}
impl Default for VortexMask {
    fn default() -> Self {
        Self { charge: 6 }
    }
}
impl Validate for VortexMask {
    fn validate(&self, prefix: &str) -> Result<()> {
        if self.charge == 0 {
            return Err(range_error(path(prefix, "charge"), "a positive integer", 0));
        }
        Ok(())
    }
}
