use serde::{Deserialize, Serialize};

use crate::validation::{finite, non_negative, Result, Validate};

/// Coronagraph types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coronagraph {
    #[default]
    #[serde(alias = "VC")]
    Vortex,
    #[serde(alias = "AVC")]
    ApodizedVortex,
    #[serde(alias = "LC")]
    Lyot,
    #[serde(alias = "HLC")]
    HybridLyot,
    #[serde(alias = "SPC")]
    ShapedPupil,
    #[serde(alias = "SPLC")]
    ShapedPupilLyot,
}
impl Coronagraph {
    /// Vortex coronagraphs require the Lyot stop plane to be sampled like the entrance pupil
    pub fn is_vortex(&self) -> bool {
        matches!(self, Self::Vortex | Self::ApodizedVortex)
    }
}

/// Optical layout of the full model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Fourier,
    #[default]
    Proper,
}

/// Entrance pupil generator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PupilShape {
    Simple,
    #[default]
    #[serde(alias = "simpleproper")]
    SimpleProper,
}
impl PupilShape {
    /// Simple pupils have the same diameter in P2, P3 and P4
    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Simple | Self::SimpleProper)
    }
}

/// Optical layout choices common to all models
///
/// Default properties:
///  * coronagraph  : vortex
///  * layout       : PROPER
///  * pupil        : simple PROPER
///  * simulation   : true
///  * apodizer     : false
///  * DM WFE       : false
///  * P2 to DM1    : 0m
///  * DM1 to DM2   : 0.32m
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optics {
    pub coronagraph: Coronagraph,
    pub layout: Layout,
    pub pupil: PupilShape,
    pub simulation: bool,
    pub apodizer: bool,
    /// Apply DM wavefront error maps
    pub dm_wfe: bool,
    /// Distance along +z from the P2 pupil to DM1 in meters
    pub p2_to_dm1: f64,
    /// Distance from DM1 to DM2 in meters
    pub dm1_to_dm2: f64,
}
impl Default for Optics {
    fn default() -> Self {
        Self {
            coronagraph: Coronagraph::Vortex,
            layout: Layout::Proper,
            pupil: PupilShape::SimpleProper,
            simulation: true,
            apodizer: false,
            dm_wfe: false,
            p2_to_dm1: 0.,
            dm1_to_dm2: 0.32,
        }
    }
}
impl Validate for Optics {
    fn validate(&self, prefix: &str) -> Result<()> {
        finite(prefix, "p2_to_dm1", self.p2_to_dm1)?;
        non_negative(prefix, "dm1_to_dm2", self.dm1_to_dm2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dm_distances() {
        assert!(Optics::default().validate("optics").is_ok());
        let optics = Optics {
            p2_to_dm1: f64::NAN,
            ..Default::default()
        };
        assert_eq!(optics.validate("optics").unwrap_err().field(), "optics.p2_to_dm1");
        let optics = Optics {
            dm1_to_dm2: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(optics.validate("optics").unwrap_err().field(), "optics.dm1_to_dm2");
    }

    #[derive(Deserialize)]
    struct Holder {
        coronagraph: Coronagraph,
        pupil: PupilShape,
    }

    #[test]
    fn names() {
        let h: Holder = toml::from_str(
            r#"
coronagraph = "VC"
pupil = "simpleproper"
"#,
        )
        .unwrap();
        assert_eq!(h.coronagraph, Coronagraph::Vortex);
        assert_eq!(h.pupil, PupilShape::SimpleProper);
        let h: Holder = toml::from_str(
            r#"
coronagraph = "hybrid-lyot"
pupil = "simple"
"#,
        )
        .unwrap();
        assert!(!h.coronagraph.is_vortex());
        assert!(Coronagraph::ApodizedVortex.is_vortex());
    }
}
