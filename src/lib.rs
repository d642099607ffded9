//!
//! # Coronagraph simulation configuration
//!
//! Typed and validated settings of a high-contrast imaging simulation:
//! a telescope with a vortex (or other) coronagraph, two deformable mirrors,
//! wavefront estimation by pairwise probing and electric field conjugation control.
//!
//! The configuration is created with its builder, every unspecified setting takes its default value:
//! ```rust
//! use coronagraph_config::{Builder, Config, FromBuilder};
//!
//! let config = Config::builder()
//!     .set("estimator.kind", "exact")
//!     .set("controller.kind", "grid-search-EFC")
//!     .set("dm1.n_actuator", 64)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.full_nout(), 182);
//! assert_eq!(config.full_narr(), 512);
//! ```
//! Invalid settings are reported with their dotted path:
//! ```rust
//! use coronagraph_config::{Builder, Config, FromBuilder};
//!
//! let err = Config::builder()
//!     .set("estimator.kind", "psd")
//!     .build()
//!     .unwrap_err();
//! assert_eq!(err.validation().unwrap().field(), "estimator.kind");
//! ```

pub mod bandpass;
pub mod calibration;
pub mod config;
pub mod controller;
pub mod dm;
pub mod error;
pub mod estimator;
pub mod evaluation;
pub mod focal_plane;
pub mod jacobian;
pub mod models;
pub mod optics;
pub mod pupil;
pub mod utilities;
pub mod validation;
pub mod vortex;

#[doc(inline)]
pub use self::bandpass::Bandpass;
#[doc(inline)]
pub use self::config::{Config, ConfigBuilder, ConfigBuilderError, Settings};
#[doc(inline)]
pub use self::controller::{Controller, ControllerKind};
#[doc(inline)]
pub use self::dm::DeformableMirror;
#[doc(inline)]
pub use self::error::{ConfigError, ResourceError, ValidationError};
#[doc(inline)]
pub use self::estimator::{Estimator, EstimatorKind};
#[doc(inline)]
pub use self::focal_plane::FocalPlane;
#[doc(inline)]
pub use self::optics::Coronagraph;
#[doc(inline)]
pub use self::pupil::{Fidelity, Plane, PupilPlane};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Builder type trait
pub trait Builder: Default {
    type Component;
    fn new() -> Self {
        Default::default()
    }
    fn build(self) -> Result<Self::Component>;
}

/// Access to a component builder from the component type
pub trait FromBuilder: Sized {
    type ComponentBuilder: Builder<Component = Self>;
    fn builder() -> Self::ComponentBuilder {
        Self::ComponentBuilder::new()
    }
}
