use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::{
    calibration::read_dm_map,
    controller::Controller,
    dm::DeformableMirror,
    estimator::Estimator,
    optics::Coronagraph,
    validation::path,
    Builder, Result, ValidationError,
};

use super::{Config, Settings};

/// [`Config`] builder
///
/// The builder holds the base [`Settings`] and a partial override table.
/// Overrides are merged on top of the settings when the configuration is built.
///
/// Overriding `dmX.n_actuator` by path requires a `dmX.gain` of the same size,
/// [`DeformableMirror::n_actuator`] resizes both at once
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigBuilder {
    settings: Settings,
    overrides: Table,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigBuilderError {
    #[error("cannot open `::coronagraph_config::Config` toml file: {1}")]
    Open(#[source] std::io::Error, PathBuf),
    #[error("cannot create `::coronagraph_config::Config` toml file: {1}")]
    Create(#[source] std::io::Error, PathBuf),
    #[error("cannot read `::coronagraph_config::Config` toml file: {1}")]
    Read(#[source] std::io::Error, PathBuf),
    #[error("cannot write `::coronagraph_config::Config` toml file: {1}")]
    Write(#[source] std::io::Error, PathBuf),
    #[error("cannot deserialize `::coronagraph_config::Config` from toml")]
    Load(#[from] toml::de::Error),
    #[error("cannot serialize `::coronagraph_config::Config` into toml")]
    Save(#[from] toml::ser::Error),
    #[error("cannot save an invalid `::coronagraph_config::Config`")]
    Invalid(#[from] ValidationError),
}

/// ## `Config` builder
impl ConfigBuilder {
    /// Load a partial configuration from a toml file
    ///
    /// The file content is used as overrides of the default settings
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigBuilderError> {
        let mut file = File::open(&path)
            .map_err(|e| ConfigBuilderError::Open(e, path.as_ref().to_path_buf()))?;
        let mut toml = String::new();
        file.read_to_string(&mut toml)
            .map_err(|e| ConfigBuilderError::Read(e, path.as_ref().to_path_buf()))?;
        let overrides: Table = toml::from_str(&toml)?;
        log::debug!("loaded overrides from {}", path.as_ref().display());
        Ok(Self::default().overrides(overrides))
    }
    /// Save the settings merged with the overrides into a toml file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), ConfigBuilderError> {
        let toml = toml::to_string_pretty(&self.resolve()?)?;
        let mut file = File::create(&path)
            .map_err(|e| ConfigBuilderError::Create(e, path.as_ref().to_path_buf()))?;
        write!(file, "# ::coronagraph_config::Config\n\n{}", toml)
            .map_err(|e| ConfigBuilderError::Write(e, path.as_ref().to_path_buf()))?;
        Ok(())
    }
    /// Overrides a single setting given its dotted path, e.g. `("estimator.kind", "pwp-bp")`
    pub fn set<V: Into<Value>>(self, path: &str, value: V) -> Self {
        let mut table = Table::new();
        insert_at(&mut table, path, value.into());
        self.overrides(table)
    }
    /// Merges a nested partial table into the overrides
    pub fn overrides(mut self, overrides: Table) -> Self {
        merge(&mut self.overrides, overrides);
        self
    }
    /// Replaces all the base settings
    pub fn settings(self, settings: Settings) -> Self {
        Self { settings, ..self }
    }
    pub fn estimator(mut self, estimator: Estimator) -> Self {
        self.settings.estimator = estimator;
        self
    }
    pub fn controller(mut self, controller: Controller) -> Self {
        self.settings.controller = controller;
        self
    }
    pub fn dm1(mut self, dm1: DeformableMirror) -> Self {
        self.settings.dm1 = dm1;
        self
    }
    pub fn dm2(mut self, dm2: DeformableMirror) -> Self {
        self.settings.dm2 = dm2;
        self
    }
    pub fn coronagraph(mut self, coronagraph: Coronagraph) -> Self {
        self.settings.optics.coronagraph = coronagraph;
        self
    }
    /// Sets the directory of the full model error maps and DM flat map
    pub fn map_dir<P: AsRef<Path>>(mut self, map_dir: P) -> Self {
        self.settings.full = self.settings.full.map_dir(map_dir);
        self
    }
    /// Merges the overrides into the settings
    fn resolve(&self) -> std::result::Result<Settings, ValidationError> {
        let defaults = to_table(&self.settings)?;
        let mut table = defaults.clone();
        merge(&mut table, self.overrides.clone());
        let mut decoder = Decoder {
            table,
            defaults: &defaults,
            overrides: &self.overrides,
        };
        let settings = Settings {
            series: decoder.section("series")?,
            trial: decoder.section("trial")?,
            multiprocessing: decoder.section("multiprocessing")?,
            plotting: decoder.section("plotting")?,
            gpu: decoder.section("gpu")?,
            centering: decoder.section("centering")?,
            bandpass: decoder.section("bandpass")?,
            estimator: decoder.section("estimator")?,
            controller: decoder.section("controller")?,
            jacobian: decoder.section("jacobian")?,
            evaluation: decoder.section("evaluation")?,
            dm1: decoder.section("dm1")?,
            dm2: decoder.section("dm2")?,
            optics: decoder.section("optics")?,
            p1: decoder.section("p1")?,
            p2: decoder.section("p2")?,
            p3: decoder.section("p3")?,
            p4: decoder.section("p4")?,
            fend: decoder.section("fend")?,
            compact: decoder.section("compact")?,
            full: decoder.section("full")?,
            vortex: decoder.section("vortex")?,
        };
        unknown_keys(&to_table(&settings)?, &self.overrides, "")?;
        Ok(settings)
    }
}

/// A fresh builder with the settings of an existing configuration
impl From<&Config> for ConfigBuilder {
    fn from(config: &Config) -> Self {
        Self {
            settings: config.settings.clone(),
            overrides: Table::new(),
        }
    }
}

impl Builder for ConfigBuilder {
    type Component = Config;
    fn build(self) -> Result<Config> {
        let settings = self.resolve()?;
        let config = Config::new(settings)?;
        if config.estimator().is_experimental() {
            log::warn!(
                "{:?} estimator is experimental",
                config.estimator().kind
            );
        }
        if config.controller().is_experimental() {
            log::warn!(
                "{} controller is experimental",
                config.controller().kind.name()
            );
        }
        let config = match config.full().dm1_flat_map_path() {
            Some(flat_map) => {
                let map = read_dm_map(flat_map, config.dm1().n_actuator)?;
                config.with_dm1_flat_map(map)
            }
            None => config,
        };
        log::debug!(
            "full model: {} px image, {} px array, {} px pupil",
            config.full_nout(),
            config.full_narr(),
            config.full_pupil_diam_pix()
        );
        log::info!(
            "series {} trial {}: {:?} coronagraph, {:?} estimator, {} controller with DMs {:?}, {}x{} actuators",
            config.settings().series,
            config.settings().trial,
            config.optics().coronagraph,
            config.estimator().kind,
            config.controller().kind.name(),
            config.controller().dm_ind,
            config.dm1().n_actuator,
            config.dm1().n_actuator,
        );
        Ok(config)
    }
}

fn to_table(settings: &Settings) -> std::result::Result<Table, ValidationError> {
    Table::try_from(settings).map_err(|e| ValidationError::Invalid {
        field: "settings".into(),
        reason: e.to_string(),
    })
}

/// Typed decoding of the merged settings table, one top level key at a time
struct Decoder<'a> {
    table: Table,
    defaults: &'a Table,
    overrides: &'a Table,
}
impl<'a> Decoder<'a> {
    fn section<T: DeserializeOwned>(&mut self, key: &str) -> std::result::Result<T, ValidationError> {
        let value = self
            .table
            .remove(key)
            .ok_or_else(|| ValidationError::Invalid {
                field: key.into(),
                reason: "missing setting".into(),
            })?;
        value.try_into().map_err(|e: toml::de::Error| ValidationError::Invalid {
            field: self.blame::<T>(key),
            reason: e.message().to_string(),
        })
    }
    /// Finds the override that alone makes the decoding of `key` fail
    fn blame<T: DeserializeOwned>(&self, key: &str) -> String {
        let (Some(Value::Table(overrides)), Some(default)) =
            (self.overrides.get(key), self.defaults.get(key))
        else {
            return key.into();
        };
        let mut leaves = vec![];
        collect_leaves(overrides, key, &mut leaves);
        for (leaf, value) in leaves {
            let mut single = Table::new();
            insert_at(&mut single, &leaf[key.len() + 1..], value.clone());
            let mut trial = default.clone();
            if let Value::Table(trial) = &mut trial {
                merge(trial, single);
            }
            if trial.try_into::<T>().is_err() {
                return leaf;
            }
        }
        key.into()
    }
}

/// Deep merge of `from` into `into`, `from` values replace `into` values except for tables
fn merge(into: &mut Table, from: Table) {
    for (key, value) in from {
        match (into.get_mut(&key), value) {
            (Some(Value::Table(into)), Value::Table(from)) => merge(into, from),
            (_, value) => {
                into.insert(key, value);
            }
        }
    }
}

fn insert_at(table: &mut Table, dotted: &str, value: Value) {
    match dotted.split_once('.') {
        Some((key, rest)) => {
            let mut inner = Table::new();
            insert_at(&mut inner, rest, value);
            table.insert(key.to_string(), Value::Table(inner));
        }
        None => {
            table.insert(dotted.to_string(), value);
        }
    }
}

fn collect_leaves<'t>(table: &'t Table, prefix: &str, leaves: &mut Vec<(String, &'t Value)>) {
    for (key, value) in table {
        let leaf = path(prefix, key);
        match value {
            Value::Table(table) => collect_leaves(table, &leaf, leaves),
            value => leaves.push((leaf, value)),
        }
    }
}

/// Checks that every override key exists in the decoded settings
fn unknown_keys(canonical: &Table, overrides: &Table, prefix: &str) -> std::result::Result<(), ValidationError> {
    for (key, value) in overrides {
        let field = path(prefix, key);
        match (canonical.get(key), value) {
            (None, _) => return Err(ValidationError::Unknown(field)),
            (Some(Value::Table(canonical)), Value::Table(overrides)) => {
                unknown_keys(canonical, overrides, &field)?
            }
            (Some(Value::Array(canonical)), Value::Array(overrides)) => {
                for (i, pair) in canonical.iter().zip(overrides).enumerate() {
                    if let (Value::Table(canonical), Value::Table(overrides)) = pair {
                        unknown_keys(canonical, overrides, &format!("{field}[{i}]"))?;
                    }
                }
            }
            _ => (),
        }
    }
    Ok(())
}
