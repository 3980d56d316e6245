//! Render settings: TOML file plus command-line overrides.
//!
//! ```toml
//! preset = "Warm"
//! cutoff = 1200.0
//! resonance = 4.0
//! smoothing_ms = 10.0
//! ramp = "linear"
//! block_size = 256
//! bypass = false
//! ```
//!
//! Every key is optional. A preset is applied first; explicit `cutoff` and
//! `resonance` values then override it. Command-line flags override the file.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use filtro_core::{DEFAULT_SMOOTHING_MS, FilterParam, Smoothing};
use filtro_unit::{FACTORY_PRESETS, FactoryPreset, FilterUnit};
use serde::Deserialize;
use thiserror::Error;

/// Largest block size accepted from settings.
pub const MAX_BLOCK_SIZE: usize = 65536;

/// Errors from loading or validating a settings file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read the settings file.
    #[error("failed to read settings file '{path}': {source}")]
    ReadFile {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("invalid settings file: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid value for '{field}': {reason}")]
    Invalid {
        /// Offending key.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// No factory preset with this name or number.
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

impl ConfigFileError {
    /// Create a read error with the offending path.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Parameter ramp shape as written in settings and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Ramp {
    /// One-pole approach.
    #[default]
    Exponential,
    /// Constant-rate ramp.
    Linear,
}

impl From<Ramp> for Smoothing {
    fn from(ramp: Ramp) -> Self {
        match ramp {
            Ramp::Exponential => Smoothing::Exponential,
            Ramp::Linear => Smoothing::Linear,
        }
    }
}

/// Resolved render settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    /// Factory preset, by name or number.
    pub preset: Option<String>,
    /// Cutoff in Hz.
    pub cutoff: Option<f32>,
    /// Resonance (Q).
    pub resonance: Option<f32>,
    /// Parameter smoothing time in milliseconds.
    pub smoothing_ms: f32,
    /// Ramp shape.
    pub ramp: Ramp,
    /// Frames per render call.
    pub block_size: usize,
    /// Pass audio through untouched.
    pub bypass: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            preset: None,
            cutoff: None,
            resonance: None,
            smoothing_ms: DEFAULT_SMOOTHING_MS,
            ramp: Ramp::Exponential,
            block_size: filtro_unit::DEFAULT_MAXIMUM_FRAMES,
            bypass: false,
        }
    }
}

impl RenderSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigFileError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigFileError::read_file(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Check ranges and resolve the preset name.
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigFileError::invalid(
                "block_size",
                format!("{} is outside 1..={MAX_BLOCK_SIZE}", self.block_size),
            ));
        }
        if !self.smoothing_ms.is_finite() || self.smoothing_ms < 0.0 {
            return Err(ConfigFileError::invalid(
                "smoothing_ms",
                format!("{} is not a non-negative time", self.smoothing_ms),
            ));
        }
        for (field, value) in [("cutoff", self.cutoff), ("resonance", self.resonance)] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(ConfigFileError::invalid(field, "must be a finite number"));
            }
        }
        self.factory_preset()?;
        Ok(())
    }

    /// The factory preset named by `preset`, if any.
    pub fn factory_preset(&self) -> Result<Option<&'static FactoryPreset>, ConfigFileError> {
        match &self.preset {
            None => Ok(None),
            Some(name) => find_factory_preset(name)
                .map(Some)
                .ok_or_else(|| ConfigFileError::UnknownPreset(name.clone())),
        }
    }

    /// Push these settings into `unit`. Call before allocating.
    pub fn configure(&self, unit: &mut FilterUnit) -> Result<(), ConfigFileError> {
        unit.set_smoothing(self.ramp.into(), self.smoothing_ms);
        unit.set_maximum_frames_to_render(self.block_size);
        if let Some(preset) = self.factory_preset()? {
            unit.set_current_preset(preset.number);
        }
        if let Some(cutoff) = self.cutoff {
            unit.set_parameter(FilterParam::Cutoff, cutoff);
        }
        if let Some(resonance) = self.resonance {
            unit.set_parameter(FilterParam::Resonance, resonance);
        }
        unit.set_bypass(self.bypass);
        Ok(())
    }
}

/// Find a factory preset by case-insensitive name or by number.
pub fn find_factory_preset(key: &str) -> Option<&'static FactoryPreset> {
    let key = key.trim();
    if let Ok(number) = key.parse::<usize>() {
        return filtro_unit::factory_preset(number);
    }
    FACTORY_PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(key))
}

/// Filter settings shared by the rendering subcommands.
#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// Settings file (TOML)
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Factory preset, by name or number
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Cutoff frequency in Hz
    #[arg(short, long)]
    pub cutoff: Option<f32>,

    /// Resonance (Q)
    #[arg(short, long)]
    pub resonance: Option<f32>,

    /// Parameter smoothing time in milliseconds
    #[arg(long)]
    pub smoothing_ms: Option<f32>,

    /// Parameter ramp shape
    #[arg(long, value_enum)]
    pub ramp: Option<Ramp>,

    /// Frames per render call
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Pass audio through untouched
    #[arg(long)]
    pub bypass: bool,
}

impl FilterArgs {
    /// Load the settings file (if any) and apply flag overrides.
    ///
    /// A `--preset` flag discards the file's `cutoff` and `resonance`, so the
    /// preset is heard as stored unless those flags are given too.
    pub fn resolve(&self) -> Result<RenderSettings, ConfigFileError> {
        let mut settings = match &self.settings {
            Some(path) => RenderSettings::load(path)?,
            None => RenderSettings::default(),
        };

        if let Some(preset) = &self.preset {
            settings.preset = Some(preset.clone());
            settings.cutoff = None;
            settings.resonance = None;
        }
        if self.cutoff.is_some() {
            settings.cutoff = self.cutoff;
        }
        if self.resonance.is_some() {
            settings.resonance = self.resonance;
        }
        if let Some(ms) = self.smoothing_ms {
            settings.smoothing_ms = ms;
        }
        if let Some(ramp) = self.ramp {
            settings.ramp = ramp;
        }
        if let Some(block_size) = self.block_size {
            settings.block_size = block_size;
        }
        settings.bypass |= self.bypass;

        settings.validate()?;
        Ok(settings)
    }
}
