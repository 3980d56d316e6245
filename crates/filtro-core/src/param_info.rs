//! Parameter metadata for discovery, display and host communication.
//!
//! Each filter control is described by a [`ParamDescriptor`]: display names,
//! unit, range, default, a stable numeric [`ParamId`] and a string id used as
//! the key in state snapshots. Hosts, the CLI and tests use the descriptor
//! instead of hard-coding ranges.
//!
//! # Example
//!
//! ```rust
//! use filtro_core::{ParamDescriptor, ParamId, ParamScale, ParamUnit};
//!
//! let cutoff = ParamDescriptor::frequency_hz("Cutoff", "Cutoff", 12.0, 20000.0, 1000.0)
//!     .with_id(ParamId(0), "cutoff");
//!
//! assert_eq!(cutoff.format_value(440.0), "440 Hz");
//! assert_eq!(cutoff.parse_value("2.5 kHz"), Some(2500.0));
//! assert_eq!(cutoff.scale, ParamScale::Logarithmic);
//! assert_eq!(cutoff.unit, ParamUnit::Hertz);
//! ```

/// Scaling curve for parameter normalization.
///
/// Determines how a parameter's plain value maps to normalized \[0.0, 1.0\] space.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamScale {
    /// Linear mapping (default). Equal resolution across the range.
    #[default]
    Linear,
    /// Logarithmic mapping. More resolution at low values.
    /// Requires `min > 0.0`.
    Logarithmic,
}

/// Stable parameter identifier that survives reordering.
///
/// Used by hosts for automation and by the state snapshot. Once assigned, a
/// `ParamId` must never change for a given parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub u32);

/// Unit type for parameter display and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Hertz (Hz) - for frequency parameters like filter cutoff.
    Hertz,
    /// No unit - for dimensionless parameters such as Q.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// ```rust
    /// use filtro_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Hertz.suffix(), " Hz");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Hertz => " Hz",
            ParamUnit::None => "",
        }
    }
}

/// Trait for types that expose introspectable parameters by index.
///
/// Indices are zero-based and stable for the lifetime of the instance.
pub trait ParameterInfo {
    /// Returns the number of parameters.
    fn param_count(&self) -> usize;

    /// Returns the descriptor at `index`, or `None` if out of range.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Gets the current value at `index`. Out-of-range indices return `0.0`.
    fn get_param(&self, index: usize) -> f32;

    /// Sets the value at `index`, clamped to the descriptor range.
    /// Out-of-range indices are ignored.
    fn set_param(&mut self, index: usize, value: f32);

    /// Find a parameter index by name, short name or string id
    /// (case-insensitive).
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i).is_some_and(|desc| {
                desc.name.eq_ignore_ascii_case(name)
                    || desc.short_name.eq_ignore_ascii_case(name)
                    || desc.string_id.eq_ignore_ascii_case(name)
            })
        })
    }

    /// Finds a parameter index by its stable [`ParamId`].
    fn param_index_by_id(&self, id: ParamId) -> Option<usize> {
        (0..self.param_count()).find(|&i| self.param_info(i).is_some_and(|d| d.id == id))
    }
}

/// Describes a single parameter's metadata for display and validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full parameter name for display (e.g., "Cutoff").
    pub name: &'static str,
    /// Short name for compact displays, max 8 characters.
    pub short_name: &'static str,
    /// Unit type for formatting the parameter value.
    pub unit: ParamUnit,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
    /// Default value.
    pub default: f32,
    /// Recommended step increment for encoder-based control.
    pub step: f32,
    /// Stable numeric ID for host automation and state.
    pub id: ParamId,
    /// Human-readable stable ID, used as the state snapshot key.
    pub string_id: &'static str,
    /// Normalization curve.
    pub scale: ParamScale,
}

impl ParamDescriptor {
    /// Frequency parameter in Hz with logarithmic scaling.
    pub fn frequency_hz(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Hertz,
            min,
            max,
            default,
            step: 1.0,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Logarithmic,
        }
    }

    /// Dimensionless parameter with linear scaling.
    pub fn dimensionless(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::None,
            min,
            max,
            default,
            step: 0.01,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
        }
    }

    /// Sets the stable parameter ID and string ID.
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Sets the normalization scale.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Clamps a value to this parameter's valid range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Converts a plain value to normalized range (0.0 to 1.0).
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        let normalized = match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
        };
        normalized.clamp(0.0, 1.0)
    }

    /// Converts a normalized value (0.0 to 1.0) to the parameter range.
    ///
    /// Inverse of [`normalize`](Self::normalize).
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::powf(self.max / self.min, normalized)
            }
        }
    }

    /// Format a value for display: `"1000 Hz"` for frequencies, two decimals
    /// for dimensionless values.
    pub fn format_value(&self, value: f32) -> String {
        match self.unit {
            ParamUnit::Hertz => format!("{:.0}{}", value, self.unit.suffix()),
            ParamUnit::None => format!("{:.2}", value),
        }
    }

    /// Parse display text back to a clamped value.
    ///
    /// Accepts a bare number, the unit suffix, and a `k` multiplier for
    /// frequencies (`"2.5 kHz"`, `"2.5k"`). Returns `None` if the text is not
    /// a number.
    pub fn parse_value(&self, text: &str) -> Option<f32> {
        let trimmed = text.trim();
        let lower = trimmed.to_ascii_lowercase();
        let mut body = lower.as_str();
        let mut multiplier = 1.0;
        if self.unit == ParamUnit::Hertz {
            body = body.strip_suffix("hz").unwrap_or(body).trim_end();
            if let Some(stripped) = body.strip_suffix('k') {
                body = stripped.trim_end();
                multiplier = 1000.0;
            }
        }
        let value: f32 = body.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(self.clamp(value * multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cutoff() -> ParamDescriptor {
        ParamDescriptor::frequency_hz("Cutoff", "Cutoff", 12.0, 20000.0, 1000.0)
            .with_id(ParamId(0), "cutoff")
    }

    fn resonance() -> ParamDescriptor {
        ParamDescriptor::dimensionless("Resonance", "Reso", 0.1, 20.0, 0.707)
            .with_id(ParamId(1), "resonance")
    }

    #[test]
    fn clamp_to_range() {
        let desc = resonance();
        assert_eq!(desc.clamp(0.0), 0.1);
        assert_eq!(desc.clamp(100.0), 20.0);
        assert_eq!(desc.clamp(5.0), 5.0);
    }

    #[test]
    fn normalize_linear_endpoints() {
        let desc = resonance();
        assert_eq!(desc.normalize(0.1), 0.0);
        assert_eq!(desc.normalize(20.0), 1.0);
        assert!((desc.denormalize(0.5) - 10.05).abs() < 1e-4);
    }

    #[test]
    fn normalize_log_roundtrip() {
        let desc = cutoff();
        for &hz in &[12.0, 100.0, 1000.0, 12345.0, 20000.0] {
            let back = desc.denormalize(desc.normalize(hz));
            assert!((back - hz).abs() / hz < 1e-4, "{hz} -> {back}");
        }
        // Log midpoint is the geometric mean.
        let mid = desc.denormalize(0.5);
        assert!((mid - (12.0f32 * 20000.0).sqrt()).abs() < 0.5);
    }

    #[test]
    fn format_values() {
        assert_eq!(cutoff().format_value(1000.0), "1000 Hz");
        assert_eq!(cutoff().format_value(440.4), "440 Hz");
        assert_eq!(resonance().format_value(0.707), "0.71");
    }

    #[test]
    fn parse_values() {
        let desc = cutoff();
        assert_eq!(desc.parse_value("440"), Some(440.0));
        assert_eq!(desc.parse_value(" 440 Hz "), Some(440.0));
        assert_eq!(desc.parse_value("2.5k"), Some(2500.0));
        assert_eq!(desc.parse_value("2.5 kHz"), Some(2500.0));
        assert_eq!(desc.parse_value("99999"), Some(20000.0));
        assert_eq!(desc.parse_value("loud"), None);
        assert_eq!(resonance().parse_value("5"), Some(5.0));
        assert_eq!(resonance().parse_value("inf"), None);
    }
}
