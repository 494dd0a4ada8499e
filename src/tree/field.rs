//! Labeled numeric quantities and their display formatting.

use std::fmt;

/// Maximum number of decimals shown for a field value.
pub const MAX_DISPLAY_DECIMALS: usize = 3;

/// A single labeled numeric quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub value: f64,
    pub label: &'static str,
    pub units: &'static str,
    /// Hidden fields are stored and persisted but never rendered
    pub hidden: bool,
    /// Editable fields accept user writes and are persisted
    pub editable: bool,
}

impl Field {
    /// Create a visible, derived field.
    pub fn new(value: f64, label: &'static str, units: &'static str) -> Self {
        Self {
            value,
            label,
            units,
            hidden: false,
            editable: false,
        }
    }

    /// Create a visible, editable field.
    pub fn editable(value: f64, label: &'static str, units: &'static str) -> Self {
        Self {
            editable: true,
            ..Self::new(value, label, units)
        }
    }

    /// Mark the field as hidden from display.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Get the numeric value.
    pub fn get(&self) -> f64 {
        self.value
    }

    /// Format as `"<label>: <value> <units>"` with no forced decimals.
    pub fn format(&self) -> String {
        self.format_with(0)
    }

    /// Format with at least `min_decimals` decimals (capped at three).
    pub fn format_with(&self, min_decimals: usize) -> String {
        let value = format_value(self.value, min_decimals);
        if self.units.is_empty() {
            format!("{}: {}", self.label, value)
        } else {
            format!("{}: {} {}", self.label, value, self.units)
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Round to three decimals, trim trailing zeros down to `min_decimals`, and
/// group the integer part in thousands.
pub fn format_value(value: f64, min_decimals: usize) -> String {
    let min_decimals = min_decimals.min(MAX_DISPLAY_DECIMALS);
    let rounded = format!("{:.*}", MAX_DISPLAY_DECIMALS, round_half_away(value));

    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rounded.as_str(), ""),
    };

    let mut frac = frac_part.trim_end_matches('0');
    if frac.len() < min_decimals {
        frac = &frac_part[..min_decimals];
    }

    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(d) => ("-", d),
        None => ("", int_part),
    };
    // "-0" after rounding a tiny negative value
    let sign = if digits.chars().all(|c| c == '0') && frac.chars().all(|c| c == '0') {
        ""
    } else {
        sign
    };

    let mut out = String::with_capacity(rounded.len() + digits.len() / 3);
    out.push_str(sign);
    out.push_str(&group_thousands(digits));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Resolve exact ties away from zero; `{:.N}` alone rounds them to even.
fn round_half_away(value: f64) -> f64 {
    let scale = 10f64.powi(MAX_DISPLAY_DECIMALS as i32);
    let scaled = value * scale;
    // Only multiples of 1/16 sit exactly halfway at three decimals
    if scaled.fract().abs() == 0.5 && (value * 16.0).fract() == 0.0 {
        scaled.round() / scale
    } else {
        value
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
