//! Memory thresholds: an ordered, deduplicated set of byte counts per target,
//! plus parsing and formatting of human memory sizes.

use crate::error::ThresholdError;

pub const MB: u64 = 1024 * 1024;
pub const GB: u64 = 1024 * MB;

/// Policy cap on thresholds per target.
pub const MAX_THRESHOLDS: usize = 5;
/// Largest accepted threshold, in GB.
pub const MAX_THRESHOLD_GB: u64 = 1024;

const PRESETS_GB: [&[u64]; 3] = [&[5, 10, 15], &[2, 4, 8], &[10, 20]];

/// Thresholds in bytes, kept sorted ascending and pairwise distinct.
/// Every value is a positive whole number of megabytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdSet {
    values: Vec<u64>,
}

impl ThresholdSet {
    pub fn from_bytes<I>(values: I) -> Result<Self, ThresholdError>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut set = ThresholdSet { values: Vec::new() };
        for bytes in values {
            set.insert(bytes)?;
        }
        if set.values.is_empty() {
            return Err(ThresholdError::Empty);
        }
        Ok(set)
    }

    pub fn from_megabytes<I>(values: I) -> Result<Self, ThresholdError>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut bytes = Vec::new();
        for mb in values {
            bytes.push(mb.checked_mul(MB).ok_or(ThresholdError::TooLarge(MAX_THRESHOLD_GB))?);
        }
        Self::from_bytes(bytes)
    }

    /// Parse a list of human inputs such as `["500MB", "2GB", "5"]`.
    pub fn parse_list<S: AsRef<str>>(inputs: &[S]) -> Result<Self, ThresholdError> {
        let mut bytes = Vec::with_capacity(inputs.len());
        for input in inputs {
            bytes.push(parse_threshold(input.as_ref())?);
        }
        Self::from_bytes(bytes)
    }

    /// Add a threshold, keeping the set sorted.
    pub fn insert(&mut self, bytes: u64) -> Result<(), ThresholdError> {
        validate(bytes)?;
        match self.values.binary_search(&bytes) {
            Ok(_) => Err(ThresholdError::Duplicate(format_bytes(bytes))),
            Err(_) if self.values.len() >= MAX_THRESHOLDS => {
                Err(ThresholdError::TooMany(MAX_THRESHOLDS))
            }
            Err(pos) => {
                self.values.insert(pos, bytes);
                Ok(())
            }
        }
    }

    pub fn contains(&self, bytes: u64) -> bool {
        self.values.binary_search(&bytes).is_ok()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.values.iter().copied()
    }

    pub fn lowest(&self) -> Option<u64> {
        self.values.first().copied()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.values
    }

    pub fn to_megabytes(&self) -> Vec<u64> {
        self.values.iter().map(|b| b / MB).collect()
    }

    pub fn formatted(&self) -> Vec<String> {
        self.values.iter().map(|&b| format_bytes(b)).collect()
    }

    /// Quick-pick sets offered when configuring a target.
    pub fn presets() -> Vec<ThresholdSet> {
        PRESETS_GB
            .iter()
            .map(|gbs| ThresholdSet {
                values: gbs.iter().map(|gb| gb * GB).collect(),
            })
            .collect()
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        ThresholdSet {
            values: vec![5 * GB, 10 * GB, 15 * GB],
        }
    }
}

fn validate(bytes: u64) -> Result<(), ThresholdError> {
    if bytes < MB {
        return Err(ThresholdError::NotPositive);
    }
    if bytes > MAX_THRESHOLD_GB * GB {
        return Err(ThresholdError::TooLarge(MAX_THRESHOLD_GB));
    }
    if bytes % MB != 0 {
        return Err(ThresholdError::Invalid(format!("{} bytes", bytes)));
    }
    Ok(())
}

/// Parse a human memory size into bytes, rounded to whole megabytes.
///
/// Accepts `500MB`, `500 M`, `2GB`, `1.5 gb`. A bare number is read as
/// gigabytes (`"5"` is 5 GB).
pub fn parse_threshold(input: &str) -> Result<u64, ThresholdError> {
    let s = input.trim().to_uppercase();
    if s.is_empty() {
        return Err(ThresholdError::Empty);
    }

    let (num_str, unit_mb) = if let Some(n) = s.strip_suffix("GB").or_else(|| s.strip_suffix('G')) {
        (n, 1024.0)
    } else if let Some(n) = s.strip_suffix("MB").or_else(|| s.strip_suffix('M')) {
        (n, 1.0)
    } else {
        (s.as_str(), 1024.0)
    };

    let value: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| ThresholdError::Invalid(input.trim().to_string()))?;
    if !value.is_finite() {
        return Err(ThresholdError::Invalid(input.trim().to_string()));
    }
    if value <= 0.0 {
        return Err(ThresholdError::NotPositive);
    }

    let mb = (value * unit_mb).round();
    if mb < 1.0 {
        return Err(ThresholdError::NotPositive);
    }
    // Megabytes are the smallest unit
    if unit_mb == 1.0 && value.fract() != 0.0 {
        return Err(ThresholdError::Invalid(input.trim().to_string()));
    }
    if mb > (MAX_THRESHOLD_GB * 1024) as f64 {
        return Err(ThresholdError::TooLarge(MAX_THRESHOLD_GB));
    }
    Ok(mb as u64 * MB)
}

/// Render a byte count: whole gigabytes as `"2 GB"`, other sizes of a
/// gigabyte or more as `"1.5 GB"` (truncated to one decimal), anything else
/// as whole megabytes. A size that would print as `"N.0 GB"` without being
/// whole is shown in megabytes instead.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GB {
        if bytes % GB == 0 {
            return format!("{} GB", bytes / GB);
        }
        let tenths = (u128::from(bytes) * 10 / u128::from(GB)) as u64;
        if tenths % 10 != 0 {
            return format!("{}.{} GB", tenths / 10, tenths % 10);
        }
    }
    format!("{} MB", bytes / MB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_are_case_insensitive() {
        assert_eq!(parse_threshold("500mb").unwrap(), 500 * MB);
        assert_eq!(parse_threshold(" 2 Gb ").unwrap(), 2 * GB);
        assert_eq!(parse_threshold("750M").unwrap(), 750 * MB);
    }

    #[test]
    fn fractional_gigabytes_round_to_megabytes() {
        assert_eq!(parse_threshold("1.5GB").unwrap(), 1536 * MB);
        assert_eq!(format_bytes(1536 * MB), "1.5 GB");
    }

    #[test]
    fn rejects_non_finite() {
        assert!(parse_threshold("inf").is_err());
        assert!(parse_threshold("NaN GB").is_err());
    }
}
