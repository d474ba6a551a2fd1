use crate::error::{ExtError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Edge enhancement value that turns the filter off
pub const EDGE_ENHANCEMENT_OFF: i32 = -101;
/// Strongest edge enhancement
pub const EDGE_ENHANCEMENT_MAX: i32 = 100;
/// Exposure time meaning "let auto exposure decide"
pub const EXPOSURE_TIME_AUTO: u32 = 0;
/// Largest raw dump flag (three flag bits)
pub const RAW_DUMP_FLAG_MAX: u8 = 0b111;

/// Largest magnitude of a single EV bracket step
pub const EV_BRACKET_LIMIT: f32 = 3.0;
/// Fewest values in an enabled EV bracket
pub const EV_BRACKET_MIN_LEN: usize = 2;
/// Most values in an EV bracket
pub const EV_BRACKET_MAX_LEN: usize = 7;

/// Floats go on the wire with a decimal point, e.g. `1.0` rather than `1`
pub(crate) fn format_float(value: f32) -> String {
    format!("{:?}", value)
}

fn parse_float_list(key: &str, text: &str) -> Result<Vec<f32>> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f32>()
                .map_err(|e| ExtError::parameter_parse(key, text, e.to_string()))
        })
        .collect()
}

fn join_floats(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format_float(*v))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contrast {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

impl Contrast {
    pub const ALL: [Contrast; 5] = [
        Contrast::Lowest,
        Contrast::Low,
        Contrast::Normal,
        Contrast::High,
        Contrast::Highest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Contrast::Lowest => "lowest",
            Contrast::Low => "low",
            Contrast::Normal => "normal",
            Contrast::High => "high",
            Contrast::Highest => "highest",
        }
    }
}

impl fmt::Display for Contrast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Contrast {
    type Err = ExtError;

    fn from_str(s: &str) -> Result<Self> {
        Contrast::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                ExtError::parameter_parse(
                    "nv-contrast",
                    s,
                    "expected lowest, low, normal, high or highest",
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PictureIso {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "100")]
    Iso100,
    #[serde(rename = "200")]
    Iso200,
    #[serde(rename = "400")]
    Iso400,
    #[serde(rename = "800")]
    Iso800,
}

impl PictureIso {
    pub const ALL: [PictureIso; 5] = [
        PictureIso::Auto,
        PictureIso::Iso100,
        PictureIso::Iso200,
        PictureIso::Iso400,
        PictureIso::Iso800,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PictureIso::Auto => "auto",
            PictureIso::Iso100 => "100",
            PictureIso::Iso200 => "200",
            PictureIso::Iso400 => "400",
            PictureIso::Iso800 => "800",
        }
    }

    /// Sensitivity as a number, `None` for auto
    pub fn sensitivity(&self) -> Option<u32> {
        match self {
            PictureIso::Auto => None,
            PictureIso::Iso100 => Some(100),
            PictureIso::Iso200 => Some(200),
            PictureIso::Iso400 => Some(400),
            PictureIso::Iso800 => Some(800),
        }
    }
}

impl fmt::Display for PictureIso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PictureIso {
    type Err = ExtError;

    fn from_str(s: &str) -> Result<Self> {
        PictureIso::ALL
            .iter()
            .copied()
            .find(|iso| iso.as_str() == s)
            .ok_or_else(|| {
                ExtError::parameter_parse("nv-picture-iso", s, "expected auto, 100, 200, 400 or 800")
            })
    }
}

/// Exposure compensation applied to successive burst images.
///
/// Either disabled (no values) or two to seven steps, each in [-3.0, 3.0].
/// The first captured image gets the first step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct EvBracket(Vec<f32>);

impl EvBracket {
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if !values.is_empty()
            && !(EV_BRACKET_MIN_LEN..=EV_BRACKET_MAX_LEN).contains(&values.len())
        {
            return Err(ExtError::invalid_value(
                "EV bracket",
                format!(
                    "expected 0 or {}-{} values, got {}",
                    EV_BRACKET_MIN_LEN,
                    EV_BRACKET_MAX_LEN,
                    values.len()
                ),
            ));
        }

        if let Some(bad) = values
            .iter()
            .find(|v| !(-EV_BRACKET_LIMIT..=EV_BRACKET_LIMIT).contains(*v))
        {
            return Err(ExtError::invalid_value(
                "EV bracket",
                format!("step {} outside [-3.0, 3.0]", bad),
            ));
        }

        Ok(Self(values))
    }

    pub fn disabled() -> Self {
        Self(Vec::new())
    }

    pub fn is_enabled(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    /// Wire form; a disabled bracket is a single space
    pub fn encode(&self) -> String {
        if self.0.is_empty() {
            " ".to_string()
        } else {
            join_floats(&self.0)
        }
    }

    pub fn decode(key: &str, text: &str) -> Result<Self> {
        let values = parse_float_list(key, text)?;
        Self::new(values).map_err(|e| ExtError::parameter_parse(key, text, e.to_string()))
    }
}

impl TryFrom<Vec<f32>> for EvBracket {
    type Error = ExtError;

    fn try_from(values: Vec<f32>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<EvBracket> for Vec<f32> {
    fn from(bracket: EvBracket) -> Self {
        bracket.0
    }
}

/// Manual 4x4 color correction matrix, stored row-major.
///
/// All zeros restores the driver's own color correction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorCorrection(pub [f32; 16]);

impl ColorCorrection {
    pub fn identity() -> Self {
        let mut matrix = [0.0; 16];
        for i in 0..4 {
            matrix[i * 5] = 1.0;
        }
        Self(matrix)
    }

    pub fn is_driver_default(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Row `index` of the matrix, `None` past the fourth row
    pub fn row(&self, index: usize) -> Option<[f32; 4]> {
        let start = index.checked_mul(4)?;
        let row = self.0.get(start..start.checked_add(4)?)?;
        let mut out = [0.0; 4];
        out.copy_from_slice(row);
        Some(out)
    }

    pub fn as_array(&self) -> &[f32; 16] {
        &self.0
    }

    pub fn encode(&self) -> String {
        join_floats(&self.0)
    }

    pub fn decode(key: &str, text: &str) -> Result<Self> {
        let values = parse_float_list(key, text)?;
        let matrix: [f32; 16] = values.try_into().map_err(|v: Vec<f32>| {
            ExtError::parameter_parse(key, text, format!("expected 16 values, got {}", v.len()))
        })?;
        Ok(Self(matrix))
    }
}

impl From<[f32; 16]> for ColorCorrection {
    fn from(matrix: [f32; 16]) -> Self {
        Self(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_strings() {
        for contrast in Contrast::ALL {
            assert_eq!(contrast.as_str().parse::<Contrast>().unwrap(), contrast);
        }
        assert_eq!(Contrast::default(), Contrast::Normal);
        assert!("medium".parse::<Contrast>().is_err());
        assert!("Normal".parse::<Contrast>().is_err());
    }

    #[test]
    fn test_picture_iso_strings() {
        assert_eq!("auto".parse::<PictureIso>().unwrap(), PictureIso::Auto);
        assert_eq!("400".parse::<PictureIso>().unwrap(), PictureIso::Iso400);
        assert_eq!(PictureIso::Iso800.sensitivity(), Some(800));
        assert_eq!(PictureIso::default().to_string(), "auto");
        assert!("1600".parse::<PictureIso>().is_err());
    }

    #[test]
    fn test_ev_bracket_encoding() {
        assert_eq!(EvBracket::disabled().encode(), " ");

        let bracket = EvBracket::new(vec![-1.0, 0.0, 1.0]).unwrap();
        assert_eq!(bracket.encode(), "-1.0,0.0,1.0");

        let decoded = EvBracket::decode("nv-ev-bracket-capture", "-1.0,0.0,1.0").unwrap();
        assert_eq!(decoded, bracket);
        assert!(!EvBracket::decode("nv-ev-bracket-capture", " ")
            .unwrap()
            .is_enabled());
    }

    #[test]
    fn test_ev_bracket_limits() {
        assert!(EvBracket::new(vec![1.0]).is_err());
        assert!(EvBracket::new(vec![0.0; 8]).is_err());
        assert!(EvBracket::new(vec![0.0, 3.5]).is_err());
        assert!(EvBracket::new(vec![-3.0, 3.0]).is_ok());
        assert!(EvBracket::new(vec![0.5; 7]).is_ok());
    }

    #[test]
    fn test_color_correction() {
        let identity = ColorCorrection::identity();
        assert_eq!(identity.row(0), Some([1.0, 0.0, 0.0, 0.0]));
        assert_eq!(identity.row(3), Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(identity.row(4), None);
        assert_eq!(identity.row(usize::MAX), None);
        assert!(ColorCorrection::default().is_driver_default());

        let encoded = identity.encode();
        assert!(encoded.starts_with("1.0,0.0,0.0,0.0,0.0,1.0"));
        assert_eq!(
            ColorCorrection::decode("nv-color-correction", &encoded).unwrap(),
            identity
        );

        assert!(ColorCorrection::decode("nv-color-correction", "1.0,2.0").is_err());
    }
}
