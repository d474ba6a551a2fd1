//! Region ("window") lists and their text encoding.
//!
//! A region list travels through the parameter protocol as
//! `(l,t,r,b,w),(l,t,r,b,w),...`. Coordinates are screen-relative in
//! [-1000, 1000]; the weight range is up to the driver. The codec itself
//! does not enforce either range, it only preserves field order and arity.

use crate::error::{ExtError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lower bound of region coordinates
pub const COORDINATE_MIN: i32 = -1000;
/// Upper bound of region coordinates
pub const COORDINATE_MAX: i32 = 1000;

/// A screen-relative rectangle with a relative importance weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub weight: i32,
}

impl Region {
    /// Focus window reported by the driver before any area is set
    pub const DEFAULT_FOCUS: Region = Region::new(-240, -240, 240, 240, 1);

    /// All-zero area, restores the driver's center-weighted algorithm
    pub const DRIVER_DEFAULT: Region = Region::new(0, 0, 0, 0, 0);

    /// Whole field of view with unit weight (average metering)
    pub const FULL_FRAME: Region = Region::new(
        COORDINATE_MIN,
        COORDINATE_MIN,
        COORDINATE_MAX,
        COORDINATE_MAX,
        1,
    );

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32, weight: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            weight,
        }
    }

    /// Whether all four coordinates lie in [-1000, 1000]
    pub fn is_within_bounds(&self) -> bool {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|c| (COORDINATE_MIN..=COORDINATE_MAX).contains(c))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{},{},{})",
            self.left, self.top, self.right, self.bottom, self.weight
        )
    }
}

impl FromStr for Region {
    type Err = ExtError;

    fn from_str(s: &str) -> Result<Self> {
        let mut regions = decode_regions(Some(s))?;
        if regions.len() != 1 {
            return Err(ExtError::region_parse(
                s,
                format!("expected exactly one region, found {}", regions.len()),
            ));
        }
        Ok(regions.remove(0))
    }
}

/// Encode a region list, `None` for an empty list.
pub fn encode_regions(regions: &[Region]) -> Option<String> {
    if regions.is_empty() {
        return None;
    }

    let encoded = regions
        .iter()
        .map(Region::to_string)
        .collect::<Vec<_>>()
        .join(",");
    Some(encoded)
}

/// Decode a region list. Absent or empty input decodes to an empty list.
///
/// Every region must carry exactly five decimal fields and a closing
/// parenthesis; anything else fails the whole decode.
pub fn decode_regions(input: Option<&str>) -> Result<Vec<Region>> {
    let input = match input {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(Vec::new()),
    };

    let mut chunks = input.split('(');
    if let Some(leading) = chunks.next() {
        if !leading.is_empty() {
            return Err(ExtError::region_parse(
                input,
                format!("unexpected text '{}' before first region", leading),
            ));
        }
    }

    let mut regions = Vec::new();
    for chunk in chunks {
        regions.push(decode_chunk(input, chunk)?);
    }

    if regions.is_empty() {
        return Err(ExtError::region_parse(input, "no regions found"));
    }

    Ok(regions)
}

fn decode_chunk(input: &str, chunk: &str) -> Result<Region> {
    // Trailing empty token is the separator before the next region
    let tokens: Vec<&str> = chunk.split(',').filter(|t| !t.is_empty()).collect();
    if tokens.len() != 5 {
        return Err(ExtError::region_parse(
            input,
            format!("expected 5 fields, found {} in '({}'", tokens.len(), chunk),
        ));
    }

    let weight = tokens[4].strip_suffix(')').ok_or_else(|| {
        ExtError::region_parse(input, format!("missing ')' after '{}'", tokens[4]))
    })?;

    let mut fields = [0i32; 5];
    for (slot, token) in fields
        .iter_mut()
        .zip(tokens[..4].iter().copied().chain(std::iter::once(weight)))
    {
        *slot = token.parse::<i32>().map_err(|e| {
            ExtError::region_parse(input, format!("field '{}': {}", token, e))
        })?;
    }

    let [left, top, right, bottom, weight] = fields;
    Ok(Region::new(left, top, right, bottom, weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_regions(&[]), None);
        assert_eq!(decode_regions(None).unwrap(), Vec::<Region>::new());
        assert_eq!(decode_regions(Some("")).unwrap(), Vec::<Region>::new());
    }

    #[test]
    fn test_encode_regions() {
        let regions = [Region::DEFAULT_FOCUS, Region::new(0, 0, 100, 100, 500)];
        assert_eq!(
            encode_regions(&regions).as_deref(),
            Some("(-240,-240,240,240,1),(0,0,100,100,500)")
        );
    }

    #[test]
    fn test_decode_default_focus_window() {
        let regions = decode_regions(Some("(-240,-240,240,240,1)")).unwrap();
        assert_eq!(regions, vec![Region::new(-240, -240, 240, 240, 1)]);
    }

    #[test]
    fn test_round_trip() {
        let cases = vec![
            vec![Region::DRIVER_DEFAULT],
            vec![Region::FULL_FRAME, Region::DEFAULT_FOCUS],
            vec![
                Region::new(-1000, -500, 0, 500, 1),
                Region::new(10, 20, 30, 40, 1000),
                Region::new(-1, -2, -3, -4, -5),
            ],
        ];

        for regions in cases {
            let encoded = encode_regions(&regions).unwrap();
            assert_eq!(decode_regions(Some(&encoded)).unwrap(), regions);
        }
    }

    #[test]
    fn test_decode_rejects_wrong_arity() {
        let err = decode_regions(Some("(1,2,3,4)")).unwrap_err();
        assert!(matches!(err, ExtError::RegionParse { .. }));

        assert!(decode_regions(Some("(1,2,3,4,5,6)")).is_err());
        assert!(decode_regions(Some("(1,2,3,4,5),(1,2,3)")).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_text() {
        assert!(decode_regions(Some("(1,2,x,4,5)")).is_err());
        assert!(decode_regions(Some("(1,2,3,4,5")).is_err());
        assert!(decode_regions(Some("1,2,3,4,5")).is_err());
        assert!(decode_regions(Some("junk(1,2,3,4,5)")).is_err());
        assert!(decode_regions(Some("(")).is_err());
    }

    #[test]
    fn test_region_from_str_and_bounds() {
        let region: Region = "(-1000,-1000,1000,1000,1)".parse().unwrap();
        assert_eq!(region, Region::FULL_FRAME);
        assert!(region.is_within_bounds());
        assert!(!Region::new(-1001, 0, 0, 0, 1).is_within_bounds());

        assert!("(1,2,3,4,5),(1,2,3,4,5)".parse::<Region>().is_err());
    }
}
