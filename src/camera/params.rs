use super::flat::CameraParameters;
use super::region::{decode_regions, encode_regions, Region};
use super::values::{
    ColorCorrection, Contrast, EvBracket, PictureIso, EDGE_ENHANCEMENT_MAX, EDGE_ENHANCEMENT_OFF,
    RAW_DUMP_FLAG_MAX,
};
use crate::error::{ExtError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Parameter keys understood by the vendor camera HAL
pub mod keys {
    pub const NSL_NUM_BUFFERS: &str = "nv-nsl-num-buffers";
    pub const NSL_SKIP_COUNT: &str = "nv-nsl-burst-skip-count";
    pub const NSL_BURST_PICTURE_COUNT: &str = "nv-nsl-burst-picture-count";
    pub const SKIP_COUNT: &str = "nv-burst-skip-count";
    pub const BURST_PICTURE_COUNT: &str = "nv-burst-picture-count";
    pub const RAW_DUMP_FLAG: &str = "nv-raw-dump-flag";
    pub const EV_BRACKET_CAPTURE: &str = "nv-ev-bracket-capture";
    pub const FOCUS_AREAS: &str = "focus-areas";
    pub const METERING_AREAS: &str = "metering-areas";
    pub const COLOR_CORRECTION: &str = "nv-color-correction";
    pub const SATURATION: &str = "nv-saturation";
    pub const CONTRAST: &str = "nv-contrast";
    pub const EDGE_ENHANCEMENT: &str = "nv-edge-enhancement";
    pub const EXPOSURE_TIME: &str = "nv-exposure-time";
    pub const PICTURE_ISO: &str = "nv-picture-iso";
    pub const FOCUS_POSITION: &str = "nv-focus-position";
    pub const AUTO_WHITE_BALANCE_LOCK: &str = "auto-whitebalance-lock";
    pub const AUTO_EXPOSURE_LOCK: &str = "auto-exposure-lock";

    pub const ALL: [&str; 18] = [
        NSL_NUM_BUFFERS,
        NSL_SKIP_COUNT,
        NSL_BURST_PICTURE_COUNT,
        SKIP_COUNT,
        BURST_PICTURE_COUNT,
        RAW_DUMP_FLAG,
        EV_BRACKET_CAPTURE,
        FOCUS_AREAS,
        METERING_AREAS,
        COLOR_CORRECTION,
        SATURATION,
        CONTRAST,
        EDGE_ENHANCEMENT,
        EXPOSURE_TIME,
        PICTURE_ISO,
        FOCUS_POSITION,
        AUTO_WHITE_BALANCE_LOCK,
        AUTO_EXPOSURE_LOCK,
    ];
}

/// Vendor camera parameter snapshot.
///
/// Every vendor setting is held in its own typed field and only turned into
/// text by [`NvParameters::flatten`]. Keys the vendor layer does not know
/// about stay in the base [`CameraParameters`] and pass through untouched.
/// Unset fields read back as their documented defaults and are left out of
/// the flattened string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NvParameters {
    #[serde(skip)]
    base: CameraParameters,

    #[serde(skip_serializing_if = "Option::is_none")]
    nsl_num_buffers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nsl_skip_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nsl_burst_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    burst_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_dump_flag: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ev_bracket_capture: Option<EvBracket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    focus_areas: Option<Vec<Region>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metering_areas: Option<Vec<Region>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_correction: Option<ColorCorrection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saturation: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contrast: Option<Contrast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    edge_enhancement: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exposure_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    picture_iso: Option<PictureIso>,
    #[serde(skip_serializing_if = "Option::is_none")]
    focus_position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_white_balance_lock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_exposure_lock: Option<bool>,
}

impl NvParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing base parameter object, lifting vendor keys out of it.
    ///
    /// A vendor value that does not parse or is out of range is dropped and
    /// reads back as its default. Malformed region lists fail the whole set.
    pub fn from_base(mut base: CameraParameters) -> Result<Self> {
        let mut params = Self::default();

        for key in keys::ALL {
            if let Some(value) = base.remove(key) {
                match params.apply_wire_value(key, &value) {
                    Ok(()) => {}
                    Err(e @ ExtError::RegionParse { .. }) => return Err(e),
                    Err(e) => warn!("Ignoring vendor parameter {}: {}", key, e),
                }
            }
        }
        params.base = base;

        Ok(params)
    }

    /// Load a typed tuning profile from a TOML file
    pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading tuning profile from: {}", path.display());

        let text = std::fs::read_to_string(path)?;
        let params: NvParameters = toml::from_str(&text)?;
        params.validate()?;

        info!("Tuning profile loaded from {}", path.display());
        Ok(params)
    }

    /// Check every set value against its documented range
    pub fn validate(&self) -> Result<()> {
        if let Some(flag) = self.raw_dump_flag {
            check_raw_dump_flag(flag)?;
        }
        if let Some(value) = self.edge_enhancement {
            check_edge_enhancement(value)?;
        }
        if !self.nsl_burst_is_valid() {
            return Err(ExtError::invalid_value(
                "NSL burst",
                "burst count + skip count * (burst count - 1) exceeds NSL buffers",
            ));
        }
        Ok(())
    }

    pub fn base(&self) -> &CameraParameters {
        &self.base
    }

    /// Set a parameter by its wire key. Vendor keys are parsed into their
    /// typed field; anything else goes to the base parameters.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        if keys::ALL.contains(&key) {
            self.apply_wire_value(key, value)
        } else {
            self.base.set(key, value)
        }
    }

    /// Unset a parameter by its wire key
    pub fn remove_value(&mut self, key: &str) {
        match key {
            keys::NSL_NUM_BUFFERS => self.nsl_num_buffers = None,
            keys::NSL_SKIP_COUNT => self.nsl_skip_count = None,
            keys::NSL_BURST_PICTURE_COUNT => self.nsl_burst_count = None,
            keys::SKIP_COUNT => self.skip_count = None,
            keys::BURST_PICTURE_COUNT => self.burst_count = None,
            keys::RAW_DUMP_FLAG => self.raw_dump_flag = None,
            keys::EV_BRACKET_CAPTURE => self.ev_bracket_capture = None,
            keys::FOCUS_AREAS => self.focus_areas = None,
            keys::METERING_AREAS => self.metering_areas = None,
            keys::COLOR_CORRECTION => self.color_correction = None,
            keys::SATURATION => self.saturation = None,
            keys::CONTRAST => self.contrast = None,
            keys::EDGE_ENHANCEMENT => self.edge_enhancement = None,
            keys::EXPOSURE_TIME => self.exposure_time = None,
            keys::PICTURE_ISO => self.picture_iso = None,
            keys::FOCUS_POSITION => self.focus_position = None,
            keys::AUTO_WHITE_BALANCE_LOCK => self.auto_white_balance_lock = None,
            keys::AUTO_EXPOSURE_LOCK => self.auto_exposure_lock = None,
            _ => {
                self.base.remove(key);
            }
        }
    }

    /// Serialize the whole set, base keys first, vendor keys overriding
    pub fn flatten(&self) -> String {
        let mut merged = self.base.clone();
        for (key, value) in self.wire_values() {
            merged.insert_unchecked(key, value);
        }
        merged.flatten()
    }

    /// Rebuild a snapshot from a flattened string
    pub fn unflatten(flat: &str) -> Result<Self> {
        Self::from_base(CameraParameters::unflatten(flat))
    }

    fn wire_values(&self) -> Vec<(&'static str, String)> {
        let mut values = Vec::new();

        let ints = [
            (keys::NSL_NUM_BUFFERS, self.nsl_num_buffers.map(i64::from)),
            (keys::NSL_SKIP_COUNT, self.nsl_skip_count.map(i64::from)),
            (
                keys::NSL_BURST_PICTURE_COUNT,
                self.nsl_burst_count.map(i64::from),
            ),
            (keys::SKIP_COUNT, self.skip_count.map(i64::from)),
            (keys::BURST_PICTURE_COUNT, self.burst_count.map(i64::from)),
            (keys::RAW_DUMP_FLAG, self.raw_dump_flag.map(i64::from)),
            (keys::SATURATION, self.saturation.map(i64::from)),
            (keys::EDGE_ENHANCEMENT, self.edge_enhancement.map(i64::from)),
            (keys::EXPOSURE_TIME, self.exposure_time.map(i64::from)),
            (keys::FOCUS_POSITION, self.focus_position.map(i64::from)),
        ];
        for (key, value) in ints {
            if let Some(v) = value {
                values.push((key, v.to_string()));
            }
        }

        if let Some(bracket) = &self.ev_bracket_capture {
            values.push((keys::EV_BRACKET_CAPTURE, bracket.encode()));
        }

        // An empty region list has no wire form and leaves the key unset
        let areas = [
            (keys::FOCUS_AREAS, &self.focus_areas),
            (keys::METERING_AREAS, &self.metering_areas),
        ];
        for (key, regions) in areas {
            if let Some(encoded) = regions.as_deref().and_then(encode_regions) {
                values.push((key, encoded));
            }
        }

        if let Some(matrix) = &self.color_correction {
            values.push((keys::COLOR_CORRECTION, matrix.encode()));
        }
        if let Some(contrast) = self.contrast {
            values.push((keys::CONTRAST, contrast.to_string()));
        }
        if let Some(iso) = self.picture_iso {
            values.push((keys::PICTURE_ISO, iso.to_string()));
        }
        if let Some(lock) = self.auto_white_balance_lock {
            values.push((keys::AUTO_WHITE_BALANCE_LOCK, lock.to_string()));
        }
        if let Some(lock) = self.auto_exposure_lock {
            values.push((keys::AUTO_EXPOSURE_LOCK, lock.to_string()));
        }

        values
    }

    fn apply_wire_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            keys::NSL_NUM_BUFFERS => self.nsl_num_buffers = Some(parse_wire(key, value)?),
            keys::NSL_SKIP_COUNT => self.nsl_skip_count = Some(parse_wire(key, value)?),
            keys::NSL_BURST_PICTURE_COUNT => self.nsl_burst_count = Some(parse_wire(key, value)?),
            keys::SKIP_COUNT => self.skip_count = Some(parse_wire(key, value)?),
            keys::BURST_PICTURE_COUNT => self.burst_count = Some(parse_wire(key, value)?),
            keys::RAW_DUMP_FLAG => {
                let flag = parse_wire(key, value)?;
                check_raw_dump_flag(flag)?;
                self.raw_dump_flag = Some(flag);
            }
            keys::EV_BRACKET_CAPTURE => {
                self.ev_bracket_capture = Some(EvBracket::decode(key, value)?)
            }
            keys::FOCUS_AREAS => self.focus_areas = Some(decode_regions(Some(value))?),
            keys::METERING_AREAS => self.metering_areas = Some(decode_regions(Some(value))?),
            keys::COLOR_CORRECTION => {
                self.color_correction = Some(ColorCorrection::decode(key, value)?)
            }
            keys::SATURATION => self.saturation = Some(parse_wire(key, value)?),
            keys::CONTRAST => self.contrast = Some(value.parse()?),
            keys::EDGE_ENHANCEMENT => {
                let edge = parse_wire(key, value)?;
                check_edge_enhancement(edge)?;
                self.edge_enhancement = Some(edge);
            }
            keys::EXPOSURE_TIME => self.exposure_time = Some(parse_wire(key, value)?),
            keys::PICTURE_ISO => self.picture_iso = Some(value.parse()?),
            keys::FOCUS_POSITION => self.focus_position = Some(parse_wire(key, value)?),
            keys::AUTO_WHITE_BALANCE_LOCK => {
                self.auto_white_balance_lock = Some(parse_flag(key, value)?)
            }
            keys::AUTO_EXPOSURE_LOCK => self.auto_exposure_lock = Some(parse_flag(key, value)?),
            _ => {
                return Err(ExtError::system(format!(
                    "'{}' is not a vendor camera parameter",
                    key
                )))
            }
        }
        Ok(())
    }

    // Negative shutter lag

    /// Number of buffers kept for negative shutter lag capture. Defaults to 0.
    pub fn set_nsl_num_buffers(&mut self, count: u32) {
        self.nsl_num_buffers = Some(count);
    }

    pub fn nsl_num_buffers(&self) -> u32 {
        self.nsl_num_buffers.unwrap_or(0)
    }

    /// Frames skipped between NSL burst pictures. Defaults to 0.
    pub fn set_nsl_skip_count(&mut self, count: u32) {
        self.nsl_skip_count = Some(count);
    }

    pub fn nsl_skip_count(&self) -> u32 {
        self.nsl_skip_count.unwrap_or(0)
    }

    /// Pictures taken from the NSL buffers. Defaults to 0.
    pub fn set_nsl_burst_count(&mut self, count: u32) {
        self.nsl_burst_count = Some(count);
    }

    pub fn nsl_burst_count(&self) -> u32 {
        self.nsl_burst_count.unwrap_or(0)
    }

    /// Whether the NSL burst fits in the NSL buffers:
    /// `burst + skip * (burst - 1) <= buffers`.
    pub fn nsl_burst_is_valid(&self) -> bool {
        let burst = u64::from(self.nsl_burst_count());
        if burst == 0 {
            return true;
        }
        let needed = burst + u64::from(self.nsl_skip_count()) * (burst - 1);
        needed <= u64::from(self.nsl_num_buffers())
    }

    // Burst capture

    /// Frames skipped between burst pictures. Defaults to 0.
    pub fn set_skip_count(&mut self, count: u32) {
        self.skip_count = Some(count);
    }

    pub fn skip_count(&self) -> u32 {
        self.skip_count.unwrap_or(0)
    }

    /// Pictures taken per capture. Defaults to 1.
    pub fn set_burst_count(&mut self, count: u32) {
        self.burst_count = Some(count);
    }

    pub fn burst_count(&self) -> u32 {
        self.burst_count.unwrap_or(1)
    }

    /// Raw sensor dump flags (3 bits). Must be 0 in burst mode. Defaults to 0.
    pub fn set_raw_dump_flag(&mut self, flag: u8) -> Result<()> {
        check_raw_dump_flag(flag)?;
        self.raw_dump_flag = Some(flag);
        Ok(())
    }

    pub fn raw_dump_flag(&self) -> u8 {
        self.raw_dump_flag.unwrap_or(0)
    }

    pub fn set_ev_bracket_capture(&mut self, bracket: EvBracket) {
        self.ev_bracket_capture = Some(bracket);
    }

    pub fn ev_bracket_capture(&self) -> EvBracket {
        self.ev_bracket_capture.clone().unwrap_or_default()
    }

    // Areas

    pub fn set_focus_areas(&mut self, regions: Vec<Region>) {
        self.focus_areas = Some(regions);
    }

    pub fn focus_areas(&self) -> Vec<Region> {
        self.focus_areas.clone().unwrap_or_default()
    }

    pub fn set_metering_areas(&mut self, regions: Vec<Region>) {
        self.metering_areas = Some(regions);
    }

    pub fn metering_areas(&self) -> Vec<Region> {
        self.metering_areas.clone().unwrap_or_default()
    }

    // Image processing

    pub fn set_color_correction(&mut self, matrix: ColorCorrection) {
        self.color_correction = Some(matrix);
    }

    pub fn color_correction(&self) -> ColorCorrection {
        self.color_correction.unwrap_or_default()
    }

    pub fn set_saturation(&mut self, saturation: i32) {
        self.saturation = Some(saturation);
    }

    pub fn saturation(&self) -> i32 {
        self.saturation.unwrap_or(0)
    }

    pub fn set_contrast(&mut self, contrast: Contrast) {
        self.contrast = Some(contrast);
    }

    pub fn contrast(&self) -> Contrast {
        self.contrast.unwrap_or_default()
    }

    /// Edge enhancement in [-100, 100], or -101 to turn it off
    pub fn set_edge_enhancement(&mut self, value: i32) -> Result<()> {
        check_edge_enhancement(value)?;
        self.edge_enhancement = Some(value);
        Ok(())
    }

    pub fn edge_enhancement(&self) -> i32 {
        self.edge_enhancement.unwrap_or(0)
    }

    // Exposure and focus

    /// Exposure time in microseconds, 0 for auto exposure
    pub fn set_exposure_time(&mut self, micros: u32) {
        self.exposure_time = Some(micros);
    }

    pub fn exposure_time(&self) -> u32 {
        self.exposure_time.unwrap_or(0)
    }

    pub fn set_picture_iso(&mut self, iso: PictureIso) {
        self.picture_iso = Some(iso);
    }

    pub fn picture_iso(&self) -> PictureIso {
        self.picture_iso.unwrap_or_default()
    }

    pub fn set_focus_position(&mut self, position: i32) {
        self.focus_position = Some(position);
    }

    pub fn focus_position(&self) -> i32 {
        self.focus_position.unwrap_or(0)
    }

    pub fn set_auto_white_balance_lock(&mut self, lock: bool) {
        self.auto_white_balance_lock = Some(lock);
    }

    pub fn auto_white_balance_lock(&self) -> bool {
        self.auto_white_balance_lock.unwrap_or(false)
    }

    pub fn set_auto_exposure_lock(&mut self, lock: bool) {
        self.auto_exposure_lock = Some(lock);
    }

    pub fn auto_exposure_lock(&self) -> bool {
        self.auto_exposure_lock.unwrap_or(false)
    }
}

fn parse_wire<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ExtError::parameter_parse(key, value, e.to_string()))
}

// Lock flags are matched without regard to case
fn parse_flag(key: &str, value: &str) -> Result<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ExtError::parameter_parse(key, value, "expected true or false"))
    }
}

fn check_raw_dump_flag(flag: u8) -> Result<()> {
    if flag > RAW_DUMP_FLAG_MAX {
        return Err(ExtError::invalid_value(
            "raw dump flag",
            format!("{} does not fit in 3 bits", flag),
        ));
    }
    Ok(())
}

fn check_edge_enhancement(value: i32) -> Result<()> {
    if !(EDGE_ENHANCEMENT_OFF..=EDGE_ENHANCEMENT_MAX).contains(&value) {
        return Err(ExtError::invalid_value(
            "edge enhancement",
            format!("{} outside [-101, 100]", value),
        ));
    }
    Ok(())
}
