use core::fmt;

use log::debug;

use super::types::{Brightness, Mode};

/// Two-part property key: a group and a member register.
///
/// The wire carries the parts as separate tokens (`2 4`); logs and the
/// vendor notes write them concatenated (`24`), which is what [`Display`]
/// renders.
///
/// [`Display`]: core::fmt::Display
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PropertyId {
    pub group: u8,
    pub member: u8,
}

impl PropertyId {
    pub const POWER: PropertyId = PropertyId::new(2, 1);
    pub const MODE: PropertyId = PropertyId::new(2, 4);
    pub const AIR_QUALITY: PropertyId = PropertyId::new(3, 4);
    pub const FILTER_LIFE: PropertyId = PropertyId::new(4, 1);
    pub const BEEPER: PropertyId = PropertyId::new(6, 1);
    pub const BRIGHTNESS: PropertyId = PropertyId::new(7, 2);
    pub const LOCK: PropertyId = PropertyId::new(8, 1);
    pub const MANUAL_SPEED: PropertyId = PropertyId::new(9, 1);

    pub const fn new(group: u8, member: u8) -> Self {
        PropertyId { group, member }
    }

    /// Decode an id from its two wire tokens. `None` if either token is
    /// not a number, in which case the record cannot name a property.
    fn from_tokens(group: &str, member: &str) -> Option<Self> {
        Some(PropertyId {
            group: group.parse().ok()?,
            member: member.parse().ok()?,
        })
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.group, self.member)
    }
}

/// Token layout of the property records inside a frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordShape {
    /// `properties_changed`: two id tokens, then the value.
    Changed,
    /// `result`: two id tokens, a reserved token, then the value.
    Snapshot,
}

/// Single-pass decoder for the property records of one frame.
///
/// Yields `(id, value)` pairs in token order. Decoding stops at the first
/// record with a missing token; a truncated record is never produced.
/// Records whose id tokens are not numeric are skipped without aborting
/// the rest of the pass.
pub struct Records<I> {
    tokens: I,
    shape: RecordShape,
}

impl<I> Records<I> {
    pub fn new(tokens: I, shape: RecordShape) -> Self {
        Records { tokens, shape }
    }
}

impl<'a, I> Iterator for Records<I>
where
    I: Iterator<Item = &'a str>,
{
    type Item = (PropertyId, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let group = self.tokens.next()?;
            let member = self.tokens.next()?;
            if let RecordShape::Snapshot = self.shape {
                // reserved token between the id and the value
                self.tokens.next()?;
            }
            let value = self.tokens.next()?;
            match PropertyId::from_tokens(group, member) {
                Some(id) => return Some((id, value)),
                None => continue,
            }
        }
    }
}

/// Last state reported by the device.
///
/// Every field stays `None` until the device first reports the property.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PurifierState {
    /// Air quality reading (PM2.5, µg/m³).
    pub air_quality: Option<f32>,
    /// Remaining filter life, percent.
    pub filter_life: Option<f32>,
    pub power: Option<bool>,
    pub mode: Option<Mode>,
    pub beeper: Option<bool>,
    pub lock: Option<bool>,
    pub brightness: Option<Brightness>,
    /// Manual fan speed, surfaced one-based (the device reports it
    /// zero-based).
    pub manual_speed: Option<f32>,
    /// Set while the device reports mode code 3 ("preset"); `mode` keeps
    /// its previous value for the duration.
    pub preset_active: bool,
}

impl PurifierState {
    pub fn new() -> Self {
        PurifierState::default()
    }

    /// Apply one decoded property record.
    ///
    /// Unknown ids are ignored so that newer firmware cannot break the
    /// rest of a frame. Values that fail to parse fall back to zero/false;
    /// the link is best-effort and a bad token must not stall dispatch.
    pub fn apply(&mut self, id: PropertyId, value: &str) {
        match id {
            PropertyId::AIR_QUALITY => self.air_quality = Some(parse_float(value)),
            PropertyId::FILTER_LIFE => self.filter_life = Some(parse_float(value)),
            PropertyId::POWER => self.power = Some(parse_bool(value)),
            PropertyId::MODE => {
                self.preset_active = false;
                match parse_code(value) {
                    3 => self.preset_active = true,
                    code => {
                        if let Some(mode) = Mode::from_repr(code) {
                            self.mode = Some(mode);
                        }
                    }
                }
            }
            PropertyId::BEEPER => self.beeper = Some(parse_bool(value)),
            PropertyId::LOCK => self.lock = Some(parse_bool(value)),
            PropertyId::BRIGHTNESS => {
                if let Some(brightness) = Brightness::from_repr(parse_code(value)) {
                    self.brightness = Some(brightness);
                }
            }
            PropertyId::MANUAL_SPEED => self.manual_speed = Some(parse_float(value) + 1.0),
            _ => debug!("ignoring unknown property {}", id),
        }
    }
}

fn parse_float(token: &str) -> f32 {
    token.parse().unwrap_or(0.0)
}

fn parse_bool(token: &str) -> bool {
    token == "true"
}

fn parse_code(token: &str) -> u8 {
    token.parse().unwrap_or(0)
}
