//! Adaptive trigger effect encoders
//!
//! Each function turns a high level description into the parameter bytes the
//! DualSense firmware expects after the effect tag. Trigger travel is split
//! into ten zones. Zone forces are stored as `strength - 1` in a 3-bit field
//! starting at bit `3 * zone`, next to a 10-bit mask of the active zones.
//!
//! Any request with zero strength/amplitude (or zero frequency for the
//! vibration effects) encodes as [`off`], never as a zero-filled variant.
//!
//! Layouts follow <https://gist.github.com/Nielk1/6d54cc2c00d2201ccb8c2720ad7538db>.

use crate::driver::error::EffectError;

pub const ZONE_COUNT: usize = 10;

/// Effect tags understood by the trigger firmware
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectType {
    // Official modes; the only ones that update the trigger status nybble
    Off = 0x05,
    Feedback = 0x21,
    Weapon = 0x25,
    Vibration = 0x26,

    // Unofficial effects left in the firmware, may disappear in updates
    Bow = 0x22,
    Galloping = 0x23,
    Machine = 0x27,

    // Older versions of the official modes without parameter protection
    SimpleFeedback = 0x01,
    SimpleWeapon = 0x02,
    SimpleVibration = 0x03,

    // Older versions with limited parameter ranges
    LimitedFeedback = 0x11,
    LimitedWeapon = 0x12,

    // Calibration modes. These corrupt the trigger state until reset.
    DebugFc = 0xFC,
    DebugFd = 0xFD,
    DebugFe = 0xFE,
}

impl EffectType {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Encoded trigger effect: tag plus its raw parameter bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriggerEffect {
    effect_type: EffectType,
    params: Vec<u8>,
}

impl TriggerEffect {
    /// Size of a trigger effect block in the effects report
    pub const BLOCK_LEN: usize = 11;

    fn new(effect_type: EffectType, params: Vec<u8>) -> Self {
        Self {
            effect_type,
            params,
        }
    }

    pub fn effect_type(&self) -> EffectType {
        self.effect_type
    }

    pub fn params(&self) -> &[u8] {
        &self.params
    }

    pub fn is_off(&self) -> bool {
        self.effect_type == EffectType::Off
    }

    /// Tag followed by the parameters, zero padded to [`Self::BLOCK_LEN`]
    pub fn to_block(&self) -> [u8; Self::BLOCK_LEN] {
        let mut block = [0u8; Self::BLOCK_LEN];
        block[0] = self.effect_type.value();
        block[1..=self.params.len()].copy_from_slice(&self.params);
        block
    }
}

impl Default for TriggerEffect {
    fn default() -> Self {
        off()
    }
}

fn require_between(
    parameter: &str,
    value: u8,
    min: u8,
    max: u8,
    requirement: &str,
) -> Result<(), EffectError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(EffectError::InvalidArgument {
            parameter: parameter.to_string(),
            requirement: requirement.to_string(),
        })
    }
}

/// Active-zone mask (2 bytes) followed by the 30 packed force bits (4 bytes)
fn pack_zones(strengths: &[u8; ZONE_COUNT]) -> [u8; 6] {
    let mut active_zones: u16 = 0;
    let mut force_zones: u32 = 0;

    for (zone, &strength) in strengths.iter().enumerate() {
        if strength > 0 {
            let force = u32::from((strength - 1) & 0x07);
            force_zones |= force << (3 * zone);
            active_zones |= 1 << zone;
        }
    }

    let active = active_zones.to_le_bytes();
    let force = force_zones.to_le_bytes();
    [active[0], active[1], force[0], force[1], force[2], force[3]]
}

fn uniform_from(position: u8, strength: u8) -> [u8; ZONE_COUNT] {
    let mut strengths = [0u8; ZONE_COUNT];
    for slot in strengths.iter_mut().skip(position as usize) {
        *slot = strength;
    }
    strengths
}

fn vibration_params(amplitudes: &[u8; ZONE_COUNT], frequency: u8) -> Vec<u8> {
    let mut params = pack_zones(amplitudes).to_vec();
    params.extend_from_slice(&[0, 0, frequency]);
    params
}

/// Turns the effect off and returns the trigger stop to neutral
pub fn off() -> TriggerEffect {
    TriggerEffect::new(EffectType::Off, Vec::new())
}

/// Resistance from `position` to the end of travel
///
/// `position` in `0..=9`, `strength` in `0..=8`.
pub fn feedback(position: u8, strength: u8) -> Result<TriggerEffect, EffectError> {
    require_between("position", position, 0, 9, "between 0 and 9 inclusive")?;
    require_between("strength", strength, 0, 8, "between 0 and 8 inclusive")?;

    if strength == 0 {
        return Ok(off());
    }

    let params = pack_zones(&uniform_from(position, strength));
    Ok(TriggerEffect::new(EffectType::Feedback, params.to_vec()))
}

/// Resistance between `start` and `end`, released after `end` like a gun
/// trigger breaking
///
/// `start` in `2..=7`, `end` in `start+1..=8`, `strength` in `0..=8`.
pub fn weapon(start: u8, end: u8, strength: u8) -> Result<TriggerEffect, EffectError> {
    require_between("start position", start, 2, 7, "between 2 and 7 inclusive")?;
    require_between(
        "end position",
        end,
        start + 1,
        8,
        "between start+1 and 8 inclusive",
    )?;
    require_between("strength", strength, 0, 8, "between 0 and 8 inclusive")?;

    if strength == 0 {
        return Ok(off());
    }

    let start_and_stop_zones: u16 = (1 << start) | (1 << end);
    let zones = start_and_stop_zones.to_le_bytes();
    // A single 3-bit strength; it gets the whole byte.
    Ok(TriggerEffect::new(
        EffectType::Weapon,
        vec![zones[0], zones[1], strength - 1],
    ))
}

/// Vibration beyond `position` at `amplitude` and `frequency` hertz
///
/// `position` in `0..=9`, `amplitude` in `0..=8`. `frequency` is the raw
/// unsigned wire byte: only 0 turns the effect off, and 128..=255 are live
/// vibration frequencies, not negative values.
pub fn vibration(position: u8, amplitude: u8, frequency: u8) -> Result<TriggerEffect, EffectError> {
    require_between("position", position, 0, 9, "between 0 and 9 inclusive")?;
    require_between("amplitude", amplitude, 0, 8, "between 0 and 8 inclusive")?;

    if amplitude == 0 || frequency == 0 {
        return Ok(off());
    }

    let params = vibration_params(&uniform_from(position, amplitude), frequency);
    Ok(TriggerEffect::new(EffectType::Vibration, params))
}

/// Resistance with an explicit strength (`0..=8`) for each of the ten zones
pub fn feedback_multiple_position(
    strength: &[u8; ZONE_COUNT],
) -> Result<TriggerEffect, EffectError> {
    for (zone, &value) in strength.iter().enumerate() {
        require_between(
            &format!("strength[{zone}]"),
            value,
            0,
            8,
            "between 0 and 8 inclusive",
        )?;
    }

    if strength.iter().all(|&value| value == 0) {
        return Ok(off());
    }

    let params = pack_zones(strength);
    Ok(TriggerEffect::new(EffectType::Feedback, params.to_vec()))
}

/// Resistance ramping linearly from `start_strength` at `start` to
/// `end_strength` at `end`, held at `end_strength` after that
///
/// `start` in `0..=8`, `end` in `start+1..=9`, both strengths in `1..=8`.
pub fn feedback_slope(
    start: u8,
    end: u8,
    start_strength: u8,
    end_strength: u8,
) -> Result<TriggerEffect, EffectError> {
    require_between("start position", start, 0, 8, "between 0 and 8 inclusive")?;
    require_between(
        "end position",
        end,
        start + 1,
        9,
        "between start+1 and 9 inclusive",
    )?;
    require_between(
        "start strength",
        start_strength,
        1,
        8,
        "between 1 and 8 inclusive",
    )?;
    require_between(
        "end strength",
        end_strength,
        1,
        8,
        "between 1 and 8 inclusive",
    )?;

    let gradient =
        (f32::from(end_strength) - f32::from(start_strength)) / f32::from(end - start);

    let mut strength = [0u8; ZONE_COUNT];
    for zone in start as usize..ZONE_COUNT {
        strength[zone] = if zone <= end as usize {
            let offset = (zone - start as usize) as f32;
            (f32::from(start_strength) + gradient * offset).round() as u8
        } else {
            end_strength
        };
    }

    feedback_multiple_position(&strength)
}

/// Vibration at one `frequency` with an explicit amplitude (`0..=8`) per zone
///
/// As with [`vibration`], `frequency` is an unsigned wire byte and every
/// non-zero value, including 128..=255, encodes a live vibration.
pub fn vibration_multiple_position(
    frequency: u8,
    amplitude: &[u8; ZONE_COUNT],
) -> Result<TriggerEffect, EffectError> {
    for (zone, &value) in amplitude.iter().enumerate() {
        require_between(
            &format!("amplitude[{zone}]"),
            value,
            0,
            8,
            "between 0 and 8 inclusive",
        )?;
    }

    if frequency == 0 || amplitude.iter().all(|&value| value == 0) {
        return Ok(off());
    }

    let params = vibration_params(amplitude, frequency);
    Ok(TriggerEffect::new(EffectType::Vibration, params))
}
