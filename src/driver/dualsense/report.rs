//! DualSense effects report
//!
//! Byte layout of the output structure the native library forwards to the
//! controller firmware. Only the fields a driver needs are exposed as typed
//! setters; everything else stays zero, which the firmware reads as "leave
//! unchanged" because the matching enable bit is clear.
//!
//! ```text
//! 0      enable bits 1        10..21  right trigger effect block
//! 1      enable bits 2        21..32  left trigger effect block
//! 2, 3   rumble right, left   32..38  reserved
//! 4..8   volumes, audio bits  38..43  led flags, animation, brightness
//! 8      mic light mode       43      player indicator lights
//! 9      audio mute bits      44..47  led red, green, blue
//! ```

use super::trigger_effects::TriggerEffect;

/// Enable bits in byte 0 of the report
pub mod enable_bits_1 {
    pub const ENABLE_RUMBLE_EMULATION: u8 = 0x01;
    pub const USE_RUMBLE_NOT_HAPTICS: u8 = 0x02;
    pub const ALLOW_RIGHT_TRIGGER_FFB: u8 = 0x04;
    pub const ALLOW_LEFT_TRIGGER_FFB: u8 = 0x08;
    pub const ALLOW_HEADPHONE_VOLUME: u8 = 0x10;
    pub const ALLOW_SPEAKER_VOLUME: u8 = 0x20;
    pub const ALLOW_MIC_VOLUME: u8 = 0x40;
    pub const ALLOW_AUDIO_CONTROL: u8 = 0x80;
}

/// Enable bits in byte 1 of the report
pub mod enable_bits_2 {
    pub const ALLOW_MUTE_LIGHT: u8 = 0x01;
    pub const ALLOW_AUDIO_MUTE: u8 = 0x02;
    pub const ALLOW_LED_COLOR: u8 = 0x04;
    pub const RESET_LIGHTS: u8 = 0x08;
    pub const ALLOW_PLAYER_INDICATORS: u8 = 0x10;
    pub const ALLOW_HAPTIC_LOW_PASS_FILTER: u8 = 0x20;
    pub const ALLOW_MOTOR_POWER_LEVEL: u8 = 0x40;
    pub const ALLOW_AUDIO_CONTROL_2: u8 = 0x80;
}

pub const REPORT_LEN: usize = 47;

const ENABLE_BITS_1: usize = 0;
const ENABLE_BITS_2: usize = 1;
const MIC_LIGHT_MODE: usize = 8;
const RIGHT_TRIGGER_EFFECT: usize = 10;
const LEFT_TRIGGER_EFFECT: usize = 21;
const LED_RED: usize = 44;
const LED_GREEN: usize = 45;
const LED_BLUE: usize = 46;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ds5EffectsState {
    bytes: [u8; REPORT_LEN],
}

impl Default for Ds5EffectsState {
    fn default() -> Self {
        Self::new()
    }
}

impl Ds5EffectsState {
    pub fn new() -> Self {
        Self {
            bytes: [0; REPORT_LEN],
        }
    }

    pub fn enable_bits_1(&self) -> u8 {
        self.bytes[ENABLE_BITS_1]
    }

    pub fn enable_bits_2(&self) -> u8 {
        self.bytes[ENABLE_BITS_2]
    }

    pub fn set_left_trigger_effect(&mut self, effect: &TriggerEffect) {
        self.bytes[ENABLE_BITS_1] |= enable_bits_1::ALLOW_LEFT_TRIGGER_FFB;
        self.write_block(LEFT_TRIGGER_EFFECT, &effect.to_block());
    }

    pub fn set_right_trigger_effect(&mut self, effect: &TriggerEffect) {
        self.bytes[ENABLE_BITS_1] |= enable_bits_1::ALLOW_RIGHT_TRIGGER_FFB;
        self.write_block(RIGHT_TRIGGER_EFFECT, &effect.to_block());
    }

    /// Mute LED on or off
    pub fn set_mute_light(&mut self, on: bool) {
        self.bytes[ENABLE_BITS_2] |= enable_bits_2::ALLOW_MUTE_LIGHT;
        self.bytes[MIC_LIGHT_MODE] = u8::from(on);
    }

    pub fn set_led_color(&mut self, red: u8, green: u8, blue: u8) {
        self.bytes[ENABLE_BITS_2] |= enable_bits_2::ALLOW_LED_COLOR;
        self.bytes[LED_RED] = red;
        self.bytes[LED_GREEN] = green;
        self.bytes[LED_BLUE] = blue;
    }

    pub fn mic_light_mode(&self) -> u8 {
        self.bytes[MIC_LIGHT_MODE]
    }

    pub fn left_trigger_block(&self) -> &[u8] {
        &self.bytes[LEFT_TRIGGER_EFFECT..LEFT_TRIGGER_EFFECT + TriggerEffect::BLOCK_LEN]
    }

    pub fn right_trigger_block(&self) -> &[u8] {
        &self.bytes[RIGHT_TRIGGER_EFFECT..RIGHT_TRIGGER_EFFECT + TriggerEffect::BLOCK_LEN]
    }

    /// Raw report exactly as handed to the native library
    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.bytes
    }

    fn write_block(&mut self, offset: usize, block: &[u8; TriggerEffect::BLOCK_LEN]) {
        self.bytes[offset..offset + TriggerEffect::BLOCK_LEN].copy_from_slice(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::dualsense::trigger_effects;

    #[test]
    fn empty_report_is_all_zero() {
        let report = Ds5EffectsState::new();
        assert_eq!(report.as_bytes(), &[0u8; REPORT_LEN]);
    }

    #[test]
    fn trigger_blocks_land_at_their_offsets() {
        let mut report = Ds5EffectsState::new();
        let left = trigger_effects::feedback(0, 8).unwrap();
        let right = trigger_effects::weapon(2, 3, 1).unwrap();
        report.set_left_trigger_effect(&left);
        report.set_right_trigger_effect(&right);

        assert_eq!(
            report.enable_bits_1(),
            enable_bits_1::ALLOW_LEFT_TRIGGER_FFB | enable_bits_1::ALLOW_RIGHT_TRIGGER_FFB
        );
        assert_eq!(report.left_trigger_block(), &left.to_block());
        assert_eq!(report.as_bytes()[10], 0x25);
        assert_eq!(report.as_bytes()[21], 0x21);
        assert_eq!(report.as_bytes()[32..], [0u8; 15]);
    }

    #[test]
    fn mute_light_sets_mode_and_enable_bit() {
        let mut report = Ds5EffectsState::new();
        report.set_mute_light(true);

        assert_eq!(report.enable_bits_2(), enable_bits_2::ALLOW_MUTE_LIGHT);
        assert_eq!(report.mic_light_mode(), 1);
        assert_eq!(report.as_bytes()[8], 1);
    }

    #[test]
    fn led_color_fields() {
        let mut report = Ds5EffectsState::new();
        report.set_led_color(10, 20, 30);
        assert_eq!(&report.as_bytes()[44..47], &[10, 20, 30]);
        assert_eq!(report.enable_bits_2(), enable_bits_2::ALLOW_LED_COLOR);
    }

    #[test]
    fn body_rumble_and_player_lights_stay_untouched() {
        // Body rumble goes through the native rumble call, never the report.
        let mut report = Ds5EffectsState::new();
        report.set_left_trigger_effect(&trigger_effects::feedback(0, 8).unwrap());
        report.set_right_trigger_effect(&trigger_effects::vibration(3, 8, 40).unwrap());
        report.set_mute_light(true);
        report.set_led_color(1, 2, 3);

        let bytes = report.as_bytes();
        assert_eq!(bytes[2..4], [0, 0]);
        assert_eq!(bytes[43], 0);
        assert_eq!(report.enable_bits_1() & enable_bits_1::ENABLE_RUMBLE_EMULATION, 0);
        assert_eq!(report.enable_bits_2() & enable_bits_2::ALLOW_PLAYER_INDICATORS, 0);
    }
}
