//! DualSense vendor extensions: adaptive trigger codec and effects report

pub mod report;
pub mod trigger_effects;

pub use report::{enable_bits_1, enable_bits_2, Ds5EffectsState, REPORT_LEN};
pub use trigger_effects::{EffectType, TriggerEffect, ZONE_COUNT};
