//! Device drivers
//!
//! A driver owns one open native device and keeps the components of one
//! [`ControllerEntity`] in sync with it. The tick thread calls
//! [`Driver::update`] at the configured rate; nothing in here blocks or
//! spawns.
//!
//! ```text
//!          ┌──────────────┐   ┌───────────────┐
//!          │ GamepadDriver│   │ JoystickDriver│
//!          └──────┬───────┘   └───────┬───────┘
//!                 └────────┬──────────┘
//!                   CommonDriver<D>  ── HapticOutput ── AudioSubsystem
//!                          │
//!                  NativeController (+ NativeGamepad / NativeJoystick)
//! ```

pub mod common;
pub mod dualsense;
pub mod error;
pub mod gamepad;
#[cfg(feature = "gilrs")]
pub mod gilrs;
pub mod haptic;
pub mod joystick;
pub mod native;
#[cfg(test)]
pub(crate) mod testing;

pub use common::CommonDriver;
pub use error::{DriverError, EffectError, NativeError};
pub use gamepad::GamepadDriver;
pub use haptic::{
    stream_timeout_ticks, AudioStreamHandle, HapticOutput, AUDIO_STREAM_TIMEOUT_SECS, MAX_AUDIO_STREAMS,
};
pub use joystick::JoystickDriver;
pub use native::{AudioSubsystem, NativeController, NativeGamepad, NativeJoystick, SharedAudio};

use crate::controller::ControllerEntity;

pub trait Driver {
    /// Attaches every component this driver maintains. Called exactly once.
    fn add_components(&mut self, entity: &mut ControllerEntity) -> Result<(), DriverError>;

    /// Runs one tick: sends pending output requests and polls input
    ///
    /// Transient native failures are logged and skipped. Only illegal states
    /// are returned.
    fn update(&mut self, entity: &mut ControllerEntity, out_of_focus: bool)
        -> Result<(), DriverError>;

    /// Releases the native device. A second call is an illegal state.
    fn close(&mut self) -> Result<(), DriverError>;

    /// Native name of the device
    fn driver_name(&self) -> &str;
}

/// Maps a native signed 16-bit axis value onto `[-1, 1]`
///
/// Each half is scaled separately so both extremes land exactly on -1 and 1.
pub fn map_short_to_float(value: i16) -> f32 {
    if value < 0 {
        f32::from(value) / 32768.0
    } else {
        f32::from(value) / 32767.0
    }
}

/// Part of a unit axis value above center
pub fn positive_half(value: f32) -> f32 {
    value.max(0.0)
}

/// Part of a unit axis value below center, as a positive magnitude
pub fn negative_half(value: f32) -> f32 {
    -value.min(0.0)
}
