//! Native input library surface consumed by the drivers
//!
//! The traits mirror the C-style API of the underlying library: opaque
//! handles, raw enum codes and boolean-or-error calls. Drivers never talk to
//! the library directly, they only see these traits. That keeps the
//! lifecycle and pool logic in one place for every device class and lets
//! tests script device behavior.
//!
//! Reads take `&self`, anything that changes device state takes `&mut self`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::error::NativeError;

/// Raw power state codes returned by [`NativeController::power_info`]
pub mod power_state {
    pub const ERROR: i32 = -1;
    pub const UNKNOWN: i32 = 0;
    pub const ON_BATTERY: i32 = 1;
    pub const NO_BATTERY: i32 = 2;
    pub const CHARGING: i32 = 3;
    pub const CHARGED: i32 = 4;
}

/// Raw hat codes returned by [`NativeJoystick::hat`]
pub mod hat {
    pub const CENTERED: u8 = 0x00;
    pub const UP: u8 = 0x01;
    pub const RIGHT: u8 = 0x02;
    pub const DOWN: u8 = 0x04;
    pub const LEFT: u8 = 0x08;
    pub const RIGHT_UP: u8 = RIGHT | UP;
    pub const RIGHT_DOWN: u8 = RIGHT | DOWN;
    pub const LEFT_UP: u8 = LEFT | UP;
    pub const LEFT_DOWN: u8 = LEFT | DOWN;
}

/// Capability properties reported by an open device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceProperties {
    pub rumble: bool,
    pub trigger_rumble: bool,
}

/// Output of the power query: a raw [`power_state`] code and a percentage
/// that is only meaningful while on battery or charging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerInfo {
    pub state: i32,
    pub percent: i32,
}

/// Calls shared by every device class
pub trait NativeController {
    fn properties(&self) -> DeviceProperties;

    fn name(&self) -> Option<String>;

    fn guid(&self) -> String;

    fn serial(&self) -> Option<String>;

    /// Releases the native handle. Called exactly once by the driver.
    fn close(&mut self) -> Result<(), NativeError>;

    fn rumble(
        &mut self,
        low_frequency: u16,
        high_frequency: u16,
        duration_ms: u32,
    ) -> Result<(), NativeError>;

    fn rumble_triggers(&mut self, left: u16, right: u16, duration_ms: u32)
        -> Result<(), NativeError>;

    fn power_info(&self) -> PowerInfo;

    /// Sends a raw vendor effect report verbatim
    fn send_effect(&mut self, data: &[u8]) -> Result<(), NativeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    Gyro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    /// `0..=i16::MAX`, never negative
    LeftTrigger,
    /// `0..=i16::MAX`, never negative
    RightTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    South,
    East,
    West,
    North,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Misc1,
    RightPaddle1,
    LeftPaddle1,
    RightPaddle2,
    LeftPaddle2,
    Touchpad,
    Misc2,
    Misc3,
    Misc4,
    Misc5,
    Misc6,
}

/// Raw touchpad finger query result
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FingerSample {
    /// `1` while the finger touches the pad
    pub state: u8,
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
}

/// Mapped gamepad API
pub trait NativeGamepad: NativeController {
    fn has_sensor(&self, sensor: SensorType) -> bool;

    fn set_sensor_enabled(&mut self, sensor: SensorType, enabled: bool)
        -> Result<(), NativeError>;

    /// Fills `out` with the latest sensor sample
    fn sensor_data(&self, sensor: SensorType, out: &mut [f32]) -> Result<(), NativeError>;

    fn touchpad_count(&self) -> usize;

    fn touchpad_finger_count(&self, touchpad: usize) -> usize;

    fn touchpad_finger(&self, touchpad: usize, finger: usize)
        -> Result<FingerSample, NativeError>;

    fn axis(&self, axis: GamepadAxis) -> i16;

    fn button(&self, button: GamepadButton) -> bool;
}

/// Raw joystick API with index based inputs
pub trait NativeJoystick: NativeController {
    fn axis_count(&self) -> usize;

    fn button_count(&self) -> usize;

    fn hat_count(&self) -> usize;

    fn axis(&self, index: usize) -> i16;

    fn button(&self, index: usize) -> bool;

    /// Raw [`hat`] code
    fn hat(&self, index: usize) -> u8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioDeviceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioStreamId(pub u32);

/// Native sample formats, values match the native library's codes
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    U8 = 0x0008,
    S8 = 0x8008,
    S16Le = 0x8010,
    S16Be = 0x9010,
    S32Le = 0x8020,
    S32Be = 0x9020,
    F32Le = 0x8120,
    F32Be = 0x9120,
}

impl AudioFormat {
    pub fn code(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioSpec {
    pub format: AudioFormat,
    pub channels: u16,
    pub freq: u32,
}

/// Audio playback subsystem of the native library
pub trait AudioSubsystem {
    fn playback_devices(&self) -> Vec<AudioDeviceId>;

    fn device_name(&self, device: AudioDeviceId) -> Option<String>;

    fn device_format(&self, device: AudioDeviceId) -> Result<AudioSpec, NativeError>;

    /// Opens `device` for playback and returns the logical device handle
    fn open_device(
        &mut self,
        device: AudioDeviceId,
        spec: &AudioSpec,
    ) -> Result<AudioDeviceId, NativeError>;

    fn close_device(&mut self, device: AudioDeviceId);

    /// Creates a converting stream from `src` samples to `dst` samples
    fn create_stream(
        &mut self,
        src: &AudioSpec,
        dst: &AudioSpec,
    ) -> Result<AudioStreamId, NativeError>;

    fn destroy_stream(&mut self, stream: AudioStreamId);

    fn bind_stream(
        &mut self,
        device: AudioDeviceId,
        stream: AudioStreamId,
    ) -> Result<(), NativeError>;

    fn put_stream_data(&mut self, stream: AudioStreamId, data: &[u8]) -> Result<(), NativeError>;
}

/// The audio subsystem is process wide; every driver borrows it on the tick
/// thread.
pub type SharedAudio = Rc<RefCell<dyn AudioSubsystem>>;

impl fmt::Display for AudioSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {}ch {}Hz",
            self.format, self.channels, self.freq
        )
    }
}
