//! Controller entity and capability components
//!
//! Drivers write into these components during their tick; UI and gameplay
//! code reads them between ticks and only writes through the producer
//! methods (queuing rumble, setting trigger effects, playing haptics).
//!
//! ```text
//! Enumerator ──► ControllerEntity ◄── Driver::update (writer)
//!                      │
//!                      └──► consumers (readers, request producers)
//! ```

pub mod battery;
pub mod dualsense;
pub mod entity;
pub mod haptic;
pub mod input;
pub mod motion;
pub mod rumble;

pub use battery::{BatteryLevelComponent, PowerState};
pub use dualsense::DualSenseComponent;
pub use entity::{
    BluetoothDeviceComponent, Component, ComponentId, ControllerEntity, ControllerInfo,
    ControllerType,
};
pub use haptic::{HapticBuffer, HdHapticComponent, PlayHaptic, SampleEncoding, SampleFormat};
pub use input::{
    gamepad_inputs, joystick_inputs, ControllerState, DeadzoneGroup, HatState, InputComponent,
    InputId,
};
pub use motion::{Finger, GyroComponent, GyroState, TouchPosition, Touchpad, TouchpadComponent};
pub use rumble::{RumbleComponent, RumbleState, TriggerRumbleComponent, TriggerRumbleState};
