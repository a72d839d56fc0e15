//! Gamepad backend on top of gilrs
//!
//! gilrs keeps the latest state of every gamepad internally and updates it
//! while its event queue is drained, so [`pump_events`] has to run once per
//! tick before the drivers update.

use std::cell::RefCell;
use std::rc::Rc;

use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Replay, Ticks};
use gilrs::{Axis, Button, Gamepad, GamepadId, Gilrs};
use tracing::{debug, error, info, warn};

use super::error::NativeError;
use super::native::{
    power_state, DeviceProperties, FingerSample, GamepadAxis, GamepadButton, NativeController,
    NativeGamepad, PowerInfo, SensorType,
};
use crate::controller::{ControllerInfo, ControllerType};

pub type SharedGilrs = Rc<RefCell<Gilrs>>;

const MAPPING_ID: &str = "gilrs";

pub fn open_gilrs() -> Result<SharedGilrs, NativeError> {
    info!("Initializing gilrs controller interface");
    match Gilrs::new() {
        Ok(gilrs) => {
            info!("Successfully initialized gilrs");
            Ok(Rc::new(RefCell::new(gilrs)))
        }
        Err(e) => {
            error!("Failed to initialize gilrs: {}", e);
            Err(NativeError::new("gilrs_init", e.to_string()))
        }
    }
}

/// Drains pending gilrs events so cached gamepad state is current. Returns
/// the number of events processed.
pub fn pump_events(gilrs: &SharedGilrs) -> usize {
    let Ok(mut gilrs) = gilrs.try_borrow_mut() else {
        warn!("gilrs busy, skipping event pump");
        return 0;
    };

    let mut count = 0;
    while let Some(event) = gilrs.next_event() {
        debug!("gilrs event {:?} from {}", event.event, event.id);
        count += 1;
    }
    count
}

/// Classifies a gamepad by its reported name
pub fn controller_type_for(name: &str) -> ControllerType {
    let lower = name.to_lowercase();
    let controller_type = if lower.contains("dualsense") || lower.contains("ps5") {
        ControllerType::new(ControllerType::DUALSENSE_NAMESPACE, name)
    } else if lower.contains("xbox") {
        ControllerType::new("xbox", name)
    } else {
        ControllerType::new("gilrs", name)
    };
    controller_type.with_mapping_id(MAPPING_ID)
}

/// Opens every connected gamepad
pub fn enumerate_gamepads(gilrs: &SharedGilrs) -> Vec<(ControllerInfo, GilrsGamepad)> {
    let ids: Vec<(GamepadId, String)> = match gilrs.try_borrow() {
        Ok(gilrs) => gilrs
            .gamepads()
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .collect(),
        Err(e) => {
            error!("Failed to enumerate gamepads: {}", e);
            return Vec::new();
        }
    };

    if ids.is_empty() {
        warn!("No gamepad connected");
    }

    ids.into_iter()
        .map(|(id, name)| {
            info!("Found gamepad {}: {}", id, name);
            let info = ControllerInfo::new(format!("gilrs-{id}"), controller_type_for(&name));
            (info, GilrsGamepad::new(Rc::clone(gilrs), id))
        })
        .collect()
}

fn unit_to_short(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

fn guid_string(uuid: [u8; 16]) -> String {
    uuid.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn native_button(button: GamepadButton) -> Option<Button> {
    match button {
        GamepadButton::South => Some(Button::South),
        GamepadButton::East => Some(Button::East),
        GamepadButton::West => Some(Button::West),
        GamepadButton::North => Some(Button::North),
        GamepadButton::Back => Some(Button::Select),
        GamepadButton::Guide => Some(Button::Mode),
        GamepadButton::Start => Some(Button::Start),
        GamepadButton::LeftStick => Some(Button::LeftThumb),
        GamepadButton::RightStick => Some(Button::RightThumb),
        GamepadButton::LeftShoulder => Some(Button::LeftTrigger),
        GamepadButton::RightShoulder => Some(Button::RightTrigger),
        GamepadButton::DpadUp => Some(Button::DPadUp),
        GamepadButton::DpadDown => Some(Button::DPadDown),
        GamepadButton::DpadLeft => Some(Button::DPadLeft),
        GamepadButton::DpadRight => Some(Button::DPadRight),
        GamepadButton::Misc1 => Some(Button::C),
        _ => None,
    }
}

/// One gilrs gamepad behind the native gamepad traits
///
/// gilrs has no sensor, touchpad, trigger rumble or raw report access; those
/// calls report "unsupported" and the driver leaves the matching components
/// off.
pub struct GilrsGamepad {
    gilrs: SharedGilrs,
    id: GamepadId,
    rumble: Option<Effect>,
}

impl GilrsGamepad {
    pub fn new(gilrs: SharedGilrs, id: GamepadId) -> Self {
        Self {
            gilrs,
            id,
            rumble: None,
        }
    }

    pub fn id(&self) -> GamepadId {
        self.id
    }

    fn with_gamepad<T>(&self, default: T, read: impl FnOnce(&Gamepad<'_>) -> T) -> T {
        let Ok(gilrs) = self.gilrs.try_borrow() else {
            return default;
        };
        let value = gilrs.connected_gamepad(self.id).map(|gamepad| read(&gamepad));
        value.unwrap_or(default)
    }
}

impl NativeController for GilrsGamepad {
    fn properties(&self) -> DeviceProperties {
        DeviceProperties {
            rumble: self.with_gamepad(false, |gamepad| gamepad.is_ff_supported()),
            ..DeviceProperties::default()
        }
    }

    fn name(&self) -> Option<String> {
        self.with_gamepad(None, |gamepad| Some(gamepad.name().to_string()))
    }

    fn guid(&self) -> String {
        self.with_gamepad(String::new(), |gamepad| guid_string(gamepad.uuid()))
    }

    fn serial(&self) -> Option<String> {
        None
    }

    fn close(&mut self) -> Result<(), NativeError> {
        self.rumble = None;
        Ok(())
    }

    fn rumble(&mut self, low_frequency: u16, high_frequency: u16, duration_ms: u32) -> Result<(), NativeError> {
        if low_frequency == 0 && high_frequency == 0 {
            self.rumble = None;
            return Ok(());
        }

        let scheduling = Replay {
            play_for: Ticks::from_ms(duration_ms),
            ..Default::default()
        };
        let mut gilrs = self
            .gilrs
            .try_borrow_mut()
            .map_err(|e| NativeError::new("rumble", e.to_string()))?;

        let effect = EffectBuilder::new()
            .add_effect(BaseEffect {
                kind: BaseEffectType::Strong {
                    magnitude: low_frequency,
                },
                scheduling,
                ..Default::default()
            })
            .add_effect(BaseEffect {
                kind: BaseEffectType::Weak {
                    magnitude: high_frequency,
                },
                scheduling,
                ..Default::default()
            })
            .gamepads(&[self.id])
            .finish(&mut gilrs)
            .map_err(|e| NativeError::new("rumble", e.to_string()))?;
        effect
            .play()
            .map_err(|e| NativeError::new("rumble", e.to_string()))?;

        self.rumble = Some(effect);
        Ok(())
    }

    fn rumble_triggers(&mut self, _left: u16, _right: u16, _duration_ms: u32) -> Result<(), NativeError> {
        Err(NativeError::unsupported("rumble_triggers"))
    }

    fn power_info(&self) -> PowerInfo {
        let unknown = PowerInfo {
            state: power_state::UNKNOWN,
            percent: -1,
        };
        self.with_gamepad(unknown, |gamepad| match gamepad.power_info() {
            gilrs::PowerInfo::Unknown => unknown,
            gilrs::PowerInfo::Wired => PowerInfo {
                state: power_state::NO_BATTERY,
                percent: -1,
            },
            gilrs::PowerInfo::Discharging(percent) => PowerInfo {
                state: power_state::ON_BATTERY,
                percent: i32::from(percent),
            },
            gilrs::PowerInfo::Charging(percent) => PowerInfo {
                state: power_state::CHARGING,
                percent: i32::from(percent),
            },
            gilrs::PowerInfo::Charged => PowerInfo {
                state: power_state::CHARGED,
                percent: 100,
            },
        })
    }

    fn send_effect(&mut self, _data: &[u8]) -> Result<(), NativeError> {
        Err(NativeError::unsupported("send_effect"))
    }
}

impl NativeGamepad for GilrsGamepad {
    fn has_sensor(&self, _sensor: SensorType) -> bool {
        false
    }

    fn set_sensor_enabled(&mut self, _sensor: SensorType, _enabled: bool) -> Result<(), NativeError> {
        Err(NativeError::unsupported("set_sensor_enabled"))
    }

    fn sensor_data(&self, _sensor: SensorType, _out: &mut [f32]) -> Result<(), NativeError> {
        Err(NativeError::unsupported("sensor_data"))
    }

    fn touchpad_count(&self) -> usize {
        0
    }

    fn touchpad_finger_count(&self, _touchpad: usize) -> usize {
        0
    }

    fn touchpad_finger(&self, _touchpad: usize, _finger: usize) -> Result<FingerSample, NativeError> {
        Err(NativeError::unsupported("touchpad_finger"))
    }

    fn axis(&self, axis: GamepadAxis) -> i16 {
        self.with_gamepad(0, |gamepad| {
            // gilrs reports Y up as positive, native convention is down
            let value = match axis {
                GamepadAxis::LeftX => gamepad.value(Axis::LeftStickX),
                GamepadAxis::LeftY => -gamepad.value(Axis::LeftStickY),
                GamepadAxis::RightX => gamepad.value(Axis::RightStickX),
                GamepadAxis::RightY => -gamepad.value(Axis::RightStickY),
                GamepadAxis::LeftTrigger => gamepad
                    .button_data(Button::LeftTrigger2)
                    .map_or(0.0, |data| data.value()),
                GamepadAxis::RightTrigger => gamepad
                    .button_data(Button::RightTrigger2)
                    .map_or(0.0, |data| data.value()),
            };
            unit_to_short(value)
        })
    }

    fn button(&self, button: GamepadButton) -> bool {
        let Some(button) = native_button(button) else {
            return false;
        };
        self.with_gamepad(false, |gamepad| gamepad.is_pressed(button))
    }
}
