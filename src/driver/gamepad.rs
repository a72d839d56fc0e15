//! Driver for devices the native library recognizes as mapped gamepads

use tracing::{debug, error, warn};

use super::common::CommonDriver;
use super::error::DriverError;
use super::native::{GamepadAxis, GamepadButton, NativeGamepad, SensorType, SharedAudio};
use super::{map_short_to_float, negative_half, positive_half, Driver};
use crate::config::DriverSettings;
use crate::controller::gamepad_inputs::*;
use crate::controller::{
    ControllerEntity, ControllerState, ControllerType, Finger, GyroComponent, GyroState,
    InputComponent, InputId, TouchPosition, Touchpad, TouchpadComponent,
};

/// Stick axes split into (positive half, negative half). Native Y grows
/// downwards.
const STICK_AXES: [(GamepadAxis, InputId, InputId); 4] = [
    (GamepadAxis::LeftX, LEFT_STICK_AXIS_RIGHT, LEFT_STICK_AXIS_LEFT),
    (GamepadAxis::LeftY, LEFT_STICK_AXIS_DOWN, LEFT_STICK_AXIS_UP),
    (GamepadAxis::RightX, RIGHT_STICK_AXIS_RIGHT, RIGHT_STICK_AXIS_LEFT),
    (GamepadAxis::RightY, RIGHT_STICK_AXIS_DOWN, RIGHT_STICK_AXIS_UP),
];

const TRIGGER_AXES: [(GamepadAxis, InputId); 2] = [
    (GamepadAxis::LeftTrigger, LEFT_TRIGGER_AXIS),
    (GamepadAxis::RightTrigger, RIGHT_TRIGGER_AXIS),
];

const BUTTONS: [(GamepadButton, InputId); BUTTON_COUNT] = [
    (GamepadButton::South, SOUTH_BUTTON),
    (GamepadButton::East, EAST_BUTTON),
    (GamepadButton::West, WEST_BUTTON),
    (GamepadButton::North, NORTH_BUTTON),
    (GamepadButton::Back, BACK_BUTTON),
    (GamepadButton::Guide, GUIDE_BUTTON),
    (GamepadButton::Start, START_BUTTON),
    (GamepadButton::LeftStick, LEFT_STICK_BUTTON),
    (GamepadButton::RightStick, RIGHT_STICK_BUTTON),
    (GamepadButton::LeftShoulder, LEFT_SHOULDER_BUTTON),
    (GamepadButton::RightShoulder, RIGHT_SHOULDER_BUTTON),
    (GamepadButton::DpadUp, DPAD_UP_BUTTON),
    (GamepadButton::DpadDown, DPAD_DOWN_BUTTON),
    (GamepadButton::DpadLeft, DPAD_LEFT_BUTTON),
    (GamepadButton::DpadRight, DPAD_RIGHT_BUTTON),
    (GamepadButton::Misc1, MISC_1_BUTTON),
    (GamepadButton::RightPaddle1, RIGHT_PADDLE_1_BUTTON),
    (GamepadButton::LeftPaddle1, LEFT_PADDLE_1_BUTTON),
    (GamepadButton::RightPaddle2, RIGHT_PADDLE_2_BUTTON),
    (GamepadButton::LeftPaddle2, LEFT_PADDLE_2_BUTTON),
    (GamepadButton::Touchpad, TOUCHPAD_1_BUTTON),
    (GamepadButton::Misc2, MISC_2_BUTTON),
    (GamepadButton::Misc3, MISC_3_BUTTON),
    (GamepadButton::Misc4, MISC_4_BUTTON),
    (GamepadButton::Misc5, MISC_5_BUTTON),
    (GamepadButton::Misc6, MISC_6_BUTTON),
];

pub struct GamepadDriver<G: NativeGamepad> {
    common: CommonDriver<G>,
    mapping_id: Option<String>,
    has_gyro: bool,
    touchpad_count: usize,
}

impl<G: NativeGamepad> GamepadDriver<G> {
    pub fn new(
        mut device: G,
        controller_type: &ControllerType,
        audio: Option<SharedAudio>,
        settings: &DriverSettings,
    ) -> Self {
        let has_gyro = device.has_sensor(SensorType::Gyro);
        if has_gyro {
            if let Err(e) = device.set_sensor_enabled(SensorType::Gyro, true) {
                warn!("Failed to enable gyro: {}", e);
            }
        }
        let touchpad_count = device.touchpad_count();
        debug!("Gamepad gyro={}, touchpads={}", has_gyro, touchpad_count);

        Self {
            common: CommonDriver::new(device, controller_type, audio, settings),
            mapping_id: controller_type.mapping_id.clone(),
            has_gyro,
            touchpad_count,
        }
    }

    pub fn common(&self) -> &CommonDriver<G> {
        &self.common
    }

    pub fn has_gyro(&self) -> bool {
        self.has_gyro
    }

    pub fn touchpad_count(&self) -> usize {
        self.touchpad_count
    }
}

fn poll_input(device: &impl NativeGamepad) -> ControllerState {
    let mut state = ControllerState::new();

    for (axis, positive, negative) in STICK_AXES {
        let value = map_short_to_float(device.axis(axis));
        state.set_axis(positive, positive_half(value));
        state.set_axis(negative, negative_half(value));
    }
    for (axis, id) in TRIGGER_AXES {
        state.set_axis(id, map_short_to_float(device.axis(axis)));
    }
    for (button, id) in BUTTONS {
        state.set_button(id, device.button(button));
    }

    state
}

fn poll_gyro(device: &impl NativeGamepad, gyro: &mut GyroComponent) {
    let mut sample = [0.0f32; 3];
    match device.sensor_data(SensorType::Gyro, &mut sample) {
        Ok(()) => gyro.set_state(GyroState::new(sample[0], sample[1], sample[2])),
        Err(e) => error!("Failed to read gyro: {}", e),
    }
}

fn poll_touchpads(device: &impl NativeGamepad, touchpads: &mut TouchpadComponent) {
    for (index, touchpad) in touchpads.touchpads_mut().iter_mut().enumerate() {
        let mut fingers = Vec::new();
        for slot in 0..touchpad.max_fingers() {
            match device.touchpad_finger(index, slot) {
                Ok(sample) if sample.state == 1 => fingers.push(Finger {
                    id: slot,
                    position: TouchPosition {
                        x: sample.x,
                        y: sample.y,
                    },
                    pressure: sample.pressure,
                }),
                Ok(_) => {}
                Err(e) => error!("Failed to read finger {} of touchpad {}: {}", slot, index, e),
            }
        }
        touchpad.push_fingers(fingers);
    }
}

impl<G: NativeGamepad> Driver for GamepadDriver<G> {
    fn add_components(&mut self, entity: &mut ControllerEntity) -> Result<(), DriverError> {
        self.common.add_components(entity)?;
        let device = self.common.device()?;

        entity.set_component(InputComponent::new(
            BUTTON_COUNT,
            AXIS_COUNT,
            0,
            true,
            deadzone_groups(),
            self.mapping_id.clone(),
        ));
        if self.has_gyro {
            entity.set_component(GyroComponent::new());
        }
        if self.touchpad_count > 0 {
            let touchpads = (0..self.touchpad_count)
                .map(|index| Touchpad::new(device.touchpad_finger_count(index)))
                .collect();
            entity.set_component(TouchpadComponent::new(touchpads));
        }
        Ok(())
    }

    fn update(&mut self, entity: &mut ControllerEntity, _out_of_focus: bool) -> Result<(), DriverError> {
        self.common.update(entity)?;
        let device = self.common.device()?;

        if let Some(input) = entity.component_mut::<InputComponent>() {
            input.push_state(poll_input(device));
        }
        if let Some(gyro) = entity.component_mut::<GyroComponent>() {
            poll_gyro(device, gyro);
        }
        if let Some(touchpads) = entity.component_mut::<TouchpadComponent>() {
            poll_touchpads(device, touchpads);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.common.close()
    }

    fn driver_name(&self) -> &str {
        self.common.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ComponentId, ControllerInfo};
    use crate::driver::native::FingerSample;
    use crate::driver::testing::{FakeDevice, NativeCall};

    fn driver(device: &FakeDevice) -> (GamepadDriver<FakeDevice>, ControllerEntity) {
        let controller_type = ControllerType::new("xbox", "Xbox Controller").with_mapping_id("xbox");
        let mut driver = GamepadDriver::new(
            device.clone(),
            &controller_type,
            None,
            &DriverSettings::default(),
        );
        let mut entity = ControllerEntity::new(ControllerInfo::new("pad-1", controller_type));
        driver.add_components(&mut entity).unwrap();
        (driver, entity)
    }

    fn input(entity: &ControllerEntity) -> &InputComponent {
        entity.component::<InputComponent>().unwrap()
    }

    #[test]
    fn plain_gamepad_components() {
        let device = FakeDevice::new("Pad");
        let (driver, entity) = driver(&device);

        assert_eq!(driver.driver_name(), "Pad");
        assert!(!entity.has_component(ComponentId::Gyro));
        assert!(!entity.has_component(ComponentId::Touchpad));

        let input = input(&entity);
        assert_eq!(input.button_count(), 26);
        assert_eq!(input.axis_count(), 10);
        assert_eq!(input.hat_count(), 0);
        assert!(input.is_definitely_gamepad());
        assert_eq!(input.deadzone_groups().len(), 4);
        assert_eq!(input.mapping_id(), Some("xbox"));
    }

    #[test]
    fn gyro_is_enabled_at_construction() {
        let device = FakeDevice::new("Pad");
        device.state_mut().gyro = Some([0.1, 0.2, 0.3]);
        let (mut driver, mut entity) = driver(&device);

        assert_eq!(
            device.calls(),
            vec![NativeCall::SetSensorEnabled(SensorType::Gyro, true)]
        );

        driver.update(&mut entity, false).unwrap();
        assert_eq!(
            entity.component::<GyroComponent>().unwrap().state(),
            GyroState::new(0.1, 0.2, 0.3)
        );
    }

    #[test]
    fn failed_gyro_read_keeps_last_sample() {
        let device = FakeDevice::new("Pad");
        device.state_mut().gyro = Some([1.0, 2.0, 3.0]);
        let (mut driver, mut entity) = driver(&device);
        driver.update(&mut entity, false).unwrap();

        device.state_mut().fail_gyro_read = true;
        device.state_mut().gamepad_buttons.insert(GamepadButton::South);
        driver.update(&mut entity, false).unwrap();

        assert_eq!(
            entity.component::<GyroComponent>().unwrap().state(),
            GyroState::new(1.0, 2.0, 3.0)
        );
        assert!(input(&entity).state_now().button(&SOUTH_BUTTON));
    }

    #[test]
    fn sticks_split_into_halves() {
        let device = FakeDevice::new("Pad");
        {
            let mut state = device.state_mut();
            state.gamepad_axes.insert(GamepadAxis::LeftX, i16::MAX);
            state.gamepad_axes.insert(GamepadAxis::LeftY, i16::MIN);
            state.gamepad_axes.insert(GamepadAxis::RightX, -16384);
            state.gamepad_axes.insert(GamepadAxis::RightTrigger, i16::MAX);
        }
        let (mut driver, mut entity) = driver(&device);
        driver.update(&mut entity, false).unwrap();

        let state = input(&entity).state_now();
        assert_eq!(state.axis(&LEFT_STICK_AXIS_RIGHT), 1.0);
        assert_eq!(state.axis(&LEFT_STICK_AXIS_LEFT), 0.0);
        assert_eq!(state.axis(&LEFT_STICK_AXIS_UP), 1.0);
        assert_eq!(state.axis(&LEFT_STICK_AXIS_DOWN), 0.0);
        assert_eq!(state.axis(&RIGHT_STICK_AXIS_LEFT), 0.5);
        assert_eq!(state.axis(&RIGHT_STICK_AXIS_RIGHT), 0.0);
        assert_eq!(state.axis(&RIGHT_TRIGGER_AXIS), 1.0);
        assert_eq!(state.axis(&LEFT_TRIGGER_AXIS), 0.0);
    }

    #[test]
    fn buttons_and_edges() {
        let device = FakeDevice::new("Pad");
        let (mut driver, mut entity) = driver(&device);

        device.state_mut().gamepad_buttons.insert(GamepadButton::DpadLeft);
        driver.update(&mut entity, false).unwrap();
        assert!(input(&entity).just_pressed(&DPAD_LEFT_BUTTON));

        driver.update(&mut entity, false).unwrap();
        assert!(input(&entity).state_now().button(&DPAD_LEFT_BUTTON));
        assert!(!input(&entity).just_pressed(&DPAD_LEFT_BUTTON));

        device.state_mut().gamepad_buttons.clear();
        driver.update(&mut entity, false).unwrap();
        assert!(input(&entity).just_released(&DPAD_LEFT_BUTTON));
    }

    #[test]
    fn snapshot_is_replaced_each_tick() {
        let device = FakeDevice::new("Pad");
        device.state_mut().gamepad_axes.insert(GamepadAxis::LeftX, i16::MAX);
        let (mut driver, mut entity) = driver(&device);
        driver.update(&mut entity, false).unwrap();

        device.state_mut().gamepad_axes.insert(GamepadAxis::LeftX, i16::MIN);
        driver.update(&mut entity, false).unwrap();

        let input = input(&entity);
        assert_eq!(input.state_now().axis(&LEFT_STICK_AXIS_RIGHT), 0.0);
        assert_eq!(input.state_now().axis(&LEFT_STICK_AXIS_LEFT), 1.0);
        assert_eq!(input.state_then().axis(&LEFT_STICK_AXIS_RIGHT), 1.0);
    }

    #[test]
    fn only_active_fingers_are_reported() {
        let device = FakeDevice::new("Pad");
        device.state_mut().touchpads = vec![vec![
            FingerSample {
                state: 1,
                x: 0.25,
                y: 0.75,
                pressure: 1.0,
            },
            FingerSample::default(),
        ]];
        let (mut driver, mut entity) = driver(&device);
        driver.update(&mut entity, false).unwrap();

        let touchpad = &entity.component::<TouchpadComponent>().unwrap().touchpads()[0];
        assert_eq!(touchpad.max_fingers(), 2);
        assert_eq!(touchpad.fingers().len(), 1);
        assert_eq!(touchpad.fingers()[0].id, 0);
        assert_eq!(touchpad.fingers()[0].position, TouchPosition { x: 0.25, y: 0.75 });
    }

    #[test]
    fn failing_finger_is_skipped() {
        let device = FakeDevice::new("Pad");
        {
            let mut state = device.state_mut();
            state.touchpads = vec![vec![
                FingerSample {
                    state: 1,
                    ..FingerSample::default()
                };
                2
            ]];
            state.failing_fingers.insert((0, 0));
        }
        let (mut driver, mut entity) = driver(&device);
        driver.update(&mut entity, false).unwrap();

        let touchpad = &entity.component::<TouchpadComponent>().unwrap().touchpads()[0];
        assert_eq!(touchpad.fingers().len(), 1);
        assert_eq!(touchpad.fingers()[0].id, 1);
    }

    #[test]
    fn update_after_close_is_illegal() {
        let device = FakeDevice::new("Pad");
        let (mut driver, mut entity) = driver(&device);

        driver.close().unwrap();
        assert!(driver.update(&mut entity, false).unwrap_err().is_illegal_state());
        assert!(driver.close().unwrap_err().is_illegal_state());
    }
}
