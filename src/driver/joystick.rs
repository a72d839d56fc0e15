//! Driver for raw joysticks without a gamepad mapping

use tracing::debug;

use super::common::CommonDriver;
use super::error::DriverError;
use super::native::{hat, NativeJoystick, SharedAudio};
use super::{map_short_to_float, negative_half, positive_half, Driver};
use crate::config::DriverSettings;
use crate::controller::joystick_inputs;
use crate::controller::{ControllerEntity, ControllerState, ControllerType, HatState, InputComponent};

/// Maps a raw hat code; anything outside the nine positions is an illegal
/// state
pub fn hat_state(raw: u8) -> Result<HatState, DriverError> {
    match raw {
        hat::CENTERED => Ok(HatState::Centered),
        hat::UP => Ok(HatState::Up),
        hat::RIGHT => Ok(HatState::Right),
        hat::DOWN => Ok(HatState::Down),
        hat::LEFT => Ok(HatState::Left),
        hat::RIGHT_UP => Ok(HatState::RightUp),
        hat::RIGHT_DOWN => Ok(HatState::RightDown),
        hat::LEFT_UP => Ok(HatState::LeftUp),
        hat::LEFT_DOWN => Ok(HatState::LeftDown),
        other => Err(DriverError::illegal_state(format!(
            "Unknown native hat value {other:#04x}"
        ))),
    }
}

pub struct JoystickDriver<J: NativeJoystick> {
    common: CommonDriver<J>,
    mapping_id: Option<String>,
    axis_count: usize,
    button_count: usize,
    hat_count: usize,
}

impl<J: NativeJoystick> JoystickDriver<J> {
    pub fn new(
        device: J,
        controller_type: &ControllerType,
        audio: Option<SharedAudio>,
        settings: &DriverSettings,
    ) -> Self {
        let axis_count = device.axis_count();
        let button_count = device.button_count();
        let hat_count = device.hat_count();
        debug!(
            "Joystick axes={}, buttons={}, hats={}",
            axis_count, button_count, hat_count
        );

        Self {
            common: CommonDriver::new(device, controller_type, audio, settings),
            mapping_id: controller_type.mapping_id.clone(),
            axis_count,
            button_count,
            hat_count,
        }
    }

    pub fn common(&self) -> &CommonDriver<J> {
        &self.common
    }

    fn poll_input(&self, device: &J) -> Result<ControllerState, DriverError> {
        let mut state = ControllerState::new();

        for index in 0..self.axis_count {
            let value = map_short_to_float(device.axis(index));
            state.set_axis(joystick_inputs::axis(index, true), positive_half(value));
            state.set_axis(joystick_inputs::axis(index, false), negative_half(value));
        }
        for index in 0..self.button_count {
            state.set_button(joystick_inputs::button(index), device.button(index));
        }
        for index in 0..self.hat_count {
            state.set_hat(joystick_inputs::hat(index), hat_state(device.hat(index))?);
        }

        Ok(state)
    }
}

impl<J: NativeJoystick> Driver for JoystickDriver<J> {
    fn add_components(&mut self, entity: &mut ControllerEntity) -> Result<(), DriverError> {
        self.common.add_components(entity)?;

        entity.set_component(InputComponent::new(
            self.button_count,
            self.axis_count * 2,
            self.hat_count,
            false,
            Vec::new(),
            self.mapping_id.clone(),
        ));
        Ok(())
    }

    fn update(&mut self, entity: &mut ControllerEntity, _out_of_focus: bool) -> Result<(), DriverError> {
        self.common.update(entity)?;
        let state = self.poll_input(self.common.device()?)?;

        if let Some(input) = entity.component_mut::<InputComponent>() {
            input.push_state(state);
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
    use crate::controller::ControllerInfo;
    use crate::driver::testing::FakeDevice;

    fn joystick() -> FakeDevice {
        let device = FakeDevice::new("Flight Stick");
        {
            let mut state = device.state_mut();
            state.joystick_axes = vec![0, 0];
            state.joystick_buttons = vec![false; 3];
            state.joystick_hats = vec![hat::CENTERED];
        }
        device
    }

    fn driver(device: &FakeDevice) -> (JoystickDriver<FakeDevice>, ControllerEntity) {
        let mut driver = JoystickDriver::new(
            device.clone(),
            &ControllerType::unknown(),
            None,
            &DriverSettings::default(),
        );
        let mut entity =
            ControllerEntity::new(ControllerInfo::new("stick-0", ControllerType::unknown()));
        driver.add_components(&mut entity).unwrap();
        (driver, entity)
    }

    #[test]
    fn all_hat_codes() {
        let codes = [
            (0x00, HatState::Centered),
            (0x01, HatState::Up),
            (0x02, HatState::Right),
            (0x04, HatState::Down),
            (0x08, HatState::Left),
            (0x03, HatState::RightUp),
            (0x06, HatState::RightDown),
            (0x09, HatState::LeftUp),
            (0x0C, HatState::LeftDown),
        ];
        for (raw, expected) in codes {
            assert_eq!(hat_state(raw).unwrap(), expected);
        }
        assert!(hat_state(0x05).unwrap_err().is_illegal_state());
        assert!(hat_state(0x10).unwrap_err().is_illegal_state());
    }

    #[test]
    fn input_component_is_sized_from_device() {
        let device = joystick();
        let (_driver, entity) = driver(&device);

        let input = entity.component::<InputComponent>().unwrap();
        assert_eq!(input.axis_count(), 4);
        assert_eq!(input.button_count(), 3);
        assert_eq!(input.hat_count(), 1);
        assert!(!input.is_definitely_gamepad());
        assert!(input.deadzone_groups().is_empty());
    }

    #[test]
    fn polls_axes_buttons_and_hats() {
        let device = joystick();
        let (mut driver, mut entity) = driver(&device);
        {
            let mut state = device.state_mut();
            state.joystick_axes = vec![i16::MIN, 16384];
            state.joystick_buttons[2] = true;
            state.joystick_hats[0] = hat::LEFT_UP;
        }
        driver.update(&mut entity, false).unwrap();

        let state = entity.component::<InputComponent>().unwrap().state_now();
        assert_eq!(state.axis(&joystick_inputs::axis(0, false)), 1.0);
        assert_eq!(state.axis(&joystick_inputs::axis(0, true)), 0.0);
        assert!((state.axis(&joystick_inputs::axis(1, true)) - 0.5).abs() < 1e-4);
        assert!(state.button(&joystick_inputs::button(2)));
        assert!(!state.button(&joystick_inputs::button(0)));
        assert_eq!(state.hat(&joystick_inputs::hat(0)), HatState::LeftUp);
    }

    #[test]
    fn bad_hat_value_leaves_snapshot_untouched() {
        let device = joystick();
        let (mut driver, mut entity) = driver(&device);
        device.state_mut().joystick_buttons[0] = true;
        driver.update(&mut entity, false).unwrap();

        device.state_mut().joystick_hats[0] = 0xFF;
        device.state_mut().joystick_buttons[0] = false;
        assert!(driver.update(&mut entity, false).unwrap_err().is_illegal_state());

        let input = entity.component::<InputComponent>().unwrap();
        assert!(input.state_now().button(&joystick_inputs::button(0)));
    }

    #[test]
    fn closed_joystick_rejects_update() {
        let device = joystick();
        let (mut driver, mut entity) = driver(&device);
        driver.close().unwrap();
        assert!(driver.update(&mut entity, false).unwrap_err().is_illegal_state());
    }
}
