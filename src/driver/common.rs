//! Lifecycle and device-generic behavior shared by every driver
//!
//! ```text
//!   new ──► Open ──close()──► Closed
//!            │ ▲
//!            └─┘ update()
//! ```
//!
//! Capabilities are probed once in [`CommonDriver::new`] and never again.
//! Every tick runs the same phases in order: body rumble, trigger rumble,
//! battery, DualSense effects report, haptic stream pool.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, error, info, warn};

use super::dualsense::Ds5EffectsState;
use super::error::DriverError;
use super::haptic::{HapticOutput, SharedHapticOutput};
use super::native::{power_state, DeviceProperties, NativeController, PowerInfo, SharedAudio};
use crate::config::DriverSettings;
use crate::controller::{
    BatteryLevelComponent, BluetoothDeviceComponent, ControllerEntity, ControllerType,
    DualSenseComponent, HapticBuffer, HdHapticComponent, PowerState, RumbleComponent,
    TriggerRumbleComponent,
};

/// Converts a `[0, 1]` strength into the native 16-bit motor magnitude
pub fn strength_to_native(strength: f32) -> u16 {
    (strength.clamp(0.0, 1.0) * f32::from(u16::MAX)) as u16
}

/// Maps a raw power query onto [`PowerState`]
///
/// Unknown codes are an illegal state: the native enumeration is closed.
pub fn power_state_from_native(info: PowerInfo) -> Result<PowerState, DriverError> {
    let percent = info.percent.clamp(0, 100) as u8;
    match info.state {
        power_state::ERROR | power_state::UNKNOWN => Ok(PowerState::Unknown),
        power_state::ON_BATTERY => Ok(PowerState::Depleting(percent)),
        power_state::NO_BATTERY => Ok(PowerState::WiredOnly),
        power_state::CHARGING => Ok(PowerState::Charging(percent)),
        power_state::CHARGED => Ok(PowerState::Full),
        other => Err(DriverError::illegal_state(format!(
            "Unknown native power state {other}"
        ))),
    }
}

/// Builds the effects report for the current DualSense component values
pub fn effects_report(component: &DualSenseComponent) -> Ds5EffectsState {
    let mut report = Ds5EffectsState::new();
    report.set_left_trigger_effect(component.left_trigger_effect());
    report.set_right_trigger_effect(component.right_trigger_effect());
    report.set_mute_light(component.mute_light());
    report
}

fn play_on(output: &Weak<RefCell<HapticOutput>>, buffer: &HapticBuffer) -> Result<(), DriverError> {
    // The driver dropped its output on close; playing is a no-op from then on
    let Some(output) = output.upgrade() else {
        return Ok(());
    };
    let mut output = output
        .try_borrow_mut()
        .map_err(|e| DriverError::illegal_state(format!("haptic output busy: {e}")))?;
    output.play(buffer)
}

fn close_output(output: &SharedHapticOutput) -> Result<(), DriverError> {
    let mut output = output
        .try_borrow_mut()
        .map_err(|e| DriverError::illegal_state(format!("haptic output busy: {e}")))?;
    output.close()
}

pub struct CommonDriver<D: NativeController> {
    /// `None` once closed
    device: Option<D>,
    name: String,
    guid: String,
    serial: Option<String>,
    properties: DeviceProperties,
    is_dualsense: bool,
    haptics: Option<SharedHapticOutput>,
    rumble_duration_ms: u32,
    trigger_rumble_duration_ms: u32,
    components_added: bool,
}

impl<D: NativeController> CommonDriver<D> {
    pub fn new(
        device: D,
        controller_type: &ControllerType,
        audio: Option<SharedAudio>,
        settings: &DriverSettings,
    ) -> Self {
        let properties = device.properties();
        let name = device
            .name()
            .unwrap_or_else(|| controller_type.friendly_name.clone());
        let guid = device.guid();
        let serial = device.serial();
        let is_dualsense = controller_type.is_dualsense();

        let haptics = if is_dualsense && settings.hd_haptics {
            audio
                .and_then(|audio| HapticOutput::open(audio, settings))
                .map(|output| Rc::new(RefCell::new(output)))
        } else {
            None
        };

        info!(
            "Opened controller '{}' (guid {}): rumble={}, trigger_rumble={}, dualsense={}, hd_haptics={}",
            name,
            guid,
            properties.rumble,
            properties.trigger_rumble,
            is_dualsense,
            haptics.is_some()
        );

        Self {
            device: Some(device),
            name,
            guid,
            serial,
            properties,
            is_dualsense,
            haptics,
            rumble_duration_ms: settings.rumble_duration_ms,
            trigger_rumble_duration_ms: settings.trigger_rumble_duration_ms,
            components_added: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    pub fn properties(&self) -> DeviceProperties {
        self.properties
    }

    pub fn is_dualsense(&self) -> bool {
        self.is_dualsense
    }

    /// Best-effort guess: a DualSense without its audio interface is almost
    /// always a wireless connection
    pub fn is_bluetooth(&self) -> bool {
        self.is_dualsense && self.haptics.is_none()
    }

    pub fn has_hd_haptics(&self) -> bool {
        self.haptics.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    fn closed_error(&self) -> DriverError {
        DriverError::illegal_state(format!("Driver for '{}' is closed", self.name))
    }

    pub fn device(&self) -> Result<&D, DriverError> {
        self.device.as_ref().ok_or_else(|| self.closed_error())
    }

    pub fn device_mut(&mut self) -> Result<&mut D, DriverError> {
        match self.device.as_mut() {
            Some(device) => Ok(device),
            None => Err(DriverError::illegal_state(format!(
                "Driver for '{}' is closed",
                self.name
            ))),
        }
    }

    /// Attaches the device-generic components. Valid once, while open.
    pub fn add_components(&mut self, entity: &mut ControllerEntity) -> Result<(), DriverError> {
        self.device()?;
        if self.components_added {
            return Err(DriverError::illegal_state(format!(
                "Components for '{}' were already added",
                self.name
            )));
        }
        self.components_added = true;

        entity.set_component(BatteryLevelComponent::new());
        if self.properties.rumble {
            entity.set_component(RumbleComponent::new());
        }
        if self.properties.trigger_rumble {
            entity.set_component(TriggerRumbleComponent::new());
        }
        if self.is_dualsense {
            entity.set_component(DualSenseComponent::new());
        }
        if let Some(haptics) = &self.haptics {
            let output = Rc::downgrade(haptics);
            let mut component = HdHapticComponent::new();
            component.accept_play_haptic(Box::new(move |buffer| play_on(&output, buffer)));
            entity.set_component(component);
        }
        if self.is_bluetooth() {
            entity.set_component(BluetoothDeviceComponent);
        }

        debug!(
            "Attached components to {}: {:?}",
            entity.uid(),
            entity.component_ids()
        );
        Ok(())
    }

    pub fn update(&mut self, entity: &mut ControllerEntity) -> Result<(), DriverError> {
        self.device()?;

        self.update_rumble(entity);
        self.update_trigger_rumble(entity);
        self.update_battery(entity)?;
        self.update_dualsense(entity);
        self.update_haptics()
    }

    fn update_rumble(&mut self, entity: &mut ControllerEntity) {
        if !self.properties.rumble {
            return;
        }
        let Some(request) = entity
            .component_mut::<RumbleComponent>()
            .and_then(|rumble| rumble.consume_rumble())
        else {
            return;
        };
        let Some(device) = self.device.as_mut() else {
            return;
        };

        debug!("Rumble {}: {:?}", self.name, request);
        if let Err(e) = device.rumble(
            strength_to_native(request.strong),
            strength_to_native(request.weak),
            self.rumble_duration_ms,
        ) {
            error!("Failed to rumble '{}': {}", self.name, e);
        }
    }

    fn update_trigger_rumble(&mut self, entity: &mut ControllerEntity) {
        if !self.properties.trigger_rumble {
            return;
        }
        let Some(request) = entity
            .component_mut::<TriggerRumbleComponent>()
            .and_then(|rumble| rumble.consume_trigger_rumble())
        else {
            return;
        };
        let Some(device) = self.device.as_mut() else {
            return;
        };

        debug!("Trigger rumble {}: {:?}", self.name, request);
        if let Err(e) = device.rumble_triggers(
            strength_to_native(request.left),
            strength_to_native(request.right),
            self.trigger_rumble_duration_ms,
        ) {
            error!("Failed to rumble triggers of '{}': {}", self.name, e);
        }
    }

    fn update_battery(&mut self, entity: &mut ControllerEntity) -> Result<(), DriverError> {
        let level = power_state_from_native(self.device()?.power_info())?;
        if let Some(battery) = entity.component_mut::<BatteryLevelComponent>() {
            battery.set_battery_level(level);
        }
        Ok(())
    }

    fn update_dualsense(&mut self, entity: &mut ControllerEntity) {
        if !self.is_dualsense {
            return;
        }
        let Some(dualsense) = entity.component_mut::<DualSenseComponent>() else {
            return;
        };
        if !dualsense.consume_dirty() {
            return;
        }

        let report = effects_report(dualsense);
        let Some(device) = self.device.as_mut() else {
            return;
        };
        if let Err(e) = device.send_effect(report.as_bytes()) {
            error!("Failed to send effects report to '{}': {}", self.name, e);
        }
    }

    fn update_haptics(&mut self) -> Result<(), DriverError> {
        let Some(haptics) = &self.haptics else {
            return Ok(());
        };
        haptics
            .try_borrow_mut()
            .map_err(|e| DriverError::illegal_state(format!("haptic output busy: {e}")))?
            .tick()
    }

    /// Releases the device, then the haptic audio device and its streams
    pub fn close(&mut self) -> Result<(), DriverError> {
        let Some(mut device) = self.device.take() else {
            return Err(DriverError::illegal_state(format!(
                "Driver for '{}' closed twice",
                self.name
            )));
        };

        let closed = device.close();
        let released = match self.haptics.take() {
            Some(haptics) => close_output(&haptics),
            None => Ok(()),
        };

        info!("Closed controller '{}'", self.name);
        closed?;
        released
    }
}

impl<D: NativeController> Drop for CommonDriver<D> {
    fn drop(&mut self) {
        if self.device.is_some() {
            warn!("Driver for '{}' dropped while open, closing it", self.name);
            if let Err(e) = self.close() {
                error!("Failed to close '{}' on drop: {}", self.name, e);
            }
        }
    }
}
