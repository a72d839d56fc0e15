//! Scripted native devices for driver tests
//!
//! Fakes share their state through `Rc<RefCell<..>>`, so a test keeps one
//! clone to script inputs and inspect recorded calls while the driver owns
//! another.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::error::NativeError;
use super::native::{
    AudioDeviceId, AudioFormat, AudioSpec, AudioStreamId, AudioSubsystem, DeviceProperties,
    FingerSample, GamepadAxis, GamepadButton, NativeController, NativeGamepad, NativeJoystick,
    PowerInfo, SensorType, SharedAudio,
};

#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    Close,
    Rumble {
        low: u16,
        high: u16,
        duration_ms: u32,
    },
    RumbleTriggers {
        left: u16,
        right: u16,
        duration_ms: u32,
    },
    SendEffect(Vec<u8>),
    SetSensorEnabled(SensorType, bool),
}

#[derive(Debug, Default)]
pub struct FakeDeviceState {
    pub name: Option<String>,
    pub guid: String,
    pub serial: Option<String>,
    pub properties: DeviceProperties,
    pub power: PowerInfo,

    pub fail_rumble: bool,
    pub fail_effects: bool,
    pub fail_gyro_read: bool,

    pub gyro: Option<[f32; 3]>,
    pub gamepad_axes: HashMap<GamepadAxis, i16>,
    pub gamepad_buttons: HashSet<GamepadButton>,
    /// Finger slots per touchpad
    pub touchpads: Vec<Vec<FingerSample>>,
    pub failing_fingers: HashSet<(usize, usize)>,

    pub joystick_axes: Vec<i16>,
    pub joystick_buttons: Vec<bool>,
    pub joystick_hats: Vec<u8>,

    pub calls: Vec<NativeCall>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeDevice(Rc<RefCell<FakeDeviceState>>);

impl FakeDevice {
    pub fn new(name: &str) -> Self {
        let device = Self::default();
        {
            let mut state = device.state_mut();
            state.name = Some(name.to_string());
            state.guid = format!("guid-{}", name.to_lowercase().replace(' ', "-"));
        }
        device
    }

    pub fn with_rumble(self) -> Self {
        self.state_mut().properties.rumble = true;
        self
    }

    pub fn with_trigger_rumble(self) -> Self {
        self.state_mut().properties.trigger_rumble = true;
        self
    }

    pub fn state(&self) -> Ref<'_, FakeDeviceState> {
        self.0.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, FakeDeviceState> {
        self.0.borrow_mut()
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.state().calls.clone()
    }

    fn record(&self, call: NativeCall) {
        self.state_mut().calls.push(call);
    }
}

impl NativeController for FakeDevice {
    fn properties(&self) -> DeviceProperties {
        self.state().properties
    }

    fn name(&self) -> Option<String> {
        self.state().name.clone()
    }

    fn guid(&self) -> String {
        self.state().guid.clone()
    }

    fn serial(&self) -> Option<String> {
        self.state().serial.clone()
    }

    fn close(&mut self) -> Result<(), NativeError> {
        self.record(NativeCall::Close);
        Ok(())
    }

    fn rumble(&mut self, low: u16, high: u16, duration_ms: u32) -> Result<(), NativeError> {
        self.record(NativeCall::Rumble {
            low,
            high,
            duration_ms,
        });
        if self.state().fail_rumble {
            return Err(NativeError::new("rumble", "device unplugged"));
        }
        Ok(())
    }

    fn rumble_triggers(&mut self, left: u16, right: u16, duration_ms: u32) -> Result<(), NativeError> {
        self.record(NativeCall::RumbleTriggers {
            left,
            right,
            duration_ms,
        });
        if self.state().fail_rumble {
            return Err(NativeError::new("rumble_triggers", "device unplugged"));
        }
        Ok(())
    }

    fn power_info(&self) -> PowerInfo {
        self.state().power
    }

    fn send_effect(&mut self, data: &[u8]) -> Result<(), NativeError> {
        self.record(NativeCall::SendEffect(data.to_vec()));
        if self.state().fail_effects {
            return Err(NativeError::new("send_effect", "write failed"));
        }
        Ok(())
    }
}

impl NativeGamepad for FakeDevice {
    fn has_sensor(&self, sensor: SensorType) -> bool {
        sensor == SensorType::Gyro && self.state().gyro.is_some()
    }

    fn set_sensor_enabled(&mut self, sensor: SensorType, enabled: bool) -> Result<(), NativeError> {
        self.record(NativeCall::SetSensorEnabled(sensor, enabled));
        Ok(())
    }

    fn sensor_data(&self, sensor: SensorType, out: &mut [f32]) -> Result<(), NativeError> {
        let state = self.state();
        if state.fail_gyro_read {
            return Err(NativeError::new("sensor_data", "no sample"));
        }
        match (sensor, state.gyro) {
            (SensorType::Gyro, Some(sample)) => {
                out[..3].copy_from_slice(&sample);
                Ok(())
            }
            _ => Err(NativeError::unsupported("sensor_data")),
        }
    }

    fn touchpad_count(&self) -> usize {
        self.state().touchpads.len()
    }

    fn touchpad_finger_count(&self, touchpad: usize) -> usize {
        self.state().touchpads.get(touchpad).map_or(0, Vec::len)
    }

    fn touchpad_finger(&self, touchpad: usize, finger: usize) -> Result<FingerSample, NativeError> {
        let state = self.state();
        if state.failing_fingers.contains(&(touchpad, finger)) {
            return Err(NativeError::new("touchpad_finger", "read failed"));
        }
        state
            .touchpads
            .get(touchpad)
            .and_then(|fingers| fingers.get(finger))
            .copied()
            .ok_or_else(|| NativeError::new("touchpad_finger", "no such finger"))
    }

    fn axis(&self, axis: GamepadAxis) -> i16 {
        self.state().gamepad_axes.get(&axis).copied().unwrap_or(0)
    }

    fn button(&self, button: GamepadButton) -> bool {
        self.state().gamepad_buttons.contains(&button)
    }
}

impl NativeJoystick for FakeDevice {
    fn axis_count(&self) -> usize {
        self.state().joystick_axes.len()
    }

    fn button_count(&self) -> usize {
        self.state().joystick_buttons.len()
    }

    fn hat_count(&self) -> usize {
        self.state().joystick_hats.len()
    }

    fn axis(&self, index: usize) -> i16 {
        self.state().joystick_axes.get(index).copied().unwrap_or(0)
    }

    fn button(&self, index: usize) -> bool {
        self.state().joystick_buttons.get(index).copied().unwrap_or(false)
    }

    fn hat(&self, index: usize) -> u8 {
        self.state().joystick_hats.get(index).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct FakeAudioState {
    pub devices: Vec<(AudioDeviceId, String, AudioSpec)>,
    pub opened: Vec<AudioDeviceId>,
    pub closed_devices: Vec<AudioDeviceId>,
    pub created: Vec<(AudioStreamId, AudioSpec)>,
    pub destroyed: Vec<AudioStreamId>,
    pub live_streams: Vec<AudioStreamId>,
    pub bound: Vec<(AudioDeviceId, AudioStreamId)>,
    pub queued: Vec<(AudioStreamId, usize)>,
    next_stream: u32,
}

#[derive(Debug, Clone, Default)]
pub struct FakeAudio(Rc<RefCell<FakeAudioState>>);

impl FakeAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// A speaker plus the 4-channel DualSense audio interface
    pub fn with_dualsense() -> Self {
        let audio = Self::new();
        audio.add_device("Speakers", 2);
        audio.add_device("DualSense Wireless Controller", 4);
        audio
    }

    pub fn add_device(&self, name: &str, channels: u16) -> AudioDeviceId {
        let mut state = self.0.borrow_mut();
        let id = AudioDeviceId(state.devices.len() as u32 + 1);
        let spec = AudioSpec {
            format: AudioFormat::F32Le,
            channels,
            freq: 48_000,
        };
        state.devices.push((id, name.to_string(), spec));
        id
    }

    pub fn shared(&self) -> SharedAudio {
        Rc::new(RefCell::new(self.clone()))
    }

    pub fn state(&self) -> Ref<'_, FakeAudioState> {
        self.0.borrow()
    }
}

impl AudioSubsystem for FakeAudio {
    fn playback_devices(&self) -> Vec<AudioDeviceId> {
        self.state().devices.iter().map(|(id, _, _)| *id).collect()
    }

    fn device_name(&self, device: AudioDeviceId) -> Option<String> {
        self.state()
            .devices
            .iter()
            .find(|(id, _, _)| *id == device)
            .map(|(_, name, _)| name.clone())
    }

    fn device_format(&self, device: AudioDeviceId) -> Result<AudioSpec, NativeError> {
        self.state()
            .devices
            .iter()
            .find(|(id, _, _)| *id == device)
            .map(|(_, _, spec)| *spec)
            .ok_or_else(|| NativeError::new("device_format", "no such device"))
    }

    fn open_device(&mut self, device: AudioDeviceId, _spec: &AudioSpec) -> Result<AudioDeviceId, NativeError> {
        let logical = AudioDeviceId(device.0 + 100);
        self.0.borrow_mut().opened.push(logical);
        Ok(logical)
    }

    fn close_device(&mut self, device: AudioDeviceId) {
        self.0.borrow_mut().closed_devices.push(device);
    }

    fn create_stream(&mut self, src: &AudioSpec, _dst: &AudioSpec) -> Result<AudioStreamId, NativeError> {
        let mut state = self.0.borrow_mut();
        state.next_stream += 1;
        let stream = AudioStreamId(state.next_stream);
        state.created.push((stream, *src));
        state.live_streams.push(stream);
        Ok(stream)
    }

    fn destroy_stream(&mut self, stream: AudioStreamId) {
        let mut state = self.0.borrow_mut();
        state.destroyed.push(stream);
        state.live_streams.retain(|live| *live != stream);
    }

    fn bind_stream(&mut self, device: AudioDeviceId, stream: AudioStreamId) -> Result<(), NativeError> {
        self.0.borrow_mut().bound.push((device, stream));
        Ok(())
    }

    fn put_stream_data(&mut self, stream: AudioStreamId, data: &[u8]) -> Result<(), NativeError> {
        self.0.borrow_mut().queued.push((stream, data.len()));
        Ok(())
    }
}
