//! Gyro and touchpad state holders

use super::entity::{Component, ComponentId};

/// Angular velocity sample in device units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GyroState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl GyroState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GyroComponent {
    state: GyroState,
}

impl Component for GyroComponent {
    const ID: ComponentId = ComponentId::Gyro;
}

impl GyroComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GyroState {
        self.state
    }

    pub fn set_state(&mut self, state: GyroState) {
        self.state = state;
    }
}

/// Normalized touch position, both coordinates in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchPosition {
    pub x: f32,
    pub y: f32,
}

/// One active contact on a touchpad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Finger {
    /// Native finger slot
    pub id: usize,
    pub position: TouchPosition,
    pub pressure: f32,
}

#[derive(Debug, Clone)]
pub struct Touchpad {
    max_fingers: usize,
    fingers: Vec<Finger>,
    prev_fingers: Vec<Finger>,
}

impl Touchpad {
    pub fn new(max_fingers: usize) -> Self {
        Self {
            max_fingers,
            fingers: Vec::new(),
            prev_fingers: Vec::new(),
        }
    }

    pub fn max_fingers(&self) -> usize {
        self.max_fingers
    }

    /// Fingers that were active at the last tick
    pub fn fingers(&self) -> &[Finger] {
        &self.fingers
    }

    pub fn prev_fingers(&self) -> &[Finger] {
        &self.prev_fingers
    }

    /// Replaces the active contacts; fingers not listed are gone
    pub fn push_fingers(&mut self, fingers: Vec<Finger>) {
        self.prev_fingers = std::mem::replace(&mut self.fingers, fingers);
    }
}

#[derive(Debug, Clone)]
pub struct TouchpadComponent {
    touchpads: Vec<Touchpad>,
}

impl Component for TouchpadComponent {
    const ID: ComponentId = ComponentId::Touchpad;
}

impl TouchpadComponent {
    pub fn new(touchpads: Vec<Touchpad>) -> Self {
        Self { touchpads }
    }

    pub fn touchpads(&self) -> &[Touchpad] {
        &self.touchpads
    }

    pub fn touchpads_mut(&mut self) -> &mut [Touchpad] {
        &mut self.touchpads
    }
}
