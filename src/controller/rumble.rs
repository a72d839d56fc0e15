//! Pending rumble requests
//!
//! Producers queue a request; the driver takes it during its next tick. A
//! request is consumed at most once and a newer request replaces an older one
//! that was never sent.

use super::entity::{Component, ComponentId};

/// Strength of the two body motors, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RumbleState {
    pub strong: f32,
    pub weak: f32,
}

impl RumbleState {
    pub const OFF: RumbleState = RumbleState {
        strong: 0.0,
        weak: 0.0,
    };

    pub fn new(strong: f32, weak: f32) -> Self {
        Self { strong, weak }
    }
}

/// Strength of the left and right trigger motors, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriggerRumbleState {
    pub left: f32,
    pub right: f32,
}

impl TriggerRumbleState {
    pub const OFF: TriggerRumbleState = TriggerRumbleState {
        left: 0.0,
        right: 0.0,
    };

    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RumbleComponent {
    pending: Option<RumbleState>,
}

impl Component for RumbleComponent {
    const ID: ComponentId = ComponentId::Rumble;
}

impl RumbleComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_rumble(&mut self, state: RumbleState) {
        self.pending = Some(state);
    }

    pub fn consume_rumble(&mut self) -> Option<RumbleState> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TriggerRumbleComponent {
    pending: Option<TriggerRumbleState>,
}

impl Component for TriggerRumbleComponent {
    const ID: ComponentId = ComponentId::TriggerRumble;
}

impl TriggerRumbleComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_trigger_rumble(&mut self, state: TriggerRumbleState) {
        self.pending = Some(state);
    }

    pub fn consume_trigger_rumble(&mut self) -> Option<TriggerRumbleState> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
