use super::entity::{Component, ComponentId};
use crate::driver::dualsense::trigger_effects::{self, TriggerEffect};

/// Requested adaptive trigger effects and mute light of a DualSense
///
/// Every change marks the component dirty. The driver checks
/// [`DualSenseComponent::consume_dirty`] once per tick and only sends an
/// effects report when something changed since the last send.
#[derive(Debug, Clone)]
pub struct DualSenseComponent {
    mute_light: bool,
    left_trigger_effect: TriggerEffect,
    right_trigger_effect: TriggerEffect,
    dirty: bool,
}

impl Component for DualSenseComponent {
    const ID: ComponentId = ComponentId::DualSense;
}

impl Default for DualSenseComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl DualSenseComponent {
    pub fn new() -> Self {
        Self {
            mute_light: false,
            left_trigger_effect: trigger_effects::off(),
            right_trigger_effect: trigger_effects::off(),
            dirty: false,
        }
    }

    pub fn set_left_trigger_effect(&mut self, effect: TriggerEffect) {
        self.left_trigger_effect = effect;
        self.dirty = true;
    }

    pub fn left_trigger_effect(&self) -> &TriggerEffect {
        &self.left_trigger_effect
    }

    pub fn set_right_trigger_effect(&mut self, effect: TriggerEffect) {
        self.right_trigger_effect = effect;
        self.dirty = true;
    }

    pub fn right_trigger_effect(&self) -> &TriggerEffect {
        &self.right_trigger_effect
    }

    /// Only a change of value marks the component dirty
    pub fn set_mute_light(&mut self, on: bool) {
        if self.mute_light != on {
            self.mute_light = on;
            self.dirty = true;
        }
    }

    pub fn mute_light(&self) -> bool {
        self.mute_light
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether anything changed since the last call and clears the flag
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
