use std::fmt::{self, Display};

use super::entity::{Component, ComponentId};

/// Power source and charge of a controller as last reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerState {
    #[default]
    Unknown,
    /// Wired device with no battery
    WiredOnly,
    /// Running on battery, percentage remaining
    Depleting(u8),
    /// Plugged in and charging, percentage charged
    Charging(u8),
    Full,
}

impl Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::Unknown => write!(f, "unknown"),
            PowerState::WiredOnly => write!(f, "wired"),
            PowerState::Depleting(percent) => write!(f, "{percent}% (discharging)"),
            PowerState::Charging(percent) => write!(f, "{percent}% (charging)"),
            PowerState::Full => write!(f, "full"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatteryLevelComponent {
    level: PowerState,
}

impl Component for BatteryLevelComponent {
    const ID: ComponentId = ComponentId::BatteryLevel;
}

impl BatteryLevelComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn battery_level(&self) -> PowerState {
        self.level
    }

    pub fn set_battery_level(&mut self, level: PowerState) {
        self.level = level;
    }
}
