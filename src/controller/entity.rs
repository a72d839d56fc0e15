//! Controller entity and the component registry attached to it.
//!
//! A [`ControllerEntity`] is created by the device enumerator when a device is
//! opened. Drivers populate it once through `add_components` and then mutate
//! the components they own on every tick. Components are keyed by a closed set
//! of [`ComponentId`]s; a missing component means the hardware does not have
//! that capability, which is a normal state and never an error.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Display};

/// Identifier for every kind of component a driver can attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentId {
    Input,
    Gyro,
    Touchpad,
    BatteryLevel,
    Rumble,
    TriggerRumble,
    DualSense,
    HdHaptic,
    Bluetooth,
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Input => write!(f, "input"),
            ComponentId::Gyro => write!(f, "gyro"),
            ComponentId::Touchpad => write!(f, "touchpad"),
            ComponentId::BatteryLevel => write!(f, "battery_level"),
            ComponentId::Rumble => write!(f, "rumble"),
            ComponentId::TriggerRumble => write!(f, "trigger_rumble"),
            ComponentId::DualSense => write!(f, "dualsense"),
            ComponentId::HdHaptic => write!(f, "hd_haptic"),
            ComponentId::Bluetooth => write!(f, "bluetooth"),
        }
    }
}

/// State holder attached to a [`ControllerEntity`]
///
/// Every implementor names the single [`ComponentId`] slot it occupies, which
/// is what lets the registry hand back a typed reference.
pub trait Component: Any {
    const ID: ComponentId;
}

/// Marker attached to premium controllers that appear to be connected over
/// Bluetooth. Carries no state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BluetoothDeviceComponent;

impl Component for BluetoothDeviceComponent {
    const ID: ComponentId = ComponentId::Bluetooth;
}

/// Vendor/model classification resolved by the enumerator before a driver
/// is constructed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerType {
    /// Short vendor namespace, e.g. `"dualsense"` or `"xbox"`
    pub namespace: String,
    /// Human readable model name
    pub friendly_name: String,
    /// Identifier of the input mapping table consumers should use
    pub mapping_id: Option<String>,
}

impl ControllerType {
    pub const DUALSENSE_NAMESPACE: &'static str = "dualsense";

    pub fn new(namespace: impl Into<String>, friendly_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            friendly_name: friendly_name.into(),
            mapping_id: None,
        }
    }

    pub fn with_mapping_id(mut self, mapping_id: impl Into<String>) -> Self {
        self.mapping_id = Some(mapping_id.into());
        self
    }

    pub fn unknown() -> Self {
        Self::new("unknown", "Unknown Controller")
    }

    pub fn is_dualsense(&self) -> bool {
        self.namespace == Self::DUALSENSE_NAMESPACE
    }
}

impl Default for ControllerType {
    fn default() -> Self {
        Self::unknown()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerInfo {
    /// Stable identifier for the physical device, unique per session
    pub uid: String,
    pub controller_type: ControllerType,
}

impl ControllerInfo {
    pub fn new(uid: impl Into<String>, controller_type: ControllerType) -> Self {
        Self {
            uid: uid.into(),
            controller_type,
        }
    }
}

/// One connected controller and the capability components drivers attached
/// to it
pub struct ControllerEntity {
    info: ControllerInfo,
    components: HashMap<ComponentId, Box<dyn Any>>,
}

impl ControllerEntity {
    pub fn new(info: ControllerInfo) -> Self {
        Self {
            info,
            components: HashMap::new(),
        }
    }

    pub fn info(&self) -> &ControllerInfo {
        &self.info
    }

    pub fn uid(&self) -> &str {
        &self.info.uid
    }

    /// Attaches `component` to its slot, replacing whatever was there
    pub fn set_component<C: Component>(&mut self, component: C) {
        self.components.insert(C::ID, Box::new(component));
    }

    pub fn component<C: Component>(&self) -> Option<&C> {
        self.components
            .get(&C::ID)
            .and_then(|component| component.downcast_ref::<C>())
    }

    pub fn component_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components
            .get_mut(&C::ID)
            .and_then(|component| component.downcast_mut::<C>())
    }

    pub fn remove_component<C: Component>(&mut self) -> Option<C> {
        let component = self.components.remove(&C::ID)?;
        component.downcast::<C>().ok().map(|boxed| *boxed)
    }

    pub fn has_component(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    /// Ids of every attached component, sorted for stable output
    pub fn component_ids(&self) -> Vec<ComponentId> {
        let mut ids: Vec<ComponentId> = self.components.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for ControllerEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerEntity")
            .field("info", &self.info)
            .field("components", &self.component_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    impl Component for Counter {
        const ID: ComponentId = ComponentId::Gyro;
    }

    fn entity() -> ControllerEntity {
        ControllerEntity::new(ControllerInfo::new("test-0", ControllerType::unknown()))
    }

    #[test]
    fn missing_component_is_none() {
        let entity = entity();
        assert!(entity.component::<Counter>().is_none());
        assert!(!entity.has_component(ComponentId::Gyro));
    }

    #[test]
    fn set_then_lookup_and_mutate() {
        let mut entity = entity();
        entity.set_component(Counter(1));
        entity.component_mut::<Counter>().unwrap().0 += 1;

        assert_eq!(entity.component::<Counter>(), Some(&Counter(2)));
        assert_eq!(entity.component_ids(), vec![ComponentId::Gyro]);
    }

    #[test]
    fn set_replaces_existing_slot() {
        let mut entity = entity();
        entity.set_component(Counter(1));
        entity.set_component(Counter(7));
        assert_eq!(entity.remove_component::<Counter>(), Some(Counter(7)));
        assert!(entity.component::<Counter>().is_none());
    }

    #[test]
    fn dualsense_namespace_detection() {
        assert!(ControllerType::new("dualsense", "DualSense").is_dualsense());
        assert!(!ControllerType::new("xbox", "Xbox Series").is_dualsense());
    }
}
