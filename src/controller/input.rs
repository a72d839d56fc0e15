//! Input model shared by every driver
//!
//! A [`ControllerState`] is a sparse snapshot of logical inputs: axes map to
//! floats, buttons to bools and hats to [`HatState`]. Drivers build a fresh
//! snapshot every tick and hand it to [`InputComponent::push_state`], which
//! swaps it in as a whole. Readers never see a half-written tick.
//!
//! Sticks are split into four directional half-axes (right/left/up/down),
//! each in `[0, 1]`, so bindings and deadzones can treat every direction on
//! its own. The halves belonging to one stick form a [`DeadzoneGroup`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

use chrono::{DateTime, Local};

use super::entity::{Component, ComponentId};

/// Stable name of a logical axis, button or hat
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputId(Cow<'static, str>);

impl InputId {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of a directional hat switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HatState {
    #[default]
    Centered,
    Up,
    Right,
    Down,
    Left,
    RightUp,
    RightDown,
    LeftUp,
    LeftDown,
}

impl HatState {
    pub fn is_up(self) -> bool {
        matches!(self, HatState::Up | HatState::RightUp | HatState::LeftUp)
    }

    pub fn is_down(self) -> bool {
        matches!(self, HatState::Down | HatState::RightDown | HatState::LeftDown)
    }

    pub fn is_left(self) -> bool {
        matches!(self, HatState::Left | HatState::LeftUp | HatState::LeftDown)
    }

    pub fn is_right(self) -> bool {
        matches!(self, HatState::Right | HatState::RightUp | HatState::RightDown)
    }
}

/// Set of axes that share one deadzone, e.g. the four halves of a stick
#[derive(Debug, Clone, PartialEq)]
pub struct DeadzoneGroup {
    pub name: InputId,
    pub axes: Vec<InputId>,
}

impl DeadzoneGroup {
    pub fn new(name: InputId, axes: Vec<InputId>) -> Self {
        Self { name, axes }
    }
}

/// Immutable snapshot of every logical input at one tick
#[derive(Debug, Clone)]
pub struct ControllerState {
    axes: BTreeMap<InputId, f32>,
    buttons: BTreeMap<InputId, bool>,
    hats: BTreeMap<InputId, HatState>,
    timestamp: DateTime<Local>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerState {
    pub fn new() -> Self {
        Self {
            axes: BTreeMap::new(),
            buttons: BTreeMap::new(),
            hats: BTreeMap::new(),
            timestamp: Local::now(),
        }
    }

    pub fn set_axis(&mut self, id: InputId, value: f32) {
        self.axes.insert(id, value);
    }

    pub fn set_button(&mut self, id: InputId, pressed: bool) {
        self.buttons.insert(id, pressed);
    }

    pub fn set_hat(&mut self, id: InputId, state: HatState) {
        self.hats.insert(id, state);
    }

    /// Value of an axis, `0.0` when the snapshot does not carry it
    pub fn axis(&self, id: &InputId) -> f32 {
        self.axes.get(id).copied().unwrap_or(0.0)
    }

    pub fn button(&self, id: &InputId) -> bool {
        self.buttons.get(id).copied().unwrap_or(false)
    }

    pub fn hat(&self, id: &InputId) -> HatState {
        self.hats.get(id).copied().unwrap_or_default()
    }

    pub fn axes(&self) -> impl Iterator<Item = (&InputId, f32)> {
        self.axes.iter().map(|(id, value)| (id, *value))
    }

    pub fn buttons(&self) -> impl Iterator<Item = (&InputId, bool)> {
        self.buttons.iter().map(|(id, pressed)| (id, *pressed))
    }

    pub fn hats(&self) -> impl Iterator<Item = (&InputId, HatState)> {
        self.hats.iter().map(|(id, state)| (id, *state))
    }

    /// Time the snapshot was created
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Copy of this snapshot with a radial deadzone applied to each group
    ///
    /// Within a group the axis values are treated as one vector. Below the
    /// deadzone the whole group reads zero, above it the magnitude is
    /// rescaled so the output still spans `[0, 1]`.
    pub fn with_deadzones<F>(&self, groups: &[DeadzoneGroup], deadzone_for: F) -> Self
    where
        F: Fn(&DeadzoneGroup) -> f32,
    {
        let mut state = self.clone();

        for group in groups {
            let deadzone = deadzone_for(group);
            if deadzone <= 0.0 {
                continue;
            }

            let magnitude = group
                .axes
                .iter()
                .map(|id| self.axis(id).powi(2))
                .sum::<f32>()
                .sqrt();
            let rescaled = apply_deadzone(magnitude, deadzone);
            let scale = if magnitude > 0.0 {
                rescaled / magnitude
            } else {
                0.0
            };

            for id in &group.axes {
                if let Some(value) = state.axes.get_mut(id) {
                    *value *= scale;
                }
            }
        }

        state
    }
}

fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

/// Latest input snapshot plus the mapping metadata describing the device
#[derive(Debug, Clone)]
pub struct InputComponent {
    state_now: ControllerState,
    state_then: ControllerState,
    button_count: usize,
    axis_count: usize,
    hat_count: usize,
    definitely_gamepad: bool,
    deadzone_groups: Vec<DeadzoneGroup>,
    mapping_id: Option<String>,
}

impl Component for InputComponent {
    const ID: ComponentId = ComponentId::Input;
}

impl InputComponent {
    pub fn new(
        button_count: usize,
        axis_count: usize,
        hat_count: usize,
        definitely_gamepad: bool,
        deadzone_groups: Vec<DeadzoneGroup>,
        mapping_id: Option<String>,
    ) -> Self {
        Self {
            state_now: ControllerState::new(),
            state_then: ControllerState::new(),
            button_count,
            axis_count,
            hat_count,
            definitely_gamepad,
            deadzone_groups,
            mapping_id,
        }
    }

    /// Replaces the current snapshot; the old one becomes [`Self::state_then`]
    pub fn push_state(&mut self, state: ControllerState) {
        self.state_then = std::mem::replace(&mut self.state_now, state);
    }

    pub fn state_now(&self) -> &ControllerState {
        &self.state_now
    }

    /// Snapshot from the tick before [`Self::state_now`]
    pub fn state_then(&self) -> &ControllerState {
        &self.state_then
    }

    pub fn just_pressed(&self, id: &InputId) -> bool {
        self.state_now.button(id) && !self.state_then.button(id)
    }

    pub fn just_released(&self, id: &InputId) -> bool {
        !self.state_now.button(id) && self.state_then.button(id)
    }

    pub fn button_count(&self) -> usize {
        self.button_count
    }

    pub fn axis_count(&self) -> usize {
        self.axis_count
    }

    pub fn hat_count(&self) -> usize {
        self.hat_count
    }

    pub fn is_definitely_gamepad(&self) -> bool {
        self.definitely_gamepad
    }

    pub fn deadzone_groups(&self) -> &[DeadzoneGroup] {
        &self.deadzone_groups
    }

    pub fn mapping_id(&self) -> Option<&str> {
        self.mapping_id.as_deref()
    }
}

/// Logical inputs of the mapped gamepad layout
pub mod gamepad_inputs {
    use super::{DeadzoneGroup, InputId};

    pub const LEFT_STICK_AXIS_RIGHT: InputId = InputId::from_static("left_stick_right");
    pub const LEFT_STICK_AXIS_LEFT: InputId = InputId::from_static("left_stick_left");
    pub const LEFT_STICK_AXIS_UP: InputId = InputId::from_static("left_stick_up");
    pub const LEFT_STICK_AXIS_DOWN: InputId = InputId::from_static("left_stick_down");
    pub const RIGHT_STICK_AXIS_RIGHT: InputId = InputId::from_static("right_stick_right");
    pub const RIGHT_STICK_AXIS_LEFT: InputId = InputId::from_static("right_stick_left");
    pub const RIGHT_STICK_AXIS_UP: InputId = InputId::from_static("right_stick_up");
    pub const RIGHT_STICK_AXIS_DOWN: InputId = InputId::from_static("right_stick_down");
    pub const LEFT_TRIGGER_AXIS: InputId = InputId::from_static("left_trigger");
    pub const RIGHT_TRIGGER_AXIS: InputId = InputId::from_static("right_trigger");

    pub const SOUTH_BUTTON: InputId = InputId::from_static("south");
    pub const EAST_BUTTON: InputId = InputId::from_static("east");
    pub const WEST_BUTTON: InputId = InputId::from_static("west");
    pub const NORTH_BUTTON: InputId = InputId::from_static("north");
    pub const LEFT_SHOULDER_BUTTON: InputId = InputId::from_static("left_shoulder");
    pub const RIGHT_SHOULDER_BUTTON: InputId = InputId::from_static("right_shoulder");
    pub const BACK_BUTTON: InputId = InputId::from_static("back");
    pub const START_BUTTON: InputId = InputId::from_static("start");
    pub const GUIDE_BUTTON: InputId = InputId::from_static("guide");
    pub const DPAD_UP_BUTTON: InputId = InputId::from_static("dpad_up");
    pub const DPAD_DOWN_BUTTON: InputId = InputId::from_static("dpad_down");
    pub const DPAD_LEFT_BUTTON: InputId = InputId::from_static("dpad_left");
    pub const DPAD_RIGHT_BUTTON: InputId = InputId::from_static("dpad_right");
    pub const LEFT_STICK_BUTTON: InputId = InputId::from_static("left_stick_press");
    pub const RIGHT_STICK_BUTTON: InputId = InputId::from_static("right_stick_press");
    pub const MISC_1_BUTTON: InputId = InputId::from_static("misc_1");
    pub const MISC_2_BUTTON: InputId = InputId::from_static("misc_2");
    pub const MISC_3_BUTTON: InputId = InputId::from_static("misc_3");
    pub const MISC_4_BUTTON: InputId = InputId::from_static("misc_4");
    pub const MISC_5_BUTTON: InputId = InputId::from_static("misc_5");
    pub const MISC_6_BUTTON: InputId = InputId::from_static("misc_6");
    pub const LEFT_PADDLE_1_BUTTON: InputId = InputId::from_static("left_paddle_1");
    pub const LEFT_PADDLE_2_BUTTON: InputId = InputId::from_static("left_paddle_2");
    pub const RIGHT_PADDLE_1_BUTTON: InputId = InputId::from_static("right_paddle_1");
    pub const RIGHT_PADDLE_2_BUTTON: InputId = InputId::from_static("right_paddle_2");
    pub const TOUCHPAD_1_BUTTON: InputId = InputId::from_static("touchpad_1");

    pub const LEFT_STICK: InputId = InputId::from_static("left_stick");
    pub const RIGHT_STICK: InputId = InputId::from_static("right_stick");
    pub const LEFT_TRIGGER: InputId = InputId::from_static("left_trigger");
    pub const RIGHT_TRIGGER: InputId = InputId::from_static("right_trigger");

    pub const AXIS_COUNT: usize = 10;
    pub const BUTTON_COUNT: usize = 26;

    pub fn deadzone_groups() -> Vec<DeadzoneGroup> {
        vec![
            DeadzoneGroup::new(
                LEFT_STICK,
                vec![
                    LEFT_STICK_AXIS_RIGHT,
                    LEFT_STICK_AXIS_LEFT,
                    LEFT_STICK_AXIS_UP,
                    LEFT_STICK_AXIS_DOWN,
                ],
            ),
            DeadzoneGroup::new(
                RIGHT_STICK,
                vec![
                    RIGHT_STICK_AXIS_RIGHT,
                    RIGHT_STICK_AXIS_LEFT,
                    RIGHT_STICK_AXIS_UP,
                    RIGHT_STICK_AXIS_DOWN,
                ],
            ),
            DeadzoneGroup::new(LEFT_TRIGGER, vec![LEFT_TRIGGER_AXIS]),
            DeadzoneGroup::new(RIGHT_TRIGGER, vec![RIGHT_TRIGGER_AXIS]),
        ]
    }
}

/// Generic indexed inputs for raw joysticks
pub mod joystick_inputs {
    use super::InputId;

    /// Half of axis `index`; `positive` selects the half above center
    pub fn axis(index: usize, positive: bool) -> InputId {
        let half = if positive { "positive" } else { "negative" };
        InputId::new(format!("axis_{index}_{half}"))
    }

    pub fn button(index: usize) -> InputId {
        InputId::new(format!("button_{index}"))
    }

    pub fn hat(index: usize) -> InputId {
        InputId::new(format!("hat_{index}"))
    }
}
