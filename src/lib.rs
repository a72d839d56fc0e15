//! Controller drivers: native device handles turned into per-controller
//! component state, polled once per tick.
//!
//! ```text
//! native device ──► Driver::update ──► ControllerEntity components ──► consumers
//!                        ▲                                                │
//!                        └────────── rumble / trigger effects / haptics ◄─┘
//! ```

pub mod config;
pub mod controller;
pub mod driver;
pub mod logging;

pub use config::{ConfigError, DriverSettings};
pub use controller::{ControllerEntity, ControllerInfo, ControllerType};
pub use driver::{Driver, DriverError};
