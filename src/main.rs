use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use controller_drivers::controller::gamepad_inputs;
use controller_drivers::controller::{
    BatteryLevelComponent, ControllerEntity, InputComponent, PowerState, RumbleComponent,
    RumbleState,
};
use controller_drivers::driver::gilrs::{enumerate_gamepads, open_gilrs, pump_events, GilrsGamepad};
use controller_drivers::driver::{Driver, GamepadDriver};
use controller_drivers::{logging, DriverSettings};
use tracing::{debug, error, info, warn};

struct Session {
    driver: GamepadDriver<GilrsGamepad>,
    entity: ControllerEntity,
    battery: PowerState,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup()?;

    let settings = DriverSettings::load_or_default();
    let gilrs = open_gilrs().map_err(|e| eyre!("Failed to open gilrs: {}", e))?;

    let mut sessions = Vec::new();
    for (info, gamepad) in enumerate_gamepads(&gilrs) {
        let mut driver = GamepadDriver::new(gamepad, &info.controller_type, None, &settings);
        let mut entity = ControllerEntity::new(info);
        driver
            .add_components(&mut entity)
            .map_err(|e| eyre!("Failed to set up {}: {}", entity.uid(), e))?;
        info!(
            "Driving {} ({}) with {:?}",
            driver.driver_name(),
            entity.info().controller_type.friendly_name,
            entity.component_ids()
        );
        sessions.push(Session {
            driver,
            entity,
            battery: PowerState::Unknown,
        });
    }

    let period = Duration::from_millis(1000 / u64::from(settings.tick_rate));
    let mut ticker = tokio::time::interval(period);
    info!("Ticking every {:?}, press Ctrl+C to stop", period);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            _ = ticker.tick() => {
                pump_events(&gilrs);
                sessions.retain_mut(|session| tick(session, &settings));
            }
        }
    }

    for mut session in sessions {
        if let Err(e) = session.driver.close() {
            error!("Failed to close {}: {}", session.entity.uid(), e);
        }
    }
    Ok(())
}

/// Runs one tick for a session; `false` drops it
fn tick(session: &mut Session, settings: &DriverSettings) -> bool {
    if let Err(e) = session.driver.update(&mut session.entity, false) {
        error!("Dropping {}: {}", session.entity.uid(), e);
        if let Err(e) = session.driver.close() {
            warn!("Failed to close {}: {}", session.entity.uid(), e);
        }
        return false;
    }

    let name = session.driver.driver_name().to_string();
    let mut rumble = None;
    if let Some(input) = session.entity.component::<InputComponent>() {
        let state = input
            .state_now()
            .with_deadzones(input.deadzone_groups(), |_| settings.default_deadzone);

        for (id, pressed) in state.buttons() {
            if pressed && input.just_pressed(id) {
                info!("{}: {} pressed", name, id);
            }
        }

        let left = state.axis(&gamepad_inputs::LEFT_STICK_AXIS_RIGHT)
            - state.axis(&gamepad_inputs::LEFT_STICK_AXIS_LEFT);
        let up = state.axis(&gamepad_inputs::LEFT_STICK_AXIS_UP)
            - state.axis(&gamepad_inputs::LEFT_STICK_AXIS_DOWN);
        if left != 0.0 || up != 0.0 {
            debug!("{}: left stick ({:.2}, {:.2})", name, left, up);
        }

        if input.just_pressed(&gamepad_inputs::SOUTH_BUTTON) {
            rumble = Some(RumbleState::new(0.6, 0.3));
        } else if input.just_released(&gamepad_inputs::SOUTH_BUTTON) {
            rumble = Some(RumbleState::OFF);
        }
    }

    if let (Some(request), Some(component)) =
        (rumble, session.entity.component_mut::<RumbleComponent>())
    {
        component.queue_rumble(request);
    }

    if let Some(battery) = session.entity.component::<BatteryLevelComponent>() {
        let level = battery.battery_level();
        if level != session.battery {
            info!("{}: battery {}", name, level);
            session.battery = level;
        }
    }

    true
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    logging::init().map_err(|e| eyre!("Failed to set up logging: {}", e))?;
    Ok(())
}
