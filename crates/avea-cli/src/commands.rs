//! Command handlers gluing the store to the lamp facade.

use std::process;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use avea_core::Lamp;
use avea_types::{Brightness, Color, DeviceAddress};

use crate::store::{ColorPreset, Store};

/// Kill the process after the given number of seconds.
///
/// Lamp commands block until a lamp answers, with no deadline of their own.
/// The watchdog bounds that wait at the process level: it sleeps on a
/// detached thread and exits non-zero when the time is up.
pub fn spawn_watchdog(seconds: u64) {
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(seconds));
        eprintln!("Timed out after {seconds}s waiting for the lamp, giving up.");
        process::exit(1);
    });
}

/// Set the lamp to an explicit RGBW color.
pub fn set_rgbw(store: &Store, red: u16, green: u16, blue: u16, white: u16) -> Result<()> {
    let color = Color::rgbw(red, green, blue, white)?;
    println!("Setting color to {color}");
    send_color(store, color)
}

/// Set the lamp to a stored preset.
pub fn set_preset(store: &Store, name: &str) -> Result<()> {
    // Resolve the preset before touching Bluetooth, so an unknown name
    // fails without a scan.
    let preset = store.preset(name)?;
    println!("Setting color '{}' ({})", preset.title, preset.color);
    send_color(store, preset.color)
}

/// Set the lamp brightness.
pub fn set_brightness(store: &Store, value: u16) -> Result<()> {
    let brightness = Brightness::new(value)?;
    println!("Setting brightness to {brightness}");

    let lamp = Lamp::new()?;
    let known = store.known_addresses()?;
    lamp.set_brightness(brightness, &known, remember_with(store))
        .context("could not set the lamp brightness")
}

/// Turn the lamp off.
pub fn turn_off(store: &Store) -> Result<()> {
    println!("Turning the lamp off");

    let lamp = Lamp::new()?;
    let known = store.known_addresses()?;
    lamp.turn_off(&known, remember_with(store))
        .context("could not turn the lamp off")
}

/// Print every stored preset.
pub fn show_colors(store: &Store) -> Result<()> {
    println!("Available colors:\n");
    for preset in store.presets()? {
        println!("[{}] {}", preset.title, preset.color);
    }
    Ok(())
}

/// Store a new named preset.
pub fn add_color(
    store: &Store,
    name: String,
    red: u16,
    green: u16,
    blue: u16,
    white: u16,
) -> Result<()> {
    let color = Color::rgbw(red, green, blue, white)?;
    store.add_preset(ColorPreset {
        title: name.clone(),
        color,
    })?;
    println!("'{name}' added to colors");
    Ok(())
}

/// Delete a stored preset.
pub fn delete_color(store: &Store, name: &str) -> Result<()> {
    store.delete_preset(name)?;
    println!("'{name}' removed from colors");
    Ok(())
}

fn send_color(store: &Store, color: Color) -> Result<()> {
    let lamp = Lamp::new()?;
    let known = store.known_addresses()?;
    lamp.set_color(color, &known, remember_with(store))
        .context("could not change the lamp color")
}

/// Callback that stores every newly discovered lamp address.
fn remember_with(store: &Store) -> impl FnMut(DeviceAddress) + '_ {
    move |address| {
        if let Err(error) = store.remember_address(&address) {
            warn!(%address, %error, "could not store the lamp address");
        }
    }
}
