//! Example: Setting an Avea Lamp's Color
//!
//! Finds the first Avea lamp in range and turns it orange. The call blocks
//! until the lamp has acknowledged the command.
//!
//! Run with: `cargo run --example set_color`

use std::collections::HashSet;

use avea_core::{Color, Lamp};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("Looking for an Avea lamp...");

    let lamp = Lamp::new()?;
    let orange = Color::rgbw(255, 75, 0, 0)?;

    lamp.set_color(orange, &HashSet::new(), |address| {
        println!("Discovered lamp at {address}");
    })?;

    println!("Done, the lamp is orange now.");
    Ok(())
}
