use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod store;

use store::Store;

#[derive(Parser)]
#[command(name = "avea")]
#[command(author, version, about = "CLI for Elgato Avea smart lamps", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Give up and exit non-zero after this many seconds
    #[arg(short, long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the color from explicit channel values
    #[command(visible_alias = "set-color-rgbw")]
    Rgbw {
        /// Red channel (0-255)
        red: u16,
        /// Green channel (0-255)
        green: u16,
        /// Blue channel (0-255)
        blue: u16,
        /// White channel (0-255)
        white: u16,
    },

    /// Set the color from a saved preset
    #[command(visible_alias = "c")]
    SetColor {
        /// Name of the saved color
        name: String,
    },

    /// Set the overall brightness
    #[command(visible_alias = "b")]
    SetBrightness {
        /// Brightness (0-255)
        value: u16,
    },

    /// Turn the lamp off
    Off,

    /// List the saved colors
    ShowColors,

    /// Save a new named color
    AddColor {
        /// Name for the new color
        name: String,
        /// Red channel (0-255)
        red: u16,
        /// Green channel (0-255)
        green: u16,
        /// Blue channel (0-255)
        blue: u16,
        /// White channel (0-255)
        white: u16,
    },

    /// Delete a saved color
    DeleteColor {
        /// Name of the color to delete
        name: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "avea", &mut io::stdout());
        return Ok(());
    }

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Commands that wait for a lamp block without a deadline of their own;
    // the watchdog is the opt-in way to bound them.
    if let Some(seconds) = cli.timeout {
        commands::spawn_watchdog(seconds);
    }

    let store = Store::open_default()?;

    match cli.command {
        Commands::Rgbw {
            red,
            green,
            blue,
            white,
        } => commands::set_rgbw(&store, red, green, blue, white),
        Commands::SetColor { name } => commands::set_preset(&store, &name),
        Commands::SetBrightness { value } => commands::set_brightness(&store, value),
        Commands::Off => commands::turn_off(&store),
        Commands::ShowColors => commands::show_colors(&store),
        Commands::AddColor {
            name,
            red,
            green,
            blue,
            white,
        } => commands::add_color(&store, name, red, green, blue, white),
        Commands::DeleteColor { name } => commands::delete_color(&store, &name),
        Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    }
}
