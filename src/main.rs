//! wavetty - terminal audio player with live visualization.
//!
//! Browse directories, queue tracks, and watch a waveform or spectrum of what
//! is playing, all from the terminal. Decoding and output run on a dedicated
//! audio thread; the terminal UI only ever reads published snapshots of the
//! playback state.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;
use wavetty::config::CONFIG_KEYS;

mod cli;

#[cfg(feature = "player")]
mod player;

#[derive(Parser)]
#[command(name = "wavetty")]
#[command(about = "Terminal audio player with waveform and spectrum visualization")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory to browse or file to play (same as `wavetty play PATH`)
    path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the player
    Play {
        /// Directory to browse or file to play
        path: Option<String>,
    },
    /// Write a default configuration file
    Init,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new(CONFIG_KEYS.iter().copied()))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Print the configuration file path
    Path,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            cli::play::handle_play(cli.path.as_deref())?;
        }
        Some(Commands::Play { path }) => {
            cli::play::handle_play(path.as_deref())?;
        }
        Some(Commands::Init) => {
            cli::init::handle_init()?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Path => {
                cli::config::handle_config_path()?;
            }
        },
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
    }

    Ok(())
}
