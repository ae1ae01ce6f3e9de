//! tapedeck - a terminal audio file player.
//!
//! Opens one or more WAV/FLAC files and plays them through a small transport:
//! play/pause, stop (return to zero), repeat, and a position readout polled
//! at a fixed interval. With the waveform view on, the whole file is drawn
//! with a playhead that follows playback.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;
use std::path::PathBuf;

mod cli;

#[cfg(feature = "player")]
mod player;

#[derive(Parser)]
#[command(name = "tapedeck")]
#[command(about = "Terminal audio file player")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play audio files
    Play {
        /// Files to load; n/p cycles between them
        files: Vec<PathBuf>,
        /// Show the waveform with a playhead
        #[arg(long, conflicts_with = "no_waveform")]
        waveform: bool,
        /// Hide the waveform view
        #[arg(long)]
        no_waveform: bool,
        /// Start with repeat enabled
        #[arg(short, long)]
        repeat: bool,
    },
    /// Write the default configuration file
    Init,
    /// Show or change the configuration
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
        #[arg(value_parser = PossibleValuesParser::new([
            "tick_interval_ms",
            "waveform",
            "repeat",
            "thumbnail_peaks",
            "log_file",
            "log_level",
        ]))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

/// Resolve the pair of waveform flags into an override, if any was given.
fn waveform_override(waveform: bool, no_waveform: bool) -> Option<bool> {
    match (waveform, no_waveform) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            files,
            waveform,
            no_waveform,
            repeat,
        } => {
            cli::play::handle_play(&files, waveform_override(waveform, no_waveform), repeat)?;
        }
        Commands::Init => {
            cli::init::handle_init()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_play() {
        let cli = Cli::try_parse_from(["tapedeck", "play", "a.wav", "b.flac", "--repeat"]).unwrap();
        match cli.command {
            Commands::Play {
                files,
                waveform,
                no_waveform,
                repeat,
            } => {
                assert_eq!(files, vec![PathBuf::from("a.wav"), PathBuf::from("b.flac")]);
                assert_eq!(waveform_override(waveform, no_waveform), None);
                assert!(repeat);
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn test_waveform_override() {
        assert_eq!(waveform_override(true, false), Some(true));
        assert_eq!(waveform_override(false, true), Some(false));
        assert_eq!(waveform_override(false, false), None);
    }

    #[test]
    fn test_config_set_rejects_unknown_key() {
        assert!(Cli::try_parse_from(["tapedeck", "config", "set", "volume", "1"]).is_err());
    }
}
