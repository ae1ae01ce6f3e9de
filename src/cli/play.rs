use std::error::Error;
use std::path::PathBuf;

pub fn handle_play(
    files: &[PathBuf],
    waveform: Option<bool>,
    repeat: bool,
) -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "player")]
    {
        use owo_colors::OwoColorize;
        use tapedeck::config::Config;
        use tapedeck::constants::{AUDIO_EXTENSIONS, is_supported_audio};

        let config = Config::load()?;
        let mut options = crate::player::app::PlayerOptions::from_config(&config);
        if let Some(waveform) = waveform {
            options.waveform = waveform;
        }
        options.repeat |= repeat;

        let (playable, skipped): (Vec<PathBuf>, Vec<PathBuf>) =
            files.iter().cloned().partition(|p| is_supported_audio(p));
        for path in &skipped {
            eprintln!(
                "{} skipping {} (supported: {})",
                "warning:".yellow(),
                path.display(),
                AUDIO_EXTENSIONS.join(", ")
            );
        }

        crate::player::run(playable, options, &config)
    }

    #[cfg(not(feature = "player"))]
    {
        let _ = files;
        let _ = waveform;
        let _ = repeat;
        use owo_colors::OwoColorize;
        println!(
            "{} The audio player requires the 'player' feature to be enabled.",
            "Note:".yellow()
        );
        println!();
        println!("To enable it, build with:");
        println!("  {}", "cargo build --release --features player".cyan());

        Ok(())
    }
}
