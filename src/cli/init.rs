use owo_colors::OwoColorize;
use std::error::Error;
use tapedeck::config::Config;

pub fn handle_init() -> Result<(), Box<dyn Error>> {
    if Config::exists()? {
        return Err(format!(
            "Configuration already exists at {}. Use 'tapedeck config set' to change it.",
            Config::config_path()?.display()
        )
        .into());
    }

    Config::new().save()?;

    println!("{}", "tapedeck initialized".green());
    println!(
        "Configuration saved to: {}",
        Config::config_path()?.display()
    );

    Ok(())
}
