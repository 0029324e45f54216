use owo_colors::OwoColorize;
use std::error::Error;
use wavetty::config::Config;

pub fn handle_init() -> Result<(), Box<dyn Error>> {
    if Config::exists()? {
        return Err(format!(
            "wavetty is already initialized. Use 'wavetty config set <key> <value>' to change settings ({}).",
            Config::config_path()?.display()
        )
        .into());
    }

    let config = Config::new();
    config.save()?;

    println!("{} wavetty initialized", "✓".green());
    println!("Browser starts in: {}", config.start_dir_path().display());
    println!(
        "Configuration saved to: {}",
        Config::config_path()?.display()
    );

    Ok(())
}
