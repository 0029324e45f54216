use std::error::Error;
use std::path::Path;
use wavetty::config::Config;

pub fn handle_play(path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let expanded = path.map(|p| shellexpand::tilde(p).to_string());

    if let Some(p) = &expanded
        && !Path::new(p).exists()
    {
        return Err(format!("{p} does not exist").into());
    }

    #[cfg(feature = "player")]
    {
        crate::player::run(&config, expanded.as_deref().map(Path::new))
    }

    #[cfg(not(feature = "player"))]
    {
        let _ = (config, expanded);
        use owo_colors::OwoColorize;
        println!("{} {}", "🎵".cyan(), "wavetty".bold());
        println!();
        println!(
            "{} The player requires the 'player' feature to be enabled.",
            "Note:".yellow()
        );
        println!();
        println!("To enable it, install with:");
        println!("  {}", "cargo install wavetty --features player".cyan());
        println!();
        println!("Or if building from source:");
        println!("  {}", "cargo build --release --features player".cyan());

        Ok(())
    }
}
