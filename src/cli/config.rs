use owo_colors::OwoColorize;
use std::error::Error;
use wavetty::config::Config;

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load_unvalidated()?;

    println!("{}", "Current wavetty configuration:".bold());
    println!("  start_dir: {}", config.start_dir);
    println!("  seek_seconds: {}", config.seek_seconds);
    println!("  refresh_interval_ms: {}", config.refresh_interval_ms);
    println!("  frames_per_buffer: {}", config.frames_per_buffer);
    println!("  chunk_frames: {}", config.chunk_frames);
    println!("  fft_size: {}", config.fft_size);
    println!("  visualization: {}", config.visualization.label().to_lowercase());
    println!("  log_file: {}", config.log_file);
    println!("  log_level: {}", config.log_level);

    if !Config::exists()? {
        println!();
        println!(
            "{} No config file yet; these are the defaults. Run 'wavetty init' to write one.",
            "Note:".yellow()
        );
    }

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load_unvalidated()?;

    config.set_value(key, value)?;
    config.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}

pub fn handle_config_path() -> Result<(), Box<dyn Error>> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}
