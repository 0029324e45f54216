use tempfile::TempDir;
use wavetty::config::{Config, ConfigError};
use wavetty::playback::VisualizationMode;

#[test]
fn test_config_lifecycle() {
    // Create a temporary directory for test config
    let temp_dir = TempDir::new().unwrap();

    // Override the config path for testing
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    // Test that config doesn't exist initially
    assert!(!Config::exists().unwrap());

    // Missing file loads as defaults
    let defaults = Config::load().unwrap();
    assert_eq!(defaults, Config::new());

    // Create and save a config
    Config::new().save().unwrap();
    assert!(Config::exists().unwrap());

    // Test config mutation
    let mut config = Config::load().unwrap();
    config.set_value("visualization", "spectrum").unwrap();
    config.set_value("seek_seconds", "15").unwrap();
    config.save().unwrap();

    // Verify mutations persisted and feed the playback settings
    let reloaded = Config::load().unwrap();
    assert_eq!(reloaded.visualization, VisualizationMode::Spectrum);
    assert_eq!(reloaded.seek_seconds, 15);
    assert_eq!(reloaded.controller_settings().fft_size, 1024);

    // Test invalid key
    let mut config = Config::load().unwrap();
    assert!(matches!(
        config.set_value("invalid_key", "value"),
        Err(ConfigError::UnknownKey(_))
    ));
}
