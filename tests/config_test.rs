use tempfile::TempDir;

#[test]
fn test_config_lifecycle() {
    // Create a temporary directory for test config
    let temp_dir = TempDir::new().unwrap();

    // Override the config path for testing
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    // Test that config doesn't exist initially
    assert!(!tapedeck::config::Config::exists().unwrap());

    // A missing file loads as defaults
    let defaults = tapedeck::config::Config::load().unwrap();
    assert_eq!(defaults.tick_interval_ms, 20);
    assert!(defaults.waveform);

    // Create and save a config
    let config = tapedeck::config::Config::new();
    config.save().unwrap();
    assert!(tapedeck::config::Config::exists().unwrap());

    // Test config mutation
    let mut config = tapedeck::config::Config::load().unwrap();
    config.set_value("waveform", "false").unwrap();
    config.set_value("repeat", "true").unwrap();
    config.save().unwrap();

    // Verify mutations persisted
    let reloaded = tapedeck::config::Config::load().unwrap();
    assert!(!reloaded.waveform);
    assert!(reloaded.repeat);

    // Test invalid key
    let mut config = tapedeck::config::Config::load().unwrap();
    assert!(config.set_value("invalid_key", "value").is_err());
}
