use memalert_daemon::autostart::Autostart;
use memalert_daemon::config::Config;
use memalert_daemon::threshold::MB;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.general.sound_alerts_enabled);
    assert!(!config.general.launch_at_login);
    assert_eq!(config.monitor.default_thresholds_mb, vec![5120, 10240, 15360]);
}

#[test]
fn test_load_from_toml() {
    let toml_content = r#"
[general]
sound_alerts_enabled = false
launch_at_login = true

[monitor]
default_thresholds_mb = [2048, 500]
"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml_content.as_bytes()).unwrap();
    let config = Config::load(file.path()).unwrap();
    assert!(!config.general.sound_alerts_enabled);
    assert!(config.general.launch_at_login);
    assert_eq!(config.default_thresholds().as_slice(), &[500 * MB, 2048 * MB]);
}

#[test]
fn test_missing_sections_use_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[general]\nlaunch_at_login = true\n").unwrap();
    let config = Config::load(file.path()).unwrap();
    assert!(config.general.sound_alerts_enabled);
    assert_eq!(config.monitor, Config::default().monitor);
}

#[test]
fn test_broken_file_falls_back() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"general = [[[").unwrap();
    assert_eq!(Config::load_or_default(file.path()), Config::default());
    assert_eq!(Config::load_or_default(&PathBuf::from("/nonexistent/memalert.toml")), Config::default());
}

#[test]
fn test_invalid_default_thresholds_fall_back() {
    let mut config = Config::default();
    config.monitor.default_thresholds_mb = vec![0];
    assert_eq!(config.default_thresholds().to_megabytes(), vec![5120, 10240, 15360]);
}

#[test]
fn test_save_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sub").join("config.toml");
    let mut config = Config::default();
    config.general.sound_alerts_enabled = false;
    config.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_autostart_entry_toggles() {
    let dir = tempdir().unwrap();
    let autostart = Autostart::new(dir.path().join("autostart"), PathBuf::from("/usr/bin/memalert-daemon"));
    assert!(!autostart.is_enabled());

    autostart.set_enabled(true).unwrap();
    assert!(autostart.is_enabled());
    let entry = std::fs::read_to_string(autostart.entry_path()).unwrap();
    assert!(entry.contains("Exec=/usr/bin/memalert-daemon"));

    autostart.set_enabled(false).unwrap();
    assert!(!autostart.is_enabled());
    // Disabling twice is fine
    autostart.set_enabled(false).unwrap();
}
