use super::*;
use serial_test::serial;
use tempfile::TempDir;

fn clear_env() {
    for var in [
        "TURNMEM_PORT",
        "TURNMEM_HOST",
        "TURNMEM_MODEL",
        "TURNMEM_DB_PATH",
        "TURNMEM_DATA_DIR",
    ] {
        // SAFETY: tests are serialized with #[serial] so no other thread
        // observes the environment mid-mutation.
        unsafe {
            std::env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn defaults_are_valid() {
    clear_env();
    let cfg = Config::default();
    assert!(cfg.validate().is_ok());
}

#[test]
#[serial]
fn rejects_out_of_range_port() {
    let mut cfg = Config::default();
    cfg.port = 80;
    assert!(cfg.validate().is_err());
}

#[test]
#[serial]
fn rejects_model_outside_allowlist() {
    let mut cfg = Config::default();
    cfg.model = "not-a-real-model".to_string();
    assert!(cfg.validate().is_err());
}

#[test]
#[serial]
fn env_overrides_file_overrides_default() {
    clear_env();
    let dir = TempDir::new().unwrap();
    // SAFETY: serialized test.
    unsafe {
        std::env::set_var("TURNMEM_DATA_DIR", dir.path());
    }
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{"port": 9000, "max_sessions": 9}"#,
    )
    .unwrap();
    // SAFETY: serialized test.
    unsafe {
        std::env::set_var("TURNMEM_PORT", "9100");
    }

    let cfg = Config::load().unwrap();
    assert_eq!(cfg.port, 9100); // env wins over file
    assert_eq!(cfg.max_sessions, 9); // file wins over default

    clear_env();
}
