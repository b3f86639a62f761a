use std::sync::Mutex;

use tempfile::NamedTempFile;

use posemark::PosemarkConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "POSEMARK_CONFIG",
        "POSEMARK_BACKEND",
        "POSEMARK_MODEL_PATH",
        "POSEMARK_VISIBILITY_THRESHOLD",
        "POSEMARK_STUB_FRAMES",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_load_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = PosemarkConfig::load().expect("load config");
    assert_eq!(cfg.backend, "stub");
    assert_eq!(cfg.model_input_size, 256);
    assert_eq!(cfg.stub.frames, 10);
    assert!((cfg.visibility_threshold - 0.5).abs() < f32::EPSILON);
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "backend": "stub",
        "model": {
            "path": "models/pose_landmarker.onnx",
            "input_size": 192
        },
        "overlay": {
            "visibility_threshold": 0.4,
            "marker_radius": 5
        },
        "stub": {
            "frames": 25,
            "width": 320,
            "height": 240,
            "fps": 24.0
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("POSEMARK_CONFIG", file.path());
    std::env::set_var("POSEMARK_STUB_FRAMES", "50");
    std::env::set_var("POSEMARK_VISIBILITY_THRESHOLD", "0.7");

    let cfg = PosemarkConfig::load().expect("load config");
    assert_eq!(cfg.backend, "stub");
    assert_eq!(cfg.model_input_size, 192);
    assert_eq!(cfg.marker_radius, 5);
    // Environment wins over the file.
    assert_eq!(cfg.stub.frames, 50);
    assert!((cfg.visibility_threshold - 0.7).abs() < f32::EPSILON);
    assert_eq!(cfg.stub.width, 320);
    assert_eq!(cfg.stub.fps, 24.0);

    clear_env();
}

#[test]
fn tract_backend_requires_a_model_path() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("POSEMARK_BACKEND", "tract");
    let result = PosemarkConfig::load();
    clear_env();
    assert!(result.is_err());
}

#[test]
fn rejects_out_of_range_threshold() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("POSEMARK_VISIBILITY_THRESHOLD", "1.5");
    let result = PosemarkConfig::load();
    clear_env();
    assert!(result.is_err());
}

#[test]
fn rejects_malformed_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"not json").expect("write config");
    std::env::set_var("POSEMARK_CONFIG", file.path());
    let result = PosemarkConfig::load();
    clear_env();
    assert!(result.is_err());
}
