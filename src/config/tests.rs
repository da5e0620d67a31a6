//! Tests for the config module

use super::types::*;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn overrides(env: &[(&str, &str)]) -> EnvOverrides {
    let map: HashMap<String, String> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvOverrides::from_lookup(|k| map.get(k).cloned())
}

#[test]
fn test_settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.images.collector, RELEASED_COLLECTOR_IMAGE);
    assert_eq!(settings.images.collector_dev, DEV_COLLECTOR_IMAGE);
    assert_eq!(settings.startup.wait_secs, 30);
    assert_eq!(settings.health.collector_probe, CollectorProbePolicy::Advisory);
    assert_eq!(settings.health.timeout_secs, None);
}

#[test]
fn test_released_and_dev_images_differ() {
    assert_ne!(RELEASED_COLLECTOR_IMAGE, DEV_COLLECTOR_IMAGE);
}

#[test]
fn test_settings_parse_toml() {
    let toml = r#"
[images]
grafana = "grafana/grafana:10.4.0"

[startup]
wait_secs = 5

[health]
collector_probe = "required"
timeout_secs = 3
"#;

    let settings: Settings = toml::from_str(toml).unwrap();

    assert_eq!(settings.images.grafana, "grafana/grafana:10.4.0");
    assert_eq!(settings.images.collector, RELEASED_COLLECTOR_IMAGE);
    assert_eq!(settings.startup.wait_secs, 5);
    assert_eq!(settings.health.collector_probe, CollectorProbePolicy::Required);
    assert_eq!(settings.health.timeout_secs, Some(3));
}

#[test]
fn test_load_or_default_without_file() {
    let dir = tempdir().unwrap();
    let (settings, warnings) = Settings::load_or_default(dir.path()).unwrap();
    assert_eq!(settings, Settings::default());
    assert!(warnings.is_empty());
}

#[test]
fn test_load_reports_unknown_keys_with_suggestion() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(Settings::FILE_NAME),
        "[startup]\nwait_sec = 1\n",
    )
    .unwrap();

    let (settings, warnings) = Settings::load_or_default(dir.path()).unwrap();

    assert_eq!(settings.startup.wait_secs, 30);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].key, "wait_sec");
    assert_eq!(warnings[0].line, Some(2));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("wait_secs"));
}

#[test]
fn test_load_rejects_colliding_images() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(Settings::FILE_NAME);
    fs::write(
        &path,
        "[images]\ncollector = \"same:1\"\ncollector_dev = \"same:1\"\n",
    )
    .unwrap();

    let err = Settings::load(&path).unwrap_err();
    assert!(err.to_string().contains("collector_dev"), "{err}");
}

#[test]
fn test_load_rejects_malformed_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(Settings::FILE_NAME);
    fs::write(&path, "[health\n").unwrap();

    assert!(Settings::load(&path).is_err());
}

#[test]
fn test_env_overrides_read_all_values() {
    let env = overrides(&[
        ("SPANNER_PROJECT_ID", "p1"),
        ("SPANNER_INSTANCE_ID", "i1"),
        ("SPANNER_DATABASE_ID", "d1"),
        ("STACKUP_WORK_DIR", "/srv/stack"),
        ("USE_DOCKER", "true"),
        ("DEV_MODE", "0"),
        ("COMPOSE_CMD", "docker compose"),
    ]);

    assert_eq!(
        env.complete_identity(),
        Some(("p1".to_string(), "i1".to_string(), "d1".to_string()))
    );
    assert_eq!(env.work_dir, Some(PathBuf::from("/srv/stack")));
    assert_eq!(env.use_docker, Some(true));
    assert_eq!(env.dev_mode, Some(false));
    assert_eq!(env.compose_cmd.as_deref(), Some("docker compose"));
}

#[test]
fn test_env_identity_incomplete_when_one_missing() {
    let env = overrides(&[
        ("SPANNER_PROJECT_ID", "p1"),
        ("SPANNER_INSTANCE_ID", "i1"),
        ("SPANNER_DATABASE_ID", "  "),
    ]);
    assert_eq!(env.database_id, None);
    assert_eq!(env.complete_identity(), None);
}

#[test]
fn test_env_invalid_bool_falls_back_to_false() {
    let env = overrides(&[("USE_DOCKER", "sometimes")]);
    assert_eq!(env.use_docker, Some(false));
}

#[test]
#[serial_test::serial]
fn test_env_overrides_from_process_env() {
    temp_env::with_vars(
        [
            ("SPANNER_PROJECT_ID", Some("proj")),
            ("SPANNER_INSTANCE_ID", None),
            ("DEV_MODE", Some("yes")),
        ],
        || {
            let env = EnvOverrides::from_env();
            assert_eq!(env.project_id.as_deref(), Some("proj"));
            assert_eq!(env.instance_id, None);
            assert_eq!(env.dev_mode, Some(true));
        },
    );
}

#[test]
fn test_runtime_from_override_splits_words() {
    let rt = RuntimeSelection::from_override("docker compose").unwrap();
    assert_eq!(rt.engine, Engine::Docker);
    assert_eq!(rt.program, "docker");
    assert_eq!(rt.args, vec!["compose"]);
    assert_eq!(rt.command_line(), "docker compose");

    let rt = RuntimeSelection::from_override("/opt/bin/podman-compose").unwrap();
    assert_eq!(rt.engine, Engine::Podman);

    assert!(RuntimeSelection::from_override("   ").is_none());
}

#[test]
fn test_collector_image_follows_dev_mode() {
    let mut cfg = RunConfig {
        work_dir: PathBuf::from("/tmp/stack"),
        identity: TargetIdentity {
            project_id: "p1".into(),
            instance_id: "i1".into(),
            database_id: "d1".into(),
        },
        credentials: CredentialRef::Ambient,
        service_account_email: None,
        runtime: RuntimeSelection::new(Engine::Podman, "podman-compose", &[]),
        dev_mode: false,
        gcloud_config_dir: None,
        settings: Settings::default(),
    };
    assert_eq!(cfg.collector_image(), RELEASED_COLLECTOR_IMAGE);

    cfg.dev_mode = true;
    assert_eq!(cfg.collector_image(), DEV_COLLECTOR_IMAGE);
}
