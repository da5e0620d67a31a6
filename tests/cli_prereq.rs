mod common;

use common::TestEnv;

#[test]
fn test_missing_tools_are_all_named() {
    let env = TestEnv::new();

    let result = env.run(&["--project", "p1", "--instance", "i1", "--database", "d1"]);

    assert_eq!(result.exit_code, 1, "{}", result.combined_output());
    assert!(
        result.stderr.contains("missing required tools: git, curl"),
        "got:\n{}",
        result.stderr
    );
}

#[cfg(unix)]
#[test]
fn test_no_container_runtime_writes_nothing() {
    let env = TestEnv::new();
    env.stub_tool("git", 0);
    env.stub_tool("curl", 0);

    let result = env.run(&["--project", "p1", "--instance", "i1", "--database", "d1"]);

    assert_eq!(result.exit_code, 1, "{}", result.combined_output());
    assert!(result.stderr.contains("no container runtime found"));
    assert!(result.stderr.contains("podman"));
    let entries: Vec<_> = std::fs::read_dir(env.work_dir.path()).unwrap().collect();
    assert!(entries.is_empty(), "work dir should stay empty: {entries:?}");
}

#[cfg(unix)]
#[test]
fn test_failed_checks_do_not_create_work_dir() {
    let env = TestEnv::new();
    env.stub_tool("git", 0);
    env.stub_tool("curl", 0);
    let fresh = env.home_dir.path().join("fresh/stack");

    let result = env.run(&[
        "--work-dir",
        fresh.to_str().unwrap(),
        "--project",
        "p1",
        "--instance",
        "i1",
        "--database",
        "d1",
    ]);

    assert_eq!(result.exit_code, 1, "{}", result.combined_output());
    assert!(!fresh.exists(), "{} should not exist", fresh.display());
}

#[cfg(unix)]
#[test]
fn test_shell_syntax_in_database_id_is_rejected() {
    let env = TestEnv::new().with_podman_stack();

    let result = env.run(&[
        "--project",
        "p1",
        "--instance",
        "i1",
        "--database",
        "$(touch owned)",
    ]);

    assert_eq!(result.exit_code, 1, "{}", result.combined_output());
    assert!(result.stderr.contains("invalid database ID"), "{}", result.stderr);
    assert!(!env.work_path(".env").exists());
}

#[cfg(unix)]
#[test]
fn test_missing_identifiers_without_terminal_fail() {
    let env = TestEnv::new().with_podman_stack();

    let result = env.run(&["--project", "p1"]);

    assert_eq!(result.exit_code, 1, "{}", result.combined_output());
    assert!(result.stderr.contains("instance"), "got:\n{}", result.stderr);
    assert!(!env.work_path("docker-compose.yaml").exists());
}

#[cfg(unix)]
#[test]
fn test_missing_key_file_is_fatal() {
    let env = TestEnv::new().with_podman_stack();

    let result = env.run(&[
        "--project",
        "p1",
        "--instance",
        "i1",
        "--database",
        "d1",
        "--service-account-key",
        "/nonexistent/key.json",
    ]);

    assert_eq!(result.exit_code, 1);
    assert!(result.stderr.contains("service account key file not found"));
}
