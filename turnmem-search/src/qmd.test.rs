use super::*;

#[test]
fn rejects_traversal_in_project_name() {
    assert!(validate_project_name("../etc").is_err());
    assert!(validate_project_name("foo/bar").is_err());
    assert!(validate_project_name("foo bar").is_err());
}

#[test]
fn accepts_safe_project_names() {
    assert!(validate_project_name("my_project-1").is_ok());
}

#[test]
fn export_markdown_writes_one_file_per_observation() {
    let dir = tempfile::TempDir::new().unwrap();
    let obs = turnmem_store::Observation {
        id: 7,
        session_id: 1,
        prompt_number: 1,
        tool_name: "edit".to_string(),
        raw_input: None,
        compressed: "c".to_string(),
        obs_type: turnmem_store::ObsType::Bugfix,
        title: "Fixed Weird Bug!!".to_string(),
        narrative: "details here".to_string(),
        hmac: None,
        created_at: 100,
        hmac_valid: true,
    };
    export_markdown(dir.path(), "demo", std::slice::from_ref(&obs)).unwrap();
    let expected = dir.path().join("demo").join("7-fixed-weird-bug.md");
    assert!(expected.exists());
    let contents = std::fs::read_to_string(expected).unwrap();
    assert!(contents.contains("details here"));
}

#[test]
fn result_path_regex_extracts_ids() {
    let text = "rank 1: /42-fixed-login-bug.md\nrank 2: /7-other.md\n";
    let ids: Vec<i64> = RESULT_PATH
        .captures_iter(text)
        .filter_map(|c| c[1].parse().ok())
        .collect();
    assert_eq!(ids, vec![42, 7]);
}
