// tests/config.rs

use std::io::Write;

use minibuild::compose::{parallel, series, task};
use minibuild::config::{load_and_validate, load_or_default};
use minibuild::errors::BuildError;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn partial_file_keeps_defaults_for_everything_else() {
    let file = config_file(
        r#"
[paths]
dist = "build"

[env]
prefix = "MP_"

[graph]
build = "series(clean, parallel(style, markup))"
task_timeout_secs = 120
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.paths.dist, "build");
    assert_eq!(cfg.paths.src, "src");
    assert_eq!(cfg.env.prefix, "MP_");
    assert_eq!(cfg.env.appid_var, "APPID");
    assert_eq!(cfg.style.extension, "wxss");
    assert_eq!(cfg.graph.task_timeout_secs, Some(120));
    assert_eq!(
        cfg.build_graph,
        series([task("clean"), parallel([task("style"), task("markup")])])
    );
}

#[test]
fn static_section_is_read_from_its_reserved_name() {
    let file = config_file(
        r#"
[static]
files = ["src/**/*.svg"]
exclude = []
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.static_files.files, vec!["src/**/*.svg"]);
    assert!(cfg.static_files.exclude.is_empty());
}

#[test]
fn malformed_graph_returns_structured_error() {
    let file = config_file(
        r#"
[graph]
build = "series(clean, parallel(style"
"#,
    );

    match load_and_validate(file.path()) {
        Err(BuildError::GraphSyntax(msg)) => assert!(msg.contains("offset")),
        Err(e) => panic!("Expected GraphSyntax error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_task_in_graph_is_fatal() {
    let file = config_file(
        r#"
[graph]
build = "series(clean, lint)"
"#,
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, BuildError::TaskNotFound(ref m) if m.contains("lint")));
    assert!(err.is_fatal());
}

#[test]
fn dist_equal_to_src_is_rejected() {
    let file = config_file(
        r#"
[paths]
src = "app"
dist = "app"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(BuildError::ConfigError(_))
    ));
}

#[test]
fn toml_syntax_error_is_reported_as_such() {
    let file = config_file("[paths\nsrc = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(BuildError::TomlError(_))
    ));
}

#[test]
fn missing_default_file_falls_back_but_explicit_path_does_not() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Minibuild.toml");

    let cfg = load_or_default(&path, false).unwrap();
    assert_eq!(cfg.paths.dist, "dist");

    assert!(matches!(
        load_or_default(&path, true),
        Err(BuildError::IoError(_))
    ));
}
