//! Whole-pipeline tests: source trees on disk through to the program root

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::process::Command;

use pretty_assertions::assert_eq;
use tarn::{assemble_program, compilation_order, SourceInput};
use tarn_core::ast::ConstructKind;
use tarn_core::config::BuildConfig;
use tarn_core::error::{BuildError, BuildErrorKind};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn assemble_dir(dir: &TempDir) -> Result<tarn_core::ast::Construct, BuildError> {
    assemble_program(
        SourceInput::Directory(dir.path().to_path_buf()),
        &BuildConfig::default(),
    )
}

fn position(order: &[&str], name: &str) -> usize {
    order
        .iter()
        .position(|n| *n == name)
        .unwrap_or_else(|| panic!("{name} missing from {order:?}"))
}

/// A, B imports A, C imports A and B
fn layered_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "A.tarn", "module A { val base: int = 1 }");
    write(
        dir.path(),
        "B.tarn",
        "import A\nmodule B { function next(): int = A.base + 1 }",
    );
    write(
        dir.path(),
        "nested/C.tarn",
        "import A\nimport B\nmodule C { function total(): int = A.base + B.next() }",
    );
    dir
}

#[test]
fn test_dependencies_precede_dependents() {
    let dir = layered_project();
    let root = assemble_dir(&dir).unwrap();

    assert_eq!(root.name, "__Program__");
    assert_eq!(root.kind, ConstructKind::Module);
    assert!(root.has_no_own_members());

    let order = compilation_order(&root);
    assert_eq!(order.len(), 3);
    assert!(position(&order, "A") < position(&order, "B"));
    assert!(position(&order, "A") < position(&order, "C"));
    assert!(position(&order, "B") < position(&order, "C"));

    // Nested children keep the bodies they were parsed with
    let c = &root.nested[position(&order, "C")];
    assert_eq!(c.functions[0].body, "A.base + B.next()");
}

#[test]
fn test_mutual_imports_are_cyclic() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "X.tarn", "import Y\nmodule X {}");
    write(dir.path(), "Y.tarn", "import X\nmodule Y {}");

    let err = assemble_dir(&dir).unwrap_err();
    assert_eq!(err.kind(), BuildErrorKind::CyclicDependency);
    match err {
        BuildError::CyclicDependency { cycle } => {
            assert!(cycle.contains(&"X".to_string()));
            assert!(cycle.contains(&"Y".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_import_is_malformed() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Z.tarn", "import W\nmodule Z {}");

    let err = assemble_dir(&dir).unwrap_err();
    assert_eq!(err.kind(), BuildErrorKind::MalformedGraph);
    match err {
        BuildError::UnresolvedImport { file, import } => {
            assert_eq!(file, "Z");
            assert_eq!(import, "W");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_file_name_must_match_declaration() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "foo.tarn", "module Bar {}");

    let err = assemble_dir(&dir).unwrap_err();
    match err {
        BuildError::NameMismatch { file, declared } => {
            assert_eq!(file, "foo");
            assert_eq!(declared, "Bar");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_single_file_input_checks_name() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "foo.tarn", "module Bar {}");

    let err = assemble_program(
        SourceInput::File(dir.path().join("foo.tarn")),
        &BuildConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), BuildErrorKind::NameMismatch);
}

#[test]
fn test_reassembly_yields_same_children() {
    let dir = layered_project();
    let first = assemble_dir(&dir).unwrap();
    let second = assemble_dir(&dir).unwrap();

    let names = |root: &tarn_core::ast::Construct| -> BTreeSet<String> {
        root.nested.iter().map(|c| c.name.clone()).collect()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(
        names(&first),
        ["A", "B", "C"].iter().map(|s| s.to_string()).collect()
    );
}

#[test]
fn test_parse_failure_aborts_build() {
    let dir = layered_project();
    write(dir.path(), "D.tarn", "import A\nmodule D { val = }");

    let err = assemble_dir(&dir).unwrap_err();
    assert_eq!(err.kind(), BuildErrorKind::Parse);
}

#[test]
fn test_reserved_root_name_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Main.tarn", "module Main {}");

    let mut config = BuildConfig::default();
    config.build.root_name = "Main".to_string();

    let err = assemble_program(SourceInput::Directory(dir.path().to_path_buf()), &config)
        .unwrap_err();
    assert_eq!(err.kind(), BuildErrorKind::ReservedName);
}

#[test]
fn test_config_file_beside_sources() {
    let dir = layered_project();
    write(
        dir.path(),
        "tarn.toml",
        "[build]\nroot_name = \"Program\"\nsurface = \"class\"\nparallel = false\n",
    );

    let input = SourceInput::Directory(dir.path().to_path_buf());
    let config = tarn::resolve_config(None, &input).unwrap();
    let root = assemble_program(input, &config).unwrap();

    assert_eq!(root.name, "Program");
    assert_eq!(root.kind, ConstructKind::Class);
    assert_eq!(root.nested.len(), 3);
}

#[test]
fn test_empty_directory_assembles_empty_root() {
    let dir = TempDir::new().unwrap();
    let root = assemble_dir(&dir).unwrap();
    assert!(root.nested.is_empty());
}

fn run_tarn(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tarn"))
        .args(args)
        .output()
        .expect("failed to run tarn")
}

#[test]
fn test_cli_summary_and_json() {
    let dir = layered_project();
    let path = dir.path().to_str().unwrap();

    let output = run_tarn(&["assemble", path]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("module __Program__"));
    assert_eq!(stdout.lines().count(), 4);

    let output = run_tarn(&["assemble", path, "--format", "json"]);
    assert!(output.status.success());
    let root: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(root["name"], "__Program__");
    assert_eq!(root["nested"].as_array().unwrap().len(), 3);
}

#[test]
fn test_cli_reports_cycle() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "X.tarn", "import Y\nmodule X {}");
    write(dir.path(), "Y.tarn", "import X\nmodule Y {}");

    let output = run_tarn(&["assemble", dir.path().to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Circular dependency"));
}

#[test]
fn test_cli_graph_prints_dot() {
    let dir = layered_project();
    let output = run_tarn(&["graph", dir.path().to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("digraph {"));
    assert_eq!(stdout.matches("->").count(), 3);
}
