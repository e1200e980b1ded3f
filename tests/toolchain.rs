//! Predictions checked against the installed GCC. Skipped without gcc/g++/bash.

mod common;

use common::{skip_if_missing, stderr, stdout, OracleCli};

#[test]
fn cpp_inline_links_one_copy_at_o0() {
    if skip_if_missing(&["bash", "g++"]) {
        return;
    }
    let cli = OracleCli::new();
    let output = cli.run(&[
        "check",
        "--prototype",
        "inline",
        "--definition",
        "inline",
        "--std",
        "gnu++11",
        "--opt",
        "O0",
    ]);
    let report = stdout(&output);
    assert!(output.status.success(), "{report}\n{}", stderr(&output));
    assert!(report.contains("stdout:\n    1\n    1\n"), "{report}");
    assert!(report.contains("result:    pass"));
}

#[test]
fn static_inline_keeps_each_units_body() {
    if skip_if_missing(&["bash", "gcc"]) {
        return;
    }
    let cli = OracleCli::new();
    let output = cli.run(&[
        "check",
        "--definition",
        "static inline",
        "--std",
        "c99",
        "--opt",
        "O1",
    ]);
    let report = stdout(&output);
    assert!(output.status.success(), "{report}\n{}", stderr(&output));
    assert!(report.contains("stdout:\n    1\n    2\n"), "{report}");
}

#[test]
fn missing_compiler_override_is_reported_by_name() {
    if skip_if_missing(&["bash"]) {
        return;
    }
    let cli = OracleCli::new();
    let config = cli.config_dir().join("broken.json");
    std::fs::write(
        &config,
        r#"{"schema_version": 1, "c_compiler": "no-such-cc-for-inline-oracle"}"#,
    )
    .expect("write config");
    let output = cli.run(&[
        "check",
        "--definition",
        "static",
        "--std",
        "gnu89",
        "--opt",
        "O0",
        "--config",
        config.to_str().expect("utf-8 path"),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no-such-cc-for-inline-oracle"));
}

#[test]
fn minimal_run_agrees_with_the_installed_gcc() {
    if skip_if_missing(&["bash", "gcc", "g++"]) {
        return;
    }
    let cli = OracleCli::new();
    let output = cli.run(&["run", "--minimal"]);
    let report = stdout(&output);
    assert!(output.status.success(), "{report}\n{}", stderr(&output));
    assert!(
        report.contains("232 cases passed (0 skipped, 232 executed)"),
        "{report}"
    );
    assert!(
        report.contains(
            "digest: 294a6f5743db7b8d57e257372490a30637da2ff5f1bbbc3576b3f2bf76138c6b"
        ),
        "{report}"
    );
}
