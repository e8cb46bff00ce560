//! Integration tests for dependency validation against fake executables.

#![cfg(unix)]

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use common::{Reply, ScriptedPrompt};
use kpxflow_settings::dependency::{self, DependencyBinding, Version};
use kpxflow_settings::error::{DependencyError, FlowError};
use tempfile::TempDir;

const PYTHON: DependencyBinding = dependency::PYTHON;

/// Writes an executable script that prints `output` and exits 0.
fn fake_tool(dir: &Path, name: &str, output: &str) -> PathBuf {
    fake_tool_to(dir, name, output, "")
}

/// Writes an executable script with separate stdout and stderr lines.
fn fake_tool_to(dir: &Path, name: &str, stdout: &str, stderr: &str) -> PathBuf {
    let path = dir.join(name);
    let mut script = String::from("#!/bin/sh\n");

    if !stdout.is_empty() {
        script.push_str(&format!("echo \"{stdout}\"\n"));
    }
    if !stderr.is_empty() {
        script.push_str(&format!("echo \"{stderr}\" >&2\n"));
    }

    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn accepts_a_version_at_the_minor_floor() {
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(dir.path(), "python3", "Python 3.6.1");

    let version = dependency::validate(&PYTHON, &tool).unwrap();
    assert_eq!(version, Version { major: 3, minor: 6 });
}

#[test]
fn rejects_a_minor_below_the_floor() {
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(dir.path(), "python3", "Python 3.5.9");

    let err = dependency::validate(&PYTHON, &tool).unwrap_err();
    assert!(matches!(err, DependencyError::VersionMismatch { .. }));
}

#[test]
fn rejects_a_major_mismatch() {
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(dir.path(), "python3", "Python 4.0.0");

    let err = dependency::validate(&PYTHON, &tool).unwrap_err();
    assert!(matches!(err, DependencyError::VersionMismatch { .. }));
}

#[test]
fn rejects_a_non_numeric_version() {
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(dir.path(), "python3", "Python three.six");

    let err = dependency::validate(&PYTHON, &tool).unwrap_err();
    assert!(matches!(err, DependencyError::InvalidVersion(_)));
}

#[test]
fn a_missing_path_is_not_found() {
    let err = dependency::validate(&PYTHON, Path::new("/no/such/python3")).unwrap_err();
    assert!(matches!(err, DependencyError::NotFound(_)));
}

#[test]
fn output_without_a_version_token_is_unparsable() {
    let dir = TempDir::new().unwrap();
    // A bare version with no tool name does not follow the probe protocol.
    let tool = fake_tool(dir.path(), "python3", "3.6.1");

    let err = dependency::validate(&PYTHON, &tool).unwrap_err();
    assert!(matches!(err, DependencyError::Unparsable(_)));
}

#[test]
fn falls_back_to_stderr_for_tools_that_report_there() {
    let dir = TempDir::new().unwrap();
    let tool = fake_tool_to(dir.path(), "python2ish", "", "Python 3.8.0");

    let version = dependency::validate(&PYTHON, &tool).unwrap();
    assert_eq!(version, Version { major: 3, minor: 8 });
}

#[test]
fn empty_candidate_uses_the_last_known_good_path() {
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(dir.path(), "python3", "Python 3.9.7");
    let prompt = ScriptedPrompt::default();

    let resolved =
        dependency::resolve(&PYTHON, "", tool.to_str().unwrap(), &prompt).unwrap();
    assert_eq!(resolved, tool);
}

#[test]
fn repair_loop_asks_until_a_valid_path_is_picked() {
    let dir = TempDir::new().unwrap();
    let broken = fake_tool(dir.path(), "old-python", "Python 2.7.18");
    let still_broken = fake_tool(dir.path(), "odd-python", "Python three.six");
    let good = fake_tool(dir.path(), "python3", "Python 3.10.2");

    let prompt = ScriptedPrompt::with_replies(vec![
        Reply::File(still_broken),
        Reply::File(good.clone()),
    ]);

    let resolved =
        dependency::resolve(&PYTHON, broken.to_str().unwrap(), "", &prompt).unwrap();
    assert_eq!(resolved, good);
}

#[test]
fn cancelling_the_repair_prompt_aborts_resolution() {
    let dir = TempDir::new().unwrap();
    let broken = fake_tool(dir.path(), "old-python", "Python 2.7.18");

    let prompt = ScriptedPrompt::with_replies(vec![Reply::Cancel]);

    let err = dependency::resolve(&PYTHON, broken.to_str().unwrap(), "", &prompt).unwrap_err();
    assert!(matches!(err, FlowError::Cancelled));
}
