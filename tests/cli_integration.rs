//! CLI integration tests for Keel.
//!
//! These drive the `keel` binary against a temporary workspace. Tests that
//! spawn CMake use a stub shell script in its place.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the keel binary command.
fn keel() -> Command {
    Command::cargo_bin("keel").unwrap()
}

/// Create a temporary workspace holding `manifest` as its Keel.toml.
fn workspace(manifest: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Keel.toml"), manifest).unwrap();
    tmp
}

const TWO_PROJECTS: &str = r#"
[workspace]
name = "demo"

[projects.native.targets.linuxX64]

[projects.native.targets.arm64]
preset = "androidArm64"

[projects.tools.targets.host]
"#;

/// Write a stub `cmake` that appends "$(pwd) $*" to `log` and prints one
/// line per stream. With `--help` it prints a short help text instead.
#[cfg(unix)]
fn stub_cmake(dir: &Path, log: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("stub-cmake");
    let script = format!(
        r#"#!/bin/sh
echo "$(pwd) $*" >> "{log}"
if [ "$1" = "--help" ]; then
  echo "Usage"
  echo "  cmake [options] <path-to-source>"
  echo "Generators"
  echo "  Ninja = Generates build.ninja files."
  exit 0
fi
if [ "$1" = "--version" ]; then
  echo "cmake version 3.99.0-stub"
  exit 0
fi
echo "-- stub cmake $1"
echo "stub stderr" 1>&2
exit 0
"#,
        log = log.display()
    );
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

#[cfg(unix)]
fn stubbed_workspace(targets: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("cmake.log");
    let cmake = stub_cmake(tmp.path(), &log);
    let manifest = format!(
        "[workspace]\nname = \"demo\"\n\n[cmake]\nexecutable = \"{}\"\n\n{}",
        cmake.display(),
        targets
    );
    fs::write(tmp.path().join("Keel.toml"), manifest).unwrap();
    (tmp, log)
}

// ============================================================================
// keel targets / presets
// ============================================================================

#[test]
fn test_targets_lists_in_declaration_order() {
    let tmp = workspace(TWO_PROJECTS);

    let output = keel()
        .arg("targets")
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(names, ["native:linuxX64", "native:arm64", "tools:host"]);
    assert!(stdout.contains("androidArm64"));
}

#[test]
fn test_targets_from_nested_directory() {
    let tmp = workspace(TWO_PROJECTS);
    let nested = tmp.path().join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();

    keel()
        .arg("targets")
        .current_dir(&nested)
        .assert()
        .success()
        .stdout(predicate::str::contains("tools:host"));
}

#[test]
fn test_presets_lists_builtins() {
    let tmp = workspace(TWO_PROJECTS);

    keel()
        .arg("presets")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("androidArm64.clang"))
        .stdout(predicate::str::contains("linuxX64.zig"))
        .stdout(predicate::str::contains("host"));
}

#[test]
fn test_missing_manifest() {
    let tmp = TempDir::new().unwrap();

    keel()
        .arg("targets")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Keel.toml"))
        .stderr(predicate::str::contains("--manifest-path"));
}

#[test]
fn test_manifest_path_option() {
    let tmp = workspace(TWO_PROJECTS);
    let elsewhere = TempDir::new().unwrap();

    keel()
        .arg("targets")
        .arg("--manifest-path")
        .arg(tmp.path().join("Keel.toml"))
        .current_dir(elsewhere.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("native:arm64"));
}

#[test]
fn test_unknown_preset_suggests() {
    let tmp = workspace(
        r#"
[projects.native.targets.x]
preset = "linuxX46"
"#,
    );

    keel()
        .arg("targets")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown preset `linuxX46`"))
        .stderr(predicate::str::contains("linuxX64"));
}

// ============================================================================
// keel args
// ============================================================================

#[test]
fn test_args_prints_configure_command() {
    let tmp = workspace(TWO_PROJECTS);

    keel()
        .args(["args", "linuxX64"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("cmake "))
        .stdout(predicate::str::contains("-D CMAKE_SYSTEM_NAME=Linux"))
        .stdout(predicate::str::contains("build/cmake/native/linuxX64"));
}

#[test]
fn test_args_build_step() {
    let tmp = workspace(TWO_PROJECTS);

    keel()
        .args(["args", "native:arm64", "--build"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("--build"))
        .stdout(predicate::str::contains("build/cmake/native/arm64"));
}

#[test]
fn test_args_json() {
    let tmp = workspace(TWO_PROJECTS);

    let output = keel()
        .args(["args", "arm64", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["task"], "cmakeConfigureNativeArm64");
    assert_eq!(value["preset"], "androidArm64");
    assert_eq!(value["program"], "cmake");
    let args: Vec<&str> = value["args"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    let defines: Vec<&str> = args
        .windows(2)
        .filter(|pair| pair[0] == "-D")
        .map(|pair| pair[1])
        .collect();
    assert!(defines.contains(&"CMAKE_ANDROID_ARCH_ABI=arm64-v8a"));
    assert!(defines.contains(&"CMAKE_SYSTEM_NAME=Android"));
}

#[test]
fn test_args_property_from_command_line() {
    let tmp = workspace(TWO_PROJECTS);

    keel()
        .args(["args", "linuxX64", "-P", "linuxX64.sysRoot=/opt/sysroot"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("-D CMAKE_SYSROOT=/opt/sysroot"));
}

#[test]
fn test_args_invalid_property() {
    let tmp = workspace(TWO_PROJECTS);

    keel()
        .args(["args", "linuxX64", "-P", "novalue"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("novalue"));
}

#[test]
fn test_args_unknown_target() {
    let tmp = workspace(TWO_PROJECTS);

    keel()
        .args(["args", "linuxX46"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("linuxX46"))
        .stderr(predicate::str::contains("keel targets"));
}

// ============================================================================
// keel configure / build
// ============================================================================

#[cfg(unix)]
#[test]
fn test_configure_runs_stub() {
    let (tmp, log) = stubbed_workspace("[projects.native.targets.linuxX64]\n");

    keel()
        .arg("configure")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("-- stub cmake"))
        .stderr(predicate::str::contains("Configuring"));

    let recorded = fs::read_to_string(&log).unwrap();
    let line = recorded.lines().next().unwrap();
    assert!(line.contains("-S"));
    assert!(line.contains("-D CMAKE_SYSTEM_NAME=Linux"));
    assert!(line.contains("build/cmake/native/linuxX64"));
    // Runs inside the workspace working folder.
    assert!(line.starts_with(&tmp.path().join("build").join("cmake").display().to_string()));
}

#[cfg(unix)]
#[test]
fn test_configure_quiet() {
    let (tmp, log) = stubbed_workspace("[projects.native.targets.linuxX64]\n");

    keel()
        .args(["configure", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("-- stub cmake").not())
        .stderr(predicate::str::contains("Configuring").not())
        .stderr(predicate::str::contains("Finished").not());

    assert_eq!(fs::read_to_string(&log).unwrap().lines().count(), 1);
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    keel()
        .args(["targets", "--quiet", "--verbose"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[cfg(unix)]
#[test]
fn test_build_configures_then_builds_each_target() {
    let (tmp, log) = stubbed_workspace(
        "[projects.native.targets.linuxX64]\n\n[projects.native.targets.arm64]\npreset = \"androidArm64\"\n",
    );

    keel()
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Building"))
        .stderr(predicate::str::contains("Finished"));

    let recorded = fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = recorded.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("-S") && lines[0].contains("native/linuxX64"));
    assert!(lines[1].contains("--build") && lines[1].contains("native/linuxX64"));
    assert!(lines[2].contains("-S") && lines[2].contains("native/arm64"));
    assert!(lines[3].contains("--build") && lines[3].contains("native/arm64"));
}

#[cfg(unix)]
#[test]
fn test_configure_selected_target_only() {
    let (tmp, log) = stubbed_workspace(
        "[projects.native.targets.linuxX64]\n\n[projects.native.targets.arm64]\npreset = \"androidArm64\"\n",
    );

    keel()
        .args(["configure", "native:arm64"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let recorded = fs::read_to_string(&log).unwrap();
    assert_eq!(recorded.lines().count(), 1);
    assert!(recorded.contains("-D CMAKE_ANDROID_ARCH_ABI=arm64-v8a"));
}

#[cfg(unix)]
#[test]
fn test_configure_tool_failure() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let cmake = tmp.path().join("failing-cmake");
    fs::write(&cmake, "#!/bin/sh\necho \"CMake Error: nope\" 1>&2\nexit 1\n").unwrap();
    let mut perms = fs::metadata(&cmake).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&cmake, perms).unwrap();

    let manifest = format!(
        "[cmake]\nexecutable = \"{}\"\n\n[projects.native.targets.host]\n",
        cmake.display()
    );
    fs::write(tmp.path().join("Keel.toml"), manifest).unwrap();

    keel()
        .arg("configure")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("exited with code 1"))
        .stderr(predicate::str::contains("cmakeConfigureNativeHost"));
}

#[test]
fn test_configure_missing_cmake() {
    let tmp = workspace(
        r#"
[cmake]
executable = "/nonexistent/keel-test/cmake"

[projects.native.targets.host]
"#,
    );

    keel()
        .arg("configure")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to spawn"));
}

// ============================================================================
// keel version / help-cmake / generators
// ============================================================================

#[cfg(unix)]
#[test]
fn test_version_prints_tool_output() {
    let (tmp, _log) = stubbed_workspace("");

    keel()
        .arg("version")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cmake version 3.99.0-stub"));
}

#[cfg(unix)]
#[test]
fn test_generators_prints_section_only() {
    let (tmp, _log) = stubbed_workspace("");

    keel()
        .arg("generators")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Ninja"))
        .stdout(predicate::str::contains("Usage").not());
}

#[cfg(unix)]
#[test]
fn test_help_cmake_prints_everything() {
    let (tmp, _log) = stubbed_workspace("");

    keel()
        .arg("help-cmake")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("Ninja"));
}

// ============================================================================
// keel clean
// ============================================================================

#[test]
fn test_clean_removes_working_folder() {
    let tmp = workspace(TWO_PROJECTS);
    let working = tmp.path().join("build").join("cmake");
    fs::create_dir_all(working.join("native").join("linuxX64")).unwrap();

    keel()
        .arg("clean")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    assert!(!working.exists());
    assert!(tmp.path().join("Keel.toml").exists());
}

#[test]
fn test_clean_refuses_workspace_root() {
    let tmp = workspace(
        r#"
[cmake]
working-folder = "."

[projects.native.targets.host]
"#,
    );

    keel()
        .arg("clean")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to remove"));

    assert!(tmp.path().join("Keel.toml").exists());
}

// ============================================================================
// keel completions
// ============================================================================

#[test]
fn test_completions_bash() {
    keel()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_keel()"))
        .stdout(predicate::str::contains("configure"))
        .stdout(predicate::str::contains("help-cmake"));
}

#[test]
fn test_completions_into_directory() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("completions");

    keel()
        .args(["completions", "fish", "--dir"])
        .arg(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("keel.fish"));

    let script = fs::read_to_string(dir.join("keel.fish")).unwrap();
    assert!(script.contains("complete -c keel"));
}

#[test]
fn test_completions_help_shows_install_examples() {
    keel()
        .args(["completions", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keel completions bash >"));
}
