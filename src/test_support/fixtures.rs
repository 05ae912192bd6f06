//! Stub executables and manifest templates.

use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_stub_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write stub");
    let mut perms = std::fs::metadata(&path)
        .expect("failed to stat stub")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("failed to chmod stub");
    path
}

/// A `cmake` stand-in that appends its working directory and arguments to
/// `log`, one invocation per line, and prints a line to each stream.
#[cfg(unix)]
pub fn write_stub_cmake(dir: &Path, log: &Path) -> PathBuf {
    let body = format!(
        r#"echo "$(pwd) $*" >> "{log}"
echo "-- stub cmake $1"
echo "stub stderr" 1>&2
exit 0"#,
        log = log.display()
    );
    write_stub_script(dir, "cmake", &body)
}

/// Common manifest templates.
pub mod manifests {
    /// One project with one target.
    pub fn single_target(project: &str, target: &str, preset: &str) -> String {
        format!(
            r#"[workspace]
name = "demo"

[projects.{project}.targets.{target}]
preset = "{preset}"
"#
        )
    }

    /// One project with one target, run through `executable`.
    pub fn with_executable(executable: &str, project: &str, target: &str) -> String {
        format!(
            r#"[workspace]
name = "demo"

[cmake]
executable = "{executable}"

[projects.{project}.targets.{target}]
"#
        )
    }
}
