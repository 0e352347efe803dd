use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::runner::ScriptHost;

/// Whether the configured script host can be launched on this machine.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HostStatus {
    pub available: bool,
    pub path: Option<PathBuf>,
    pub reason: Option<String>,
}

/// Resolve the host executable the same way the OS would when spawning it.
pub fn detect(host: &ScriptHost) -> HostStatus {
    detect_in(host, std::env::var_os("PATH"))
}

fn detect_in(host: &ScriptHost, path_var: Option<OsString>) -> HostStatus {
    match find_executable(&host.program, path_var) {
        Some(path) => HostStatus {
            available: true,
            path: Some(path),
            reason: None,
        },
        None => {
            let reason = if cfg!(target_os = "windows") {
                format!("{} was not found on PATH", host.program)
            } else {
                format!(
                    "{} was not found; SolidWorks scripts can only run on Windows",
                    host.program
                )
            };
            log::warn!("{}", reason);
            HostStatus {
                available: false,
                path: None,
                reason: Some(reason),
            }
        }
    }
}

fn candidate_names(program: &str) -> Vec<String> {
    if cfg!(target_os = "windows") && Path::new(program).extension().is_none() {
        vec![
            format!("{}.exe", program),
            format!("{}.com", program),
            program.to_string(),
        ]
    } else {
        vec![program.to_string()]
    }
}

fn find_executable(program: &str, path_var: Option<OsString>) -> Option<PathBuf> {
    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        return as_path.is_file().then(|| as_path.to_path_buf());
    }

    let names = candidate_names(program);
    let path_var = path_var?;
    std::env::split_paths(&path_var).find_map(|dir| {
        names
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_found_on_path() {
        let dir = TempDir::new().unwrap();
        let exe_name = if cfg!(target_os = "windows") {
            "fakehost.exe"
        } else {
            "fakehost"
        };
        std::fs::write(dir.path().join(exe_name), "").unwrap();

        let path_var = std::env::join_paths([dir.path()]).unwrap();
        let status = detect_in(&ScriptHost::new("fakehost", vec![]), Some(path_var));
        assert!(status.available);
        assert_eq!(status.path, Some(dir.path().join(exe_name)));
        assert!(status.reason.is_none());
    }

    #[test]
    fn test_missing_reports_reason() {
        let dir = TempDir::new().unwrap();
        let path_var = std::env::join_paths([dir.path()]).unwrap();
        let status = detect_in(&ScriptHost::default(), Some(path_var));
        assert!(!status.available);
        assert!(status.reason.unwrap().contains("cscript"));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_missing_host_off_windows_mentions_windows() {
        let status = detect_in(&ScriptHost::default(), None);
        assert!(!status.available);
        assert!(status.reason.unwrap().contains("only run on Windows"));
    }

    #[test]
    fn test_explicit_path() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("host.bin");
        std::fs::write(&exe, "").unwrap();

        let status = detect_in(
            &ScriptHost::new(exe.to_string_lossy(), vec![]),
            None,
        );
        assert!(status.available);

        let status = detect_in(
            &ScriptHost::new(dir.path().join("gone.bin").to_string_lossy(), vec![]),
            None,
        );
        assert!(!status.available);
    }

    #[test]
    fn test_no_path_variable() {
        let status = detect_in(&ScriptHost::new("anything", vec![]), None);
        assert!(!status.available);
    }
}
