use std::path::{Path, PathBuf};
use std::process::Command;

pub trait GitTransport {
    fn clone_repository(&self, url: &str, destination: &Path) -> Result<(), String>;
}

/// Clones through the `git` executable shipped with the function's layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCliTransport {
    pub binary: PathBuf,
    pub depth: Option<u32>,
}

impl GitCliTransport {
    pub fn new(binary: impl Into<PathBuf>, depth: Option<u32>) -> Self {
        Self {
            binary: binary.into(),
            depth,
        }
    }

    fn clone_args(&self, url: &str, destination: &Path) -> Vec<String> {
        let mut args = vec!["clone".to_string(), "--quiet".to_string()];
        if let Some(depth) = self.depth {
            args.push("--depth".to_string());
            args.push(depth.to_string());
        }
        args.push("--".to_string());
        args.push(url.to_string());
        args.push(destination.display().to_string());
        args
    }
}

impl GitTransport for GitCliTransport {
    fn clone_repository(&self, url: &str, destination: &Path) -> Result<(), String> {
        let output = Command::new(&self.binary)
            .args(self.clone_args(url, destination))
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|error| {
                format!(
                    "failed to execute git binary '{}': {error}",
                    self.binary.display()
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "git clone exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        Ok(())
    }
}
