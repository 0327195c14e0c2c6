#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A throwaway data directory for one test
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_file(&self) -> PathBuf {
        self.dir.path().join("hogares_pwa_v1.json")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_state(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let raw = fs::read_to_string(self.state_file())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// `homekeep` pointed at this data directory, run from inside it
    pub fn cmd(&self) -> Command {
        let mut cmd = homekeep_cmd();
        cmd.env("HOMEKEEP_DIR", self.dir.path());
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run with `--json` and return the `data` payload of the envelope
    pub fn json_data(&self, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
        let output = self.cmd().arg("--json").args(args).output()?;
        if !output.status.success() {
            return Err(format!(
                "homekeep {args:?} failed: {}",
                String::from_utf8_lossy(&output.stdout)
            )
            .into());
        }
        let envelope: Value = serde_json::from_slice(&output.stdout)?;
        Ok(envelope["data"].clone())
    }
}

pub fn homekeep_cmd() -> Command {
    let mut cmd = Command::cargo_bin("homekeep").expect("binary");
    cmd.env_remove("HOMEKEEP_DIR");
    cmd.env_remove("HOMEKEEP_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}
