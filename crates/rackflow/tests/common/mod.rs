#![allow(deprecated)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Local rack `dev` rooted in a temporary directory
pub struct TestRack {
    pub root: TempDir,
}

impl TestRack {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    /// `rackflow` with the environment pointing at this rack only
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("rackflow").unwrap();
        cmd.env("RACK", "dev")
            .env("RACKFLOW_PROVIDER", "local")
            .env("RACKFLOW_STORAGE_ROOT", self.root.path())
            .env_remove("AWS_REGION")
            .env_remove("DEVELOPMENT")
            .env_remove("RACKFLOW_TEMPLATE_DIR")
            .env_remove("RACKFLOW_REGISTRY_HOST")
            .env_remove("RACKFLOW_ACCOUNT_ID")
            .env_remove("RACKFLOW_NETWORK_COMMAND");
        cmd
    }

    pub fn write_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }
}
