#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// An isolated data directory plus helpers to drive the binary against it.
pub struct TestDesk {
    dir: TempDir,
}

impl TestDesk {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join("taskdesk.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// `taskdesk --data-dir <tmp>` with RUST_LOG cleared.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskdesk").expect("binary");
        cmd.env_remove("RUST_LOG")
            .env_remove("TASKDESK_DIR")
            .arg("--data-dir")
            .arg(self.dir.path());
        cmd
    }

    /// Run with `--json`, require success, return the envelope.
    pub fn json_ok(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    /// Run with `--json`, require exit `code`, return the envelope.
    pub fn json_err(&self, args: &[&str], code: i32) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .code(code)
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    pub fn login(&self, email: &str) {
        self.cmd().args(["login", email]).assert().success();
    }

    /// Id of the seeded user with `email`.
    pub fn user_id(&self, email: &str) -> String {
        let users = self.json_ok(&["users", "--search", email]);
        users["data"][0]["id"]
            .as_str()
            .expect("user id")
            .to_string()
    }
}
