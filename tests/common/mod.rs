//! Shared helpers for integration tests

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A stand-in for zabbix_sender that records its arguments and input file
pub struct FakeSender {
    pub dir: TempDir,
    pub binary: PathBuf,
}

impl FakeSender {
    /// Create a script exiting with `exit_code`
    pub fn new(exit_code: i32) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let binary = dir.path().join("zabbix_sender");
        let script = format!(
            "#!/bin/sh\n\
             printf '%s\\n' \"$@\" > '{dir}/args'\n\
             for arg in \"$@\"; do last=\"$arg\"; done\n\
             cp \"$last\" '{dir}/data'\n\
             echo 'processed: 1; failed: 0'\n\
             exit {exit_code}\n",
            dir = dir.path().display(),
            exit_code = exit_code,
        );
        fs::write(&binary, script).expect("Failed to write fake sender");
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod fake sender");

        Self { dir, binary }
    }

    /// Binary path as a string
    pub fn binary(&self) -> String {
        self.binary.display().to_string()
    }

    /// Whether the sender ran at all
    pub fn was_invoked(&self) -> bool {
        self.path("args").exists()
    }

    /// Arguments the sender received
    pub fn args(&self) -> Vec<String> {
        fs::read_to_string(self.path("args"))
            .expect("Sender was not invoked")
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Copy of the data file the sender received
    pub fn data_lines(&self) -> Vec<String> {
        fs::read_to_string(self.path("data"))
            .expect("Sender did not receive a data file")
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Path of the data file passed as the last argument
    pub fn data_file_arg(&self) -> PathBuf {
        PathBuf::from(self.args().last().expect("No sender arguments"))
    }

    fn path(&self, name: &str) -> PathBuf {
        Path::new(self.dir.path()).join(name)
    }
}
