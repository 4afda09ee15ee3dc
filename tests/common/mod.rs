//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory holding isolated system, user and project
/// directories, and runs the `fleetkit` binary against them.
pub struct TestProject {
    /// Temporary directory for the whole test setup
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        };
        project.create_dir("system");
        project.create_dir("user");
        project.create_dir("project");
        project
    }

    /// Root of the temporary setup
    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Directory used as `FLEETKIT_SYSTEM_DIR`
    pub fn system_dir(&self) -> PathBuf {
        self.dir.path().join("system")
    }

    /// Directory used as `FLEETKIT_CONFIG_DIR`
    pub fn user_dir(&self) -> PathBuf {
        self.dir.path().join("user")
    }

    /// Working directory of the binary
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("project")
    }

    /// Create a file relative to the setup root
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory relative to the setup root
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists relative to the setup root
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file relative to the setup root
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Install the sample `go` template (based on `common`) in the system directory
    pub fn install_sample_templates(&self) {
        self.create_file("system/templates/common/.template-info.yaml", COMMON_TEMPLATE_INFO);
        self.create_file("system/templates/common/README.md", "# {{ .app.title }}\n");
        self.create_file("system/templates/go/.template-info.yaml", GO_TEMPLATE_INFO);
        self.create_file(
            "system/templates/go/main.go",
            "package main\n\n// {{ .app.name }} {{ .app.version }}\nfunc main() {}\n",
        );
        self.create_file(
            "system/templates/go/{{ if .app.options.docs }}docs{{ end }}/index.md",
            "# {{ .app.title }} documentation\n",
        );
        self.create_file(
            "system/templates/go/Dockerfile.tmpl",
            "FROM {{ .build.default }}\nLABEL stage={{ .stage }}\n",
        );
    }

    /// Command for the `fleetkit` binary, isolated from the host configuration
    pub fn command(&self) -> Command {
        self.command_in(&self.path())
    }

    /// Same as [`TestProject::command`] with another working directory
    pub fn command_in(&self, cwd: &Path) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_fleetkit"));
        cmd.current_dir(cwd)
            .env("FLEETKIT_SYSTEM_DIR", self.system_dir())
            .env("FLEETKIT_CONFIG_DIR", self.user_dir())
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run `fleetkit` with arguments from the project directory
    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("Failed to execute fleetkit")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Stdout of a command as a string
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a command as a string
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Marker of the shared base template
pub const COMMON_TEMPLATE_INFO: &str = r"
name: common
description: Files shared by every application
";

/// Marker of the sample Go template
pub const GO_TEMPLATE_INFO: &str = r"
name: go
description: Go service
base: common
options:
  - name: docs
    description: Generate documentation skeleton
    type: boolean
    default: false
regenFiles:
  Dockerfile.tmpl: Dockerfile
";

/// Application settings accepted by `create`, as `-c` overrides
pub const APP_OVERRIDES: &str =
    "app.lang=go,app.title=Demo,app.name=demo,app.version=1.0.0,app.fqdn=demo.example.com";
