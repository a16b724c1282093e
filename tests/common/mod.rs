use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

pub struct CliOutput {
    pub stdout: String,
    #[allow(dead_code)]
    pub stderr: String,
}

/// Runs the portal binary in script mode against an isolated home directory.
pub struct PortalHarness {
    home: TempDir,
}

impl PortalHarness {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("license_portal").expect("binary exists");
        cmd.env("LICENSE_PORTAL_HOME", self.home())
            .env("LICENSE_PORTAL_SCRIPT", "1")
            .env_remove("LICENSE_PORTAL_TEST_INPUTS");
        cmd
    }

    pub fn run_script(&self, script: &str) -> CliOutput {
        self.run_with_inputs(script, &[])
    }

    /// `inputs` answer wizard prompts in order.
    pub fn run_with_inputs(&self, script: &str, inputs: &[&str]) -> CliOutput {
        let mut cmd = self.command();
        if !inputs.is_empty() {
            cmd.env("LICENSE_PORTAL_TEST_INPUTS", inputs.join("|"));
        }
        let output = cmd
            .write_stdin(script.to_string())
            .output()
            .expect("run script CLI");
        if !output.status.success() {
            panic!(
                "script CLI failed: status={}\nstdout:\n{}\nstderr:\n{}",
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        CliOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}
