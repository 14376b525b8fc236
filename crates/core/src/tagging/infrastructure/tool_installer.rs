use crate::process::domain::command_runner::{CommandRunner, CommandSpec};
use crate::shared::error::PipelineError;
use crate::tagging::domain::metadata_writer::MetadataWriter;

/// A package manager able to install the metadata writer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackageManager {
    pub program: &'static str,
    pub install_args: &'static [&'static str],
    pub package: &'static str,
    /// Whether installation normally needs root.
    pub privileged: bool,
}

/// Probed in order; the first one present is used.
pub const PACKAGE_MANAGERS: &[PackageManager] = &[
    PackageManager {
        program: "brew",
        install_args: &["install"],
        package: "exiftool",
        privileged: false,
    },
    PackageManager {
        program: "apt-get",
        install_args: &["install", "-y"],
        package: "libimage-exiftool-perl",
        privileged: true,
    },
    PackageManager {
        program: "dnf",
        install_args: &["install", "-y"],
        package: "perl-Image-ExifTool",
        privileged: true,
    },
    PackageManager {
        program: "pacman",
        install_args: &["-S", "--noconfirm"],
        package: "perl-image-exiftool",
        privileged: true,
    },
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InstallOutcome {
    AlreadyInstalled,
    Installed(&'static str),
}

/// Installs the metadata writer through the system package manager.
pub struct ToolInstaller {
    runner: Box<dyn CommandRunner>,
    managers: &'static [PackageManager],
}

impl ToolInstaller {
    pub fn new(runner: Box<dyn CommandRunner>) -> Self {
        Self {
            runner,
            managers: PACKAGE_MANAGERS,
        }
    }

    pub fn detect_manager(&self) -> Option<&'static PackageManager> {
        self.managers
            .iter()
            .find(|m| self.runner.is_available(m.program, "--version"))
    }

    pub fn install(&self, writer: &dyn MetadataWriter) -> Result<InstallOutcome, PipelineError> {
        if writer.is_available() {
            log::info!("{} is already installed", writer.name());
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let manager = self
            .detect_manager()
            .ok_or_else(|| PipelineError::EnvironmentMissing {
                what: "a supported package manager".to_string(),
                hint: format!("install {} manually", writer.name()),
            })?;

        let spec = self.install_command(manager);
        log::info!("Installing {} with {}", manager.package, manager.program);
        let output = self
            .runner
            .run(&spec)
            .map_err(|e| PipelineError::ExternalTool {
                tool: manager.program.to_string(),
                code: "none".to_string(),
                stderr: e.to_string(),
            })?;
        if !output.success() {
            return Err(PipelineError::ExternalTool {
                tool: manager.program.to_string(),
                code: output.code_label(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(InstallOutcome::Installed(manager.program))
    }

    fn install_command(&self, manager: &PackageManager) -> CommandSpec {
        let base = if manager.privileged && self.runner.is_available("sudo", "--version") {
            CommandSpec::new("sudo").arg(manager.program)
        } else {
            CommandSpec::new(manager.program)
        };
        base.args(manager.install_args.iter().copied())
            .arg(manager.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::domain::command_runner::{CommandError, CommandOutput};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    struct StubRunner {
        present: Vec<&'static str>,
        install_code: i32,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl StubRunner {
        fn with(present: &[&'static str]) -> Self {
            Self {
                present: present.to_vec(),
                install_code: 0,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl CommandRunner for StubRunner {
        fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
            let program = spec.program_name();
            if !self.present.iter().any(|p| *p == program) {
                return Err(CommandError::NotFound(program));
            }
            self.calls.lock().unwrap().push(spec.to_string());
            let is_version_check = spec.args.len() == 1 && spec.args[0] == "--version";
            Ok(CommandOutput {
                code: Some(if is_version_check { 0 } else { self.install_code }),
                stdout: String::new(),
                stderr: "E: unable to lock".to_string(),
            })
        }
    }

    struct StubWriter {
        available: bool,
    }

    impl MetadataWriter for StubWriter {
        fn name(&self) -> &str {
            "exiftool"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn write_people(&self, _: &Path, _: &[String]) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    #[test]
    fn test_skips_when_already_installed() {
        let runner = StubRunner::with(&["brew"]);
        let calls = runner.calls.clone();
        let installer = ToolInstaller::new(Box::new(runner));

        let outcome = installer.install(&StubWriter { available: true }).unwrap();
        assert_eq!(outcome, InstallOutcome::AlreadyInstalled);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_uses_brew_without_sudo() {
        let runner = StubRunner::with(&["brew", "sudo"]);
        let calls = runner.calls.clone();
        let installer = ToolInstaller::new(Box::new(runner));

        let outcome = installer.install(&StubWriter { available: false }).unwrap();
        assert_eq!(outcome, InstallOutcome::Installed("brew"));
        assert_eq!(calls.lock().unwrap().last().unwrap(), "brew install exiftool");
    }

    #[test]
    fn test_apt_uses_sudo_when_present() {
        let runner = StubRunner::with(&["apt-get", "sudo"]);
        let calls = runner.calls.clone();
        let installer = ToolInstaller::new(Box::new(runner));

        installer.install(&StubWriter { available: false }).unwrap();
        assert_eq!(
            calls.lock().unwrap().last().unwrap(),
            "sudo apt-get install -y libimage-exiftool-perl"
        );
    }

    #[test]
    fn test_apt_runs_directly_without_sudo() {
        let runner = StubRunner::with(&["apt-get"]);
        let calls = runner.calls.clone();
        let installer = ToolInstaller::new(Box::new(runner));

        installer.install(&StubWriter { available: false }).unwrap();
        assert_eq!(
            calls.lock().unwrap().last().unwrap(),
            "apt-get install -y libimage-exiftool-perl"
        );
    }

    #[test]
    fn test_no_package_manager_is_environment_missing() {
        let installer = ToolInstaller::new(Box::new(StubRunner::with(&[])));
        let result = installer.install(&StubWriter { available: false });
        assert!(matches!(result, Err(PipelineError::EnvironmentMissing { .. })));
    }

    #[test]
    fn test_failed_install_is_external_tool_error() {
        let mut runner = StubRunner::with(&["dnf"]);
        runner.install_code = 1;
        let installer = ToolInstaller::new(Box::new(runner));

        match installer.install(&StubWriter { available: false }) {
            Err(PipelineError::ExternalTool { tool, code, stderr }) => {
                assert_eq!(tool, "dnf");
                assert_eq!(code, "1");
                assert_eq!(stderr, "E: unable to lock");
            }
            other => panic!("expected ExternalTool, got {other:?}"),
        }
    }
}
