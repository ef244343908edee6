// typings-worker/src/install.rs
// Package installation through the npm executable
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;
use typings_common::{TypesRegistry, WorkerConfig};

use crate::exec::{quote_executable, CommandLine, CommandRunner};
use crate::log::FileLog;
use crate::registry::load_types_registry;

#[cfg(windows)]
const NPM_EXECUTABLE: &str = "npm.cmd";
#[cfg(not(windows))]
const NPM_EXECUTABLE: &str = "npm";

/// Owns everything an install needs: the npm location, the command runner,
/// the diagnostic log and the loaded types registry.
pub struct Installer {
    config: WorkerConfig,
    npm_path: String,
    registry: TypesRegistry,
    log: FileLog,
    runner: Box<dyn CommandRunner>,
}

impl Installer {
    /// Create an installer with an empty registry; setup fills it in later
    pub fn new(config: WorkerConfig, mut log: FileLog, runner: Box<dyn CommandRunner>) -> Self {
        let npm_path = resolve_npm_location(
            config.npm_location.as_deref(),
            config.validate_default_npm_location,
            std::env::var_os("PATH").as_deref(),
        );

        if log.is_enabled() {
            log.write_line(&format!("Process id: {}", std::process::id()));
            log.write_line(&format!(
                "NPM location: {} (explicit '--npmLocation' {}provided)",
                npm_path,
                if config.npm_location.is_none() { "not " } else { "" }
            ));
            log.write_line(&format!(
                "validateDefaultNpmLocation: {}",
                config.validate_default_npm_location
            ));
        }
        tracing::info!("Using npm at {}", npm_path);

        Self {
            config,
            npm_path,
            registry: TypesRegistry::new(),
            log,
            runner,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn npm_path(&self) -> &str {
        &self.npm_path
    }

    pub fn log(&mut self) -> &mut FileLog {
        &mut self.log
    }

    pub fn registry(&self) -> &TypesRegistry {
        &self.registry
    }

    /// Replace the in-memory registry with the index cached on disk
    pub fn load_registry(&mut self) {
        let path = self.config.types_registry_path();
        self.registry = load_types_registry(&path, &mut self.log);
        tracing::info!("Loaded {} types registry entries", self.registry.len());
    }

    /// Run an arbitrary command through the installer's runner; returns `failed`
    pub fn run(&mut self, command: &CommandLine, cwd: &Path) -> bool {
        self.runner.run(command, cwd, &mut self.log)
    }

    /// `npm install --ignore-scripts <packages> --save-dev --user-agent=...`
    pub fn install_command(&self, package_names: &[String]) -> CommandLine {
        CommandLine::new(self.npm_path.clone())
            .args(["install", "--ignore-scripts"])
            .args(package_names.iter().cloned())
            .args([
                "--save-dev".to_string(),
                format!("--user-agent=typesInstaller/{}", env!("CARGO_PKG_VERSION")),
            ])
    }

    /// Install all `package_names` in `cwd` with a single npm invocation and
    /// report whether it succeeded.
    pub fn install_worker<F>(
        &mut self,
        request_id: u64,
        package_names: &[String],
        cwd: &Path,
        on_complete: F,
    ) where
        F: FnOnce(bool),
    {
        if self.log.is_enabled() {
            let arguments =
                serde_json::to_string(package_names).unwrap_or_else(|_| format!("{:?}", package_names));
            self.log.write_line(&format!(
                "#{} with cwd: {} arguments: {}",
                request_id,
                cwd.display(),
                arguments
            ));
        }

        let start = Instant::now();
        let command = self.install_command(package_names);
        let failed = self.run(&command, cwd);
        let elapsed = start.elapsed();

        if self.log.is_enabled() {
            self.log.write_line(&format!(
                "npm install #{} took: {} ms",
                request_id,
                elapsed.as_millis()
            ));
        }
        tracing::info!(
            "Install #{} of {} package(s) {} in {:?}",
            request_id,
            package_names.len(),
            if failed { "failed" } else { "succeeded" },
            elapsed
        );

        on_complete(!failed);
    }
}

/// Pick the npm executable: the explicit location if given, otherwise `npm`
/// from `PATH` when validation is requested, otherwise a bare `npm`.
pub fn resolve_npm_location(
    explicit: Option<&str>,
    validate: bool,
    search_path: Option<&OsStr>,
) -> String {
    if let Some(explicit) = explicit {
        return quote_executable(explicit);
    }

    if validate {
        if let Some(found) = search_path.and_then(find_in_path) {
            return quote_executable(&found.to_string_lossy());
        }
    }

    NPM_EXECUTABLE.to_string()
}

fn find_in_path(search_path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .map(|dir| dir.join(NPM_EXECUTABLE))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Records every command and answers with a fixed outcome
    struct RecordingRunner {
        calls: Rc<RefCell<Vec<(CommandLine, PathBuf)>>>,
        fail: bool,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&mut self, command: &CommandLine, cwd: &Path, _log: &mut FileLog) -> bool {
            self.calls
                .borrow_mut()
                .push((command.clone(), cwd.to_path_buf()));
            self.fail
        }
    }

    fn installer(fail: bool) -> (Installer, Rc<RefCell<Vec<(CommandLine, PathBuf)>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = RecordingRunner {
            calls: calls.clone(),
            fail,
        };
        let mut config = WorkerConfig::with_cache("/cache");
        config.npm_location = Some("npm".to_string());
        let installer = Installer::new(config, FileLog::default(), Box::new(runner));
        (installer, calls)
    }

    #[test]
    fn test_install_worker_batches_packages() {
        let (mut installer, calls) = installer(false);
        let packages = vec!["@types/a".to_string(), "@types/b".to_string()];

        let mut outcome = None;
        installer.install_worker(1, &packages, Path::new("/proj"), |ok| outcome = Some(ok));

        assert_eq!(outcome, Some(true));
        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        let (command, cwd) = &calls[0];
        assert_eq!(cwd, Path::new("/proj"));
        assert_eq!(command.program(), "npm");
        assert_eq!(
            &command.arguments()[..4],
            ["install", "--ignore-scripts", "@types/a", "@types/b"]
        );
        assert!(command.arguments().contains(&"--save-dev".to_string()));
    }

    #[test]
    fn test_install_worker_reports_failure() {
        let (mut installer, calls) = installer(true);

        let mut outcome = None;
        installer.install_worker(
            2,
            &["@types/missing".to_string()],
            Path::new("/proj"),
            |ok| outcome = Some(ok),
        );

        assert_eq!(outcome, Some(false));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_install_worker_logs_request_and_duration() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("worker.log");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = RecordingRunner {
            calls,
            fail: false,
        };
        let mut installer = Installer::new(
            WorkerConfig::with_cache(temp_dir.path()),
            FileLog::new(Some(log_path.clone())),
            Box::new(runner),
        );

        installer.install_worker(9, &["@types/x".to_string()], temp_dir.path(), |_| {});

        let content = fs::read_to_string(&log_path).unwrap();
        assert!(content.contains(r#"#9 with cwd: "#));
        assert!(content.contains(r#"arguments: ["@types/x"]"#));
        assert!(content.contains("npm install #9 took: "));
    }

    #[test]
    fn test_resolve_explicit_npm_location_is_quoted() {
        let npm = resolve_npm_location(Some(r"C:\Program Files\nodejs\npm"), false, None);
        assert_eq!(npm, r#""C:\Program Files\nodejs\npm""#);
    }

    #[test]
    fn test_resolve_default_npm_location() {
        assert_eq!(resolve_npm_location(None, false, None), NPM_EXECUTABLE);
    }

    #[test]
    fn test_resolve_validated_npm_location_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let bin_dir = temp_dir.path().join("node bin");
        fs::create_dir_all(&bin_dir).unwrap();
        fs::write(bin_dir.join(NPM_EXECUTABLE), "").unwrap();

        let search_path = std::env::join_paths([bin_dir.clone()]).unwrap();
        let npm = resolve_npm_location(None, true, Some(&search_path));

        let expected = bin_dir.join(NPM_EXECUTABLE);
        assert_eq!(npm, format!("\"{}\"", expected.display()));
    }

    #[test]
    fn test_resolve_validated_npm_location_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let search_path = std::env::join_paths([temp_dir.path()]).unwrap();
        assert_eq!(
            resolve_npm_location(None, true, Some(&search_path)),
            NPM_EXECUTABLE
        );
    }
}
