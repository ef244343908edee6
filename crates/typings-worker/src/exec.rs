// typings-worker/src/exec.rs
// Synchronous external command execution with output capture
use std::path::Path;
use std::process::{Command, Output};

use crate::log::{indent, FileLog};

/// An executable plus its arguments, rendered into a single shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// The exact line handed to the shell
    pub fn render(&self) -> String {
        let mut line = quote_executable(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&quote_arg(arg));
        }
        line
    }
}

/// Wrap an executable path containing a space in double quotes, unless it is
/// already quoted.
pub fn quote_executable(path: &str) -> String {
    if path.contains(' ') && !path.starts_with('"') {
        wrap_executable(path)
    } else {
        path.to_string()
    }
}

fn quote_arg(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@/._-=:~^+,%".contains(c));
    if safe {
        return arg.to_string();
    }

    wrap_escaped(arg)
}

/// Inside double quotes a backslash is literal unless it precedes one of
/// the characters the shell still treats specially.
#[cfg(not(windows))]
fn wrap_executable(path: &str) -> String {
    let chars: Vec<char> = path.chars().collect();
    let mut quoted = String::with_capacity(path.len() + 2);
    quoted.push('"');
    for (i, &c) in chars.iter().enumerate() {
        let escape = match c {
            '"' | '$' | '`' => true,
            '\\' => chars
                .get(i + 1)
                .map_or(true, |next| matches!(next, '"' | '$' | '`' | '\\')),
            _ => false,
        };
        if escape {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(windows)]
fn wrap_executable(path: &str) -> String {
    wrap_escaped(path)
}

fn wrap_escaped(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if let Some(escape) = escape_for(c) {
            quoted.push(escape);
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(not(windows))]
fn escape_for(c: char) -> Option<char> {
    matches!(c, '"' | '\\' | '$' | '`').then_some('\\')
}

#[cfg(windows)]
fn escape_for(c: char) -> Option<char> {
    (c == '"').then_some('"')
}

/// Runs external commands to completion.
///
/// Implementations never fail outward: every problem is logged and reported
/// as `true` ("failed").
pub trait CommandRunner {
    fn run(&mut self, command: &CommandLine, cwd: &Path, log: &mut FileLog) -> bool;
}

/// Runs commands through the platform shell, blocking until they exit
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &CommandLine, cwd: &Path, log: &mut FileLog) -> bool {
        let line = command.render();
        if log.is_enabled() {
            log.write_line(&format!("Exec: {}", line));
        }
        tracing::debug!(
            "Exec {} with {} argument(s) in {}",
            command.program(),
            command.arguments().len(),
            cwd.display()
        );

        match shell_command(&line).current_dir(cwd).output() {
            Ok(output) if output.status.success() => {
                if log.is_enabled() {
                    log.write_line(&format!(
                        "    Succeeded. stdout:{}",
                        indent(&String::from_utf8_lossy(&output.stdout))
                    ));
                }
                false
            }
            Ok(output) => {
                tracing::warn!("Command exited with {}: {}", output.status, line);
                log_failure(log, &output);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to spawn command {}: {}", line, e);
                if log.is_enabled() {
                    log.write_line(&format!(
                        "    Failed. stdout:\n    stderr:{}",
                        indent(&e.to_string())
                    ));
                }
                true
            }
        }
    }
}

fn log_failure(log: &mut FileLog, output: &Output) {
    if log.is_enabled() {
        log.write_line(&format!(
            "    Failed. stdout:{}\n    stderr:{}",
            indent(&String::from_utf8_lossy(&output.stdout)),
            indent(&String::from_utf8_lossy(&output.stderr))
        ));
    }
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    use std::os::windows::process::CommandExt;

    let mut command = Command::new("cmd");
    command.arg("/S").arg("/C").raw_arg(format!("\"{}\"", line));
    command
}
