//! Subprocess invocation for the MongoDB tools
//!
//! Tasks never touch `std::process` directly. They describe what to run as a
//! [`CommandLine`] and hand it to a [`CommandRunner`], which returns a
//! [`ProcessOutput`] with the exit code and the captured standard output
//! lines. Standard error is always discarded.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

/// Argument flags whose following value is a secret
const SECRET_FLAGS: &[&str] = &["-p", "--password"];

/// A program and its ordered argument vector
///
/// Arguments are kept as OS strings so paths reach the tool byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandLine {
    /// Create a command line with no arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a flag followed by its value
    pub fn flag(self, flag: &str, value: impl Into<OsString>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Program to execute
    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Arguments in order
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Value following `flag`, if the flag is present and the value is UTF-8
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .and_then(|a| a.to_str())
    }

    /// Whether `arg` appears anywhere in the argument list
    pub fn contains(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Render the command with every secret value replaced by `***`
    ///
    /// This is the form used in logs and error messages.
    pub fn redacted(&self) -> String {
        self.render(true)
    }

    fn render(&self, redact: bool) -> String {
        let mut out = quote(self.program.as_os_str());
        let mut hide_next = false;
        for arg in &self.args {
            out.push(' ');
            if hide_next {
                out.push_str("***");
            } else {
                out.push_str(&quote(arg));
            }
            hide_next = redact && SECRET_FLAGS.iter().any(|f| arg == *f);
        }
        out
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// Quote an argument for display when it would not survive a shell as-is
///
/// Bytes that are not valid UTF-8 are shown as replacement characters.
fn quote(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:,=@+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Result of running a command to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,

    /// Captured standard output, one entry per line
    pub stdout: Vec<String>,
}

impl ProcessOutput {
    /// Output of a process that exited with `code` and printed `lines`
    pub fn new(code: i32, lines: &[&str]) -> Self {
        Self {
            exit_code: Some(code),
            stdout: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// True when the process exited with status zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// First captured output line
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.first().map(String::as_str)
    }
}

/// Executes command lines synchronously
///
/// Implementations must discard the child's standard error and block until
/// it exits. An `Err` means the process could not be started at all.
pub trait CommandRunner {
    fn run(&self, command: &CommandLine) -> io::Result<ProcessOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &CommandLine) -> io::Result<ProcessOutput> {
        (**self).run(command)
    }
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandLine) -> io::Result<ProcessOutput> {
        debug!("Running: {}", command.redacted());

        let output = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();

        debug!("Exited with {:?}", output.status.code());

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CommandLine {
        CommandLine::new("mongoexport")
            .flag("-d", "mydb")
            .flag("-u", "admin")
            .flag("-p", "s3cret")
            .flag("-q", "{\"age\": {\"$gt\": 1}}")
    }

    #[test]
    fn test_display_quotes_special_arguments() {
        assert_eq!(
            sample().to_string(),
            "mongoexport -d mydb -u admin -p s3cret -q '{\"age\": {\"$gt\": 1}}'"
        );
    }

    #[test]
    fn test_redacted_hides_password() {
        let rendered = sample().redacted();
        assert!(rendered.contains("-p ***"));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("-u admin"));
    }

    #[test]
    fn test_quote_escapes_single_quotes() {
        assert_eq!(quote(OsStr::new("it's")), r"'it'\''s'");
        assert_eq!(quote(OsStr::new("")), "''");
        assert_eq!(quote(OsStr::new("a,b")), "a,b");
    }

    #[test]
    fn test_value_of_and_contains() {
        let cmd = sample();
        assert_eq!(cmd.value_of("-d"), Some("mydb"));
        assert_eq!(cmd.value_of("-f"), None);
        assert!(cmd.contains("-q"));
        assert!(!cmd.contains("--csv"));
    }

    #[test]
    fn test_process_output_success() {
        assert!(ProcessOutput::new(0, &[]).success());
        assert!(!ProcessOutput::new(2, &["x"]).success());
        let killed = ProcessOutput {
            exit_code: None,
            stdout: Vec::new(),
        };
        assert!(!killed.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_stdout_and_code() {
        let cmd = CommandLine::new("sh")
            .arg("-c")
            .arg("echo first; echo second; echo oops >&2; exit 3");
        let output = SystemRunner.run(&cmd).unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, vec!["first", "second"]);
    }

    #[test]
    fn test_system_runner_reports_spawn_failure() {
        let cmd = CommandLine::new("definitely-not-a-real-binary-mongotask");
        assert!(SystemRunner.run(&cmd).is_err());
    }
}
