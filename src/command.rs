//! Structured command lines for the Foundry binaries
//!
//! Commands are argv arrays, never shell strings: a function signature or URL is one
//! argument no matter what characters it contains, and array values become one argument
//! per element.

use std::fmt;
use std::path::PathBuf;

/// Flags whose values never appear in rendered command lines.
const SECRET_FLAGS: [&str; 2] = ["--private-key", "--mnemonic"];

/// A program plus its arguments, ready to hand to a [`CommandRunner`](crate::executor::CommandRunner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one positional argument.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append every element as its own positional argument.
    pub fn args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    /// Append `flag value` when the value is present and non-blank.
    pub fn opt<V: ToString>(mut self, flag: &str, value: Option<V>) -> Self {
        if let Some(value) = value.map(|v| v.to_string()) {
            if !value.trim().is_empty() {
                self.args.push(flag.to_string());
                self.args.push(value);
            }
        }
        self
    }

    /// Append `flag value` once per element.
    pub fn opt_each<I, S>(mut self, flag: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.args.push(flag.to_string());
            self.args.push(value.into());
        }
        self
    }

    /// Append a bare flag when `enabled` is true.
    pub fn flag(mut self, flag: &str, enabled: bool) -> Self {
        if enabled {
            self.args.push(flag.to_string());
        }
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Whether `flag` appears among the arguments.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// The value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Quoted rendering for logs, with secrets masked. Not used to execute anything.
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        let mut previous: Option<&str> = None;
        for arg in &self.args {
            if previous.is_some_and(|p| SECRET_FLAGS.contains(&p)) {
                write!(f, " <redacted>")?;
            } else if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || "\"'$`()|&;<>".contains(c)) {
                write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
            } else {
                write!(f, " {}", arg)?;
            }
            previous = Some(arg);
        }
        Ok(())
    }
}
