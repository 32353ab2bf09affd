//! Indirect credential values.
//!
//! A `[credentials]` entry either holds the token or points at it:
//!
//! ```toml
//! [credentials]
//! NOTION_API_KEY = "pass::work/notion-integration"
//! GMAIL_ACCESS_TOKEN = "env::WORK_GMAIL_TOKEN"
//! SERPER_API_KEY = "0123abcd"
//! ```
//!
//! Only the first line of the `pass` entry is used.

use std::fmt;
use std::process::Command;

/// Where a credential value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    /// The value is the token.
    Literal(&'a str),
    /// Entry in the `pass` password store.
    Pass(&'a str),
    /// Another environment variable.
    Env(&'a str),
}

impl<'a> SecretRef<'a> {
    pub fn parse(value: &'a str) -> Self {
        if let Some(entry) = value.strip_prefix("pass::") {
            Self::Pass(entry.trim())
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var.trim())
        } else {
            Self::Literal(value)
        }
    }

    /// True when the value does not contain the token itself and can be
    /// shown as is.
    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }

    /// Returns the token.
    pub fn resolve(&self) -> Result<String, String> {
        match *self {
            Self::Literal(token) => Ok(token.to_string()),
            Self::Pass(entry) => read_pass_entry(entry),
            Self::Env(var) => match std::env::var(var) {
                Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
                Ok(_) => Err(format!("{} is empty", self)),
                Err(_) => Err(format!("{} is not set", self)),
            },
        }
    }
}

impl fmt::Display for SecretRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(_) => write!(f, "inline token"),
            Self::Pass(entry) => write!(f, "pass entry `{}`", entry),
            Self::Env(var) => write!(f, "environment variable `{}`", var),
        }
    }
}

/// Resolves a `[credentials]` value.
pub fn resolve(value: &str) -> Result<String, String> {
    SecretRef::parse(value).resolve()
}

/// True when `value` points at the token instead of holding it.
pub fn is_reference(value: &str) -> bool {
    SecretRef::parse(value).is_reference()
}

fn read_pass_entry(entry: &str) -> Result<String, String> {
    if entry.is_empty() {
        return Err("pass:: needs an entry name".to_string());
    }
    let output = Command::new("pass")
        .args(["show", entry])
        .output()
        .map_err(|e| format!("cannot run pass for `{}`: {}", entry, e))?;
    if !output.status.success() {
        return Err(format!(
            "pass entry `{}` could not be read ({}): {}",
            entry,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    match stdout.lines().next().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(format!("pass entry `{}` has an empty first line", entry)),
    }
}
