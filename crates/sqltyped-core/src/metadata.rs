//! Query directive parsing.
//!
//! A directive is the comment line that names a query and declares how it is
//! executed:
//!
//! ```sql
//! -- name: ListUsers :many
//! -- name: CreateUser :exec [password, secret]
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CompileError;

/// Comment forms recognized as directive carriers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommentSyntax {
    /// `-- name: ...`
    pub dash: bool,
    /// `# name: ...`
    pub hash: bool,
    /// `/* name: ... */`
    pub slash_star: bool,
}

impl CommentSyntax {
    pub(crate) fn directive_prefixes(&self) -> Vec<&'static str> {
        let mut prefixes = Vec::new();
        if self.dash {
            prefixes.push("-- name:");
        }
        if self.hash {
            prefixes.push("# name:");
        }
        if self.slash_star {
            prefixes.push("/* name:");
        }
        prefixes
    }

    /// Whether a line is a directive in one of the recognized forms
    pub fn is_directive(&self, line: &str) -> bool {
        let line = line.trim_start();
        self.directive_prefixes()
            .iter()
            .any(|prefix| line.starts_with(prefix))
    }
}

/// How a query is executed and what it returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cmd {
    #[serde(rename = ":exec")]
    Exec,
    #[serde(rename = ":execresult")]
    ExecResult,
    #[serde(rename = ":execrows")]
    ExecRows,
    #[serde(rename = ":many")]
    Many,
    #[serde(rename = ":one")]
    One,
}

impl Cmd {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cmd::Exec => ":exec",
            Cmd::ExecResult => ":execresult",
            Cmd::ExecRows => ":execrows",
            Cmd::Many => ":many",
            Cmd::One => ":one",
        }
    }
}

impl FromStr for Cmd {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ":exec" => Ok(Cmd::Exec),
            ":execresult" => Ok(Cmd::ExecResult),
            ":execrows" => Ok(Cmd::ExecRows),
            ":many" => Ok(Cmd::Many),
            ":one" => Ok(Cmd::One),
            other => Err(CompileError::InvalidCommand(other.to_string())),
        }
    }
}

impl std::fmt::Display for Cmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub cmd: Cmd,
    pub omits: Vec<String>,
}

impl Directive {
    /// Render the directive as a dash comment line
    pub fn to_line(&self) -> String {
        let mut line = format!("-- name: {} {}", self.name, self.cmd);
        if !self.omits.is_empty() {
            line.push_str(&format!(" [{}]", self.omits.join(", ")));
        }
        line
    }
}

/// Find and parse the directive in a statement's text.
///
/// Returns `Ok(None)` when no line carries a directive.
pub fn parse(text: &str, syntax: CommentSyntax) -> Result<Option<Directive>, CompileError> {
    let prefixes = syntax.directive_prefixes();

    for raw in text.lines() {
        let line = raw.trim();
        if !prefixes.iter().any(|p| line.starts_with(p)) {
            continue;
        }

        let line = if line.starts_with("/*") {
            line.strip_suffix("*/").unwrap_or(line).trim_end()
        } else {
            line
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() == 2 {
            return Err(invalid(
                "missing query type [':one', ':many', ':exec', ':execrows', ':execresult']",
                line,
            ));
        }
        if parts.len() < 4 {
            return Err(invalid("invalid query comment", line));
        }

        // `[a, b]` splits into several tokens; the tail counts as one
        let omits = if parts.len() > 4 {
            parse_omits(&parts[4..].join(" ")).ok_or_else(|| invalid("invalid query comment", line))?
        } else {
            Vec::new()
        };

        let cmd: Cmd = parts[3].parse()?;
        let name = parts[2];
        if !is_identifier(name) {
            return Err(CompileError::InvalidIdentifier(name.to_string()));
        }

        return Ok(Some(Directive {
            name: name.to_string(),
            cmd,
            omits,
        }));
    }

    Ok(None)
}

fn invalid(reason: &str, line: &str) -> CompileError {
    CompileError::InvalidDirective {
        reason: reason.to_string(),
        line: line.to_string(),
    }
}

/// `[a, b]` -> `["a", "b"]`; anything not wrapped in brackets is rejected
fn parse_omits(tail: &str) -> Option<Vec<String>> {
    let inner = tail.strip_prefix('[')?.strip_suffix(']')?;
    if inner.contains('[') || inner.contains(']') {
        return None;
    }
    Some(
        inner
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
