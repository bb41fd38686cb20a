//! Source text handling: statement splitting, offset bookkeeping, text edits
//! and comment stripping.

use crate::dialect::SqlDialect;
use crate::error::CompileError;
use crate::metadata::CommentSyntax;

/// A single text substitution against a statement's original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Byte offset relative to the statement start
    pub location: usize,
    pub old: String,
    pub new: String,
}

impl Edit {
    pub fn new(location: usize, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            location,
            old: old.into(),
            new: new.into(),
        }
    }

    fn end(&self) -> usize {
        self.location + self.old.len()
    }
}

/// Position of one statement inside a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawStatement {
    /// Byte offset of the first non-blank character
    pub location: usize,
    /// Length in bytes, excluding the terminating semicolon
    pub len: usize,
    /// Whether the statement ended with a semicolon
    pub terminated: bool,
}

impl RawStatement {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.location..self.location + self.len]
    }
}

/// Split SQL text into statements by semicolons, respecting string literals,
/// quoted identifiers, comments and dollar-quoted strings.
///
/// Chunks containing only comments and whitespace are dropped.
pub fn split_statements(sql: &str, dialect: SqlDialect) -> Vec<RawStatement> {
    let mysql = dialect == SqlDialect::MySQL;
    let mut statements = Vec::new();
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut start = 0;
    let mut first_code: Option<usize> = None;
    let mut i = 0;

    let mut push = |start: usize, end: usize, terminated: bool, first_code: Option<usize>| {
        if first_code.is_none() {
            return;
        }
        let chunk = &sql[start..end];
        let trimmed_start = chunk.len() - chunk.trim_start().len();
        let location = start + trimmed_start;
        statements.push(RawStatement {
            location,
            len: chunk.trim().len(),
            terminated,
        });
    };

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                first_code.get_or_insert(i);
                i += 1;
                while i < len {
                    if mysql && quote != b'`' && bytes[i] == b'\\' {
                        i += 2;
                        continue;
                    }
                    if bytes[i] == quote {
                        i += 1;
                        if i < len && bytes[i] == quote {
                            i += 1; // doubled quote
                        } else {
                            break;
                        }
                    } else {
                        i += 1;
                    }
                }
            }
            b'$' if !mysql => {
                first_code.get_or_insert(i);
                // Dollar-quoted string ($$...$$ or $tag$...$tag$)
                if let Some(tag_end) = find_dollar_tag_end(sql, i) {
                    let tag = &sql[i..=tag_end];
                    i = tag_end + 1;
                    if let Some(close_pos) = sql[i..].find(tag) {
                        i += close_pos + tag.len();
                    } else {
                        i = len;
                    }
                } else {
                    i += 1;
                }
            }
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'#' if mysql => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < len {
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        break;
                    }
                    i += 1;
                }
                i = (i + 2).min(len);
            }
            b';' => {
                push(start, i, true, first_code);
                first_code = None;
                start = i + 1;
                i += 1;
            }
            c => {
                if !c.is_ascii_whitespace() {
                    first_code.get_or_insert(i);
                }
                i += 1;
            }
        }
    }

    // Trailing statement without a semicolon
    push(start, len, false, first_code);

    statements
}

/// Find the end of a dollar-quote tag starting at position `start`.
/// Returns the index of the closing `$` if a valid tag is found.
fn find_dollar_tag_end(sql: &str, start: usize) -> Option<usize> {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut i = start + 1;
    if i < len && bytes[i] == b'$' {
        return Some(i);
    }
    // $1 is a placeholder, not a tag
    if i < len && bytes[i].is_ascii_digit() {
        return None;
    }
    while i < len && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    if i < len && bytes[i] == b'$' {
        Some(i)
    } else {
        None
    }
}

/// Extract a statement's text. An unterminated or empty statement is an error.
pub fn pluck<'a>(source: &'a str, raw: &RawStatement) -> Result<&'a str, CompileError> {
    if !raw.terminated || raw.len == 0 {
        return Err(CompileError::MissingTerminator);
    }
    Ok(raw.text(source))
}

/// Apply edits to `text`. Edits are keyed against the original text and must
/// not overlap; each edit's old text must match what is at its location.
pub fn mutate(text: &str, edits: &[Edit]) -> Result<String, CompileError> {
    let mut sorted: Vec<&Edit> = edits.iter().collect();
    sorted.sort_by(|a, b| b.location.cmp(&a.location));

    let mut out = text.to_string();
    let mut floor = text.len();
    for edit in sorted {
        if edit.end() > floor {
            return Err(CompileError::InvalidRewrite(format!(
                "edit at {} overlaps another edit",
                edit.location
            )));
        }
        match text.get(edit.location..edit.end()) {
            Some(found) if found == edit.old => {}
            _ => {
                return Err(CompileError::InvalidRewrite(format!(
                    "expected {:?} at offset {}",
                    edit.old, edit.location
                )))
            }
        }
        tracing::trace!(location = edit.location, old = %edit.old, new = %edit.new, "applying edit");
        out.replace_range(edit.location..edit.end(), &edit.new);
        floor = edit.location;
    }
    Ok(out)
}

/// Remove comment lines, returning the remaining SQL and the comment texts.
/// Directive lines are dropped entirely. A block comment spanning several
/// lines yields one comment per non-blank line.
pub fn strip_comments(sql: &str, syntax: CommentSyntax) -> (String, Vec<String>) {
    let mut lines = Vec::new();
    let mut comments = Vec::new();
    let mut in_block = false;

    for line in sql.trim().lines() {
        let t = line.trim_start();
        if in_block {
            match t.find("*/") {
                Some(end) => {
                    push_comment(&mut comments, &t[..end]);
                    let code = t[end + 2..].trim_start();
                    if !code.is_empty() {
                        lines.push(code);
                    }
                    in_block = false;
                }
                None => push_comment(&mut comments, t),
            }
            continue;
        }
        if syntax.is_directive(t) {
            continue;
        }
        if let Some(comment) = t.strip_prefix("--") {
            comments.push(comment.trim().to_string());
            continue;
        }
        if syntax.slash_star {
            if let Some(rest) = t.strip_prefix("/*") {
                let rest = rest.trim_end();
                match rest.find("*/") {
                    Some(end) if end + 2 == rest.len() => {
                        comments.push(rest[..end].trim().to_string());
                        continue;
                    }
                    Some(_) => {}
                    None => {
                        push_comment(&mut comments, rest);
                        in_block = true;
                        continue;
                    }
                }
            }
        }
        if syntax.hash {
            if let Some(comment) = t.strip_prefix('#') {
                comments.push(comment.trim().to_string());
                continue;
            }
        }
        lines.push(line);
    }

    (lines.join("\n"), comments)
}

fn push_comment(comments: &mut Vec<String>, text: &str) {
    let text = text.trim().trim_start_matches('*').trim();
    if !text.is_empty() {
        comments.push(text.to_string());
    }
}

/// Maps between byte offsets and 1-based line/column positions
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    /// Line and character column (both 1-based) of a byte offset
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = self.text[start..offset.min(self.text.len())].chars().count() + 1;
        (line + 1, column)
    }

    /// Byte offset of a 1-based line and character column
    pub fn offset(&self, line: usize, column: usize) -> Option<usize> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let rest = &self.text[start..];
        let col = column.checked_sub(1)?;
        rest.char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(rest.len()))
            .nth(col)
            .map(|i| start + i)
    }
}
