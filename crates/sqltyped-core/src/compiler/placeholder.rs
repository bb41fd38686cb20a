//! Token-level placeholder locator.
//!
//! The AST does not keep byte offsets for placeholders, so occurrences are
//! found by tokenizing the statement text. Comments and string literals come
//! out of the tokenizer as their own tokens and never yield occurrences.

use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, TokenWithSpan, Tokenizer};

use crate::dialect::SqlDialect;
use crate::error::CompileError;
use crate::source::LineIndex;

/// `sqlc.*` helper used to spell a named parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedForm {
    /// `:name`
    Colon,
    /// `@name`
    At,
    /// `sqlc.arg(name)`
    Arg,
    /// `sqlc.narg(name)`
    NullableArg,
    /// `sqlc.slice(name)`
    Slice,
}

impl NamedForm {
    pub(crate) fn from_helper(helper: &str) -> Option<Self> {
        match helper.to_lowercase().as_str() {
            "arg" => Some(NamedForm::Arg),
            "narg" => Some(NamedForm::NullableArg),
            "slice" => Some(NamedForm::Slice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// `$N` or `?N`
    Numbered(usize),
    /// bare `?`
    Positional,
    Named { name: String, form: NamedForm },
}

/// Row-limiting clause a placeholder is written directly into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSlot {
    Limit,
    Offset,
}

/// One placeholder as it appears in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Byte offset relative to the statement start
    pub location: usize,
    /// Exact source text of the placeholder
    pub text: String,
    pub kind: PlaceholderKind,
    /// Set for `LIMIT ?`, `OFFSET ?` and both operands of MySQL's `LIMIT ?, ?`
    pub slot: Option<LimitSlot>,
}

impl Occurrence {
    pub fn is_named(&self) -> bool {
        matches!(self.kind, PlaceholderKind::Named { .. })
    }
}

/// Find every placeholder in `text`, in source order
pub fn locate(text: &str, dialect: SqlDialect) -> Result<Vec<Occurrence>, CompileError> {
    let parser_dialect = dialect.parser_dialect();
    let tokens = Tokenizer::new(parser_dialect.as_ref(), text)
        .tokenize_with_location()
        .map_err(|e| CompileError::Parse(e.to_string()))?;

    let tokens: Vec<TokenWithSpan> = tokens
        .into_iter()
        .filter(|t| !matches!(t.token, Token::Whitespace(_) | Token::EOF))
        .collect();

    let index = LineIndex::new(text);
    let mut occurrences = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let (kind, consumed) = match &tokens[i].token {
            Token::Placeholder(p) => (numbered(p), 1),
            Token::Colon | Token::AtSign => match tokens.get(i + 1).map(|t| &t.token) {
                Some(Token::Word(w)) if adjacent(&tokens[i], &tokens[i + 1]) => {
                    let form = if tokens[i].token == Token::Colon {
                        NamedForm::Colon
                    } else {
                        NamedForm::At
                    };
                    (
                        Some(PlaceholderKind::Named {
                            name: w.value.clone(),
                            form,
                        }),
                        2,
                    )
                }
                _ => (None, 1),
            },
            // MySQL reads `@name` as a single word
            Token::Word(w)
                if w.quote_style.is_none()
                    && w.value.starts_with('@')
                    && !w.value.starts_with("@@")
                    && w.value.len() > 1 =>
            {
                (
                    Some(PlaceholderKind::Named {
                        name: w.value[1..].to_string(),
                        form: NamedForm::At,
                    }),
                    1,
                )
            }
            Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case("sqlc") => {
                match helper_call(&tokens[i..]) {
                    Some((name, form)) => (Some(PlaceholderKind::Named { name, form }), 6),
                    None => (None, 1),
                }
            }
            _ => (None, 1),
        };

        if let Some(kind) = kind {
            let first = &tokens[i];
            let last = &tokens[i + consumed - 1];
            let start = byte_offset(&index, first.span.start)?;
            let end = byte_offset(&index, last.span.end)?;
            occurrences.push(Occurrence {
                location: start,
                text: text[start..end].to_string(),
                kind,
                slot: limit_slot(&tokens, i, i + consumed),
            });
        }
        i += consumed;
    }

    Ok(occurrences)
}

fn numbered(placeholder: &str) -> Option<PlaceholderKind> {
    let digits = placeholder
        .strip_prefix('$')
        .or_else(|| placeholder.strip_prefix('?'))?;
    if digits.is_empty() {
        return (placeholder == "?").then_some(PlaceholderKind::Positional);
    }
    digits.parse().ok().map(PlaceholderKind::Numbered)
}

/// `sqlc . <helper> ( <name> )`
fn helper_call(tokens: &[TokenWithSpan]) -> Option<(String, NamedForm)> {
    let [_, dot, helper, open, arg, close, ..] = tokens else {
        return None;
    };
    if dot.token != Token::Period || open.token != Token::LParen || close.token != Token::RParen {
        return None;
    }
    let form = match &helper.token {
        Token::Word(w) => NamedForm::from_helper(&w.value)?,
        _ => return None,
    };
    let name = match &arg.token {
        Token::Word(w) => w.value.clone(),
        Token::SingleQuotedString(s) => s.clone(),
        _ => return None,
    };
    Some((name, form))
}

/// The LIMIT/OFFSET operand spanning `tokens[start..end]`, if it is one
fn limit_slot(tokens: &[TokenWithSpan], start: usize, end: usize) -> Option<LimitSlot> {
    let before = start.checked_sub(1).map(|i| &tokens[i].token);
    let after = tokens.get(end).map(|t| &t.token);
    match before? {
        Token::Word(w) if w.keyword == Keyword::LIMIT => match after {
            // MySQL `LIMIT offset, count`
            Some(Token::Comma) => Some(LimitSlot::Offset),
            _ => Some(LimitSlot::Limit),
        },
        Token::Word(w) if w.keyword == Keyword::OFFSET => Some(LimitSlot::Offset),
        Token::Comma => {
            let comma = start - 1;
            // the offset operand is a number or a placeholder of up to six tokens
            let limit = tokens[comma.saturating_sub(7)..comma]
                .iter()
                .rposition(|t| matches!(&t.token, Token::Word(w) if w.keyword == Keyword::LIMIT))?;
            let operand = &tokens[comma.saturating_sub(7) + limit + 1..comma];
            let mut depth = 0i32;
            for t in operand {
                match t.token {
                    Token::LParen => depth += 1,
                    Token::RParen if depth == 0 => return None,
                    Token::RParen => depth -= 1,
                    Token::Comma | Token::SemiColon => return None,
                    _ => {}
                }
            }
            (depth == 0 && !operand.is_empty()).then_some(LimitSlot::Limit)
        }
        _ => None,
    }
}

fn adjacent(a: &TokenWithSpan, b: &TokenWithSpan) -> bool {
    a.span.end == b.span.start
}

pub(super) fn byte_offset(
    index: &LineIndex<'_>,
    location: sqlparser::tokenizer::Location,
) -> Result<usize, CompileError> {
    index
        .offset(location.line as usize, location.column as usize)
        .ok_or_else(|| {
            CompileError::InvalidRewrite(format!(
                "token location {}:{} is outside the statement",
                location.line, location.column
            ))
        })
}
