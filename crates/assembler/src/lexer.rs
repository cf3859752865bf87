//! Tokenizer for threadvm assembly text.

use crate::error::AsmError;

/// A single token from an assembly line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// A mnemonic or a label reference, case preserved.
    Ident(String),
    /// A label definition (`name:`), without the colon.
    Label(String),
    /// A numeric literal already reduced to its word value.
    Number(u32),
}

const FLOAT_WRAPPER: &str = "float_to_uint32(";

/// Tokenize a single line of assembly text.
///
/// Returns an empty Vec for blank lines and comment-only lines.
/// Comments start with `;` or `#` and extend to end of line. Tokens are
/// separated by whitespace and/or commas.
pub(crate) fn tokenize_line(line: &str, line_num: usize) -> Result<Vec<Token>, AsmError> {
    let line = match line.find([';', '#']) {
        Some(pos) => &line[..pos],
        None => line,
    };

    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|word| !word.is_empty())
        .map(|word| classify(word, line_num))
        .collect()
}

fn classify(word: &str, line_num: usize) -> Result<Token, AsmError> {
    if let Some(name) = word.strip_suffix(':') {
        if !is_identifier(name) {
            return Err(AsmError::UnexpectedToken {
                line: line_num,
                token: word.to_string(),
            });
        }
        return Ok(Token::Label(name.to_string()));
    }

    let looks_numeric = word
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if looks_numeric || strip_float_wrapper(word).is_some() {
        return parse_number(word).map(Token::Number).ok_or_else(|| AsmError::InvalidNumber {
            line: line_num,
            token: word.to_string(),
        });
    }

    if !is_identifier(word) {
        return Err(AsmError::UnexpectedToken {
            line: line_num,
            token: word.to_string(),
        });
    }
    Ok(Token::Ident(word.to_string()))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Reduce a literal to a word: unsigned or negative decimal, `0x` hex, or
/// an `f32` whose bits become the word.
pub(crate) fn parse_number(text: &str) -> Option<u32> {
    if let Some(inner) = strip_float_wrapper(text) {
        return parse_float(inner.strip_suffix(')')?);
    }

    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }

    if let Ok(value) = text.parse::<u32>() {
        return Some(value);
    }
    if text.starts_with('-') {
        if let Ok(value) = text.parse::<i32>() {
            return Some(value as u32);
        }
    }

    let is_float = text.contains(['.', 'e', 'E']) || text.ends_with(['f', 'F']);
    if is_float {
        return parse_float(text);
    }
    None
}

/// The text after a case-insensitive `float_to_uint32(` prefix.
fn strip_float_wrapper(text: &str) -> Option<&str> {
    let prefix = text.get(..FLOAT_WRAPPER.len())?;
    prefix
        .eq_ignore_ascii_case(FLOAT_WRAPPER)
        .then(|| &text[FLOAT_WRAPPER.len()..])
}

fn parse_float(text: &str) -> Option<u32> {
    let digits = text.strip_suffix(['f', 'F']).unwrap_or(text);
    digits.parse::<f32>().ok().map(f32::to_bits)
}
