//! Line-level tokenizing and classification.
//!
//! Splits a raw source line into an instruction/directive token and its
//! operand tokens, and recognizes operand shapes (register, immediate,
//! symbolic). Tokenization keeps a `"..."` payload as a single token so
//! `.string` directives survive splitting on commas and whitespace.

use regex::Regex;
use std::sync::OnceLock;

/// Maximum source line length, excluding the line terminator.
pub const MAX_LINE_LENGTH: usize = 80;

/// Maximum label length.
pub const MAX_LABEL_LENGTH: usize = 31;

/// Maximum macro name length.
pub const MAX_MACRO_NAME_LENGTH: usize = 20;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""[^"]*"|[^,\s]+"#).unwrap())
}

/// A byte-offset span of a token within its source line, used to underline
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    start: usize,
    end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> TokenSpan {
        TokenSpan { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

/// A single token together with the span it occupies in the source line.
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub text: &'a str,
    pub span: TokenSpan,
}

/// Split a line into whitespace/comma-separated tokens, keeping quoted
/// strings intact.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    token_regex()
        .find_iter(line)
        .map(|m| Token {
            text: m.as_str(),
            span: TokenSpan::new(m.start(), m.end()),
        })
        .collect()
}

/// How a line begins, before any directive/instruction-specific parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStart {
    Comment,
    Blank,
    /// First token is `name:` — a label prefix. The remainder of the line
    /// still needs to be classified.
    Label,
    Directive,
    Instruction,
}

/// Classify the first token of a raw (not yet macro-expanded) line.
pub fn classify_start(line: &str) -> LineStart {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineStart::Blank;
    }
    if trimmed.starts_with(';') {
        return LineStart::Comment;
    }

    let first = match tokenize(trimmed).first() {
        Some(tok) => tok.text,
        None => return LineStart::Blank,
    };

    if first.ends_with(':') && first.len() > 1 && is_letter(first.as_bytes()[0]) {
        LineStart::Label
    } else if first.starts_with('.') {
        LineStart::Directive
    } else {
        LineStart::Instruction
    }
}

fn is_letter(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

/// Is `name` a syntactically valid label (starts with a letter, fits within
/// [`MAX_LABEL_LENGTH`])?
pub fn is_valid_label(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_LABEL_LENGTH
        && is_letter(name.as_bytes()[0])
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Is `name` a syntactically valid macro name (fits within
/// [`MAX_MACRO_NAME_LENGTH`])?
pub fn is_valid_macro_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_MACRO_NAME_LENGTH
}

/// The classification of an operand token, per spec.md §4.1's operand
/// prefix rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandKind {
    /// `@r0`..`@r7`
    Register(u8),
    /// `+?-?[0-9]+`
    Immediate(i32),
    /// Anything else — a symbolic (direct) reference.
    Direct(String),
}

/// Classify an operand token by its prefix.
pub fn classify_operand(token: &str) -> OperandKind {
    if let Some(reg) = parse_register(token) {
        return OperandKind::Register(reg);
    }
    if let Ok(value) = token.parse::<i32>() {
        return OperandKind::Immediate(value);
    }
    OperandKind::Direct(token.to_string())
}

/// Parse a `@r0`..`@r7` register token, returning its number.
pub fn parse_register(token: &str) -> Option<u8> {
    let rest = token.strip_prefix("@r")?;
    if rest.len() != 1 {
        return None;
    }
    let digit = rest.as_bytes()[0];
    if (b'0'..=b'7').contains(&digit) {
        Some(digit - b'0')
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_quoted_strings_as_one_token() {
        let toks = tokenize(r#".string "hi, there""#);
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[1].text, r#""hi, there""#);
    }

    #[test]
    fn classifies_label_prefix() {
        assert_eq!(classify_start("MAIN: mov @r1, @r2"), LineStart::Label);
    }

    #[test]
    fn classifies_directive() {
        assert_eq!(classify_start(".data 1, 2, 3"), LineStart::Directive);
    }

    #[test]
    fn classifies_instruction() {
        assert_eq!(classify_start("  stop"), LineStart::Instruction);
    }

    #[test]
    fn classifies_comment_and_blank() {
        assert_eq!(classify_start("; a comment"), LineStart::Comment);
        assert_eq!(classify_start("   "), LineStart::Blank);
    }

    #[test]
    fn rejects_label_starting_with_digit() {
        assert_eq!(classify_start("1ABC: stop"), LineStart::Instruction);
    }

    #[test]
    fn recognizes_registers() {
        assert_eq!(parse_register("@r0"), Some(0));
        assert_eq!(parse_register("@r7"), Some(7));
        assert_eq!(parse_register("@r8"), None);
        assert_eq!(parse_register("r0"), None);
    }

    #[test]
    fn classifies_operand_kinds() {
        assert_eq!(classify_operand("@r3"), OperandKind::Register(3));
        assert_eq!(classify_operand("-7"), OperandKind::Immediate(-7));
        assert_eq!(classify_operand("+7"), OperandKind::Immediate(7));
        assert_eq!(
            classify_operand("LOOP"),
            OperandKind::Direct("LOOP".to_string())
        );
    }

    #[test]
    fn label_length_limits() {
        assert!(is_valid_label("A"));
        assert!(is_valid_label(&"A".repeat(31)));
        assert!(!is_valid_label(&"A".repeat(32)));
        assert!(!is_valid_label("3abc"));
    }
}
