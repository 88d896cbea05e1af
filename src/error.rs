//! Errors produced while assembling a source file.

use crate::lexer::TokenSpan;
use colored::Colorize;
use std::fmt;

/// An error encountered while assembling a single source line or file.
#[derive(Debug, Clone)]
pub enum AssemblerError {
    /// A source line is longer than 80 characters.
    OverflowLine { line_number: usize, line: String },
    /// A label is longer than 31 characters.
    OverflowLabel { line_number: usize, line: String },
    /// An instruction or directive has fewer operands than it requires.
    MissingOperand {
        mnemonic: String,
        line_number: usize,
        line: String,
    },
    /// An instruction or directive has more operands than it accepts.
    TooManyOperands {
        mnemonic: String,
        line_number: usize,
        line: String,
        extra_spans: Vec<TokenSpan>,
    },
    /// An operand's syntax or addressing mode is invalid for its position.
    InvalidOperand {
        operand: String,
        operand_span: TokenSpan,
        line_number: usize,
        line: String,
    },
    /// An instruction mnemonic is not in the instruction table.
    UnknownInstruction {
        name: String,
        span: TokenSpan,
        line_number: usize,
        line: String,
    },
    /// A `.`-prefixed directive is not one of the four recognized ones.
    UnknownDirective {
        name: String,
        span: TokenSpan,
        line_number: usize,
        line: String,
    },
    /// An `@r`-prefixed token names a register outside 0-7.
    UnknownRegister {
        name: String,
        span: TokenSpan,
        line_number: usize,
        line: String,
    },
    /// A label was declared twice with different resolved values.
    SymbolAlreadyDefined { name: String, line_number: usize },
    /// A symbol was marked both `.entry` and `.extern`.
    EntryExternConflict { name: String, line_number: usize },
    /// A symbol marked `.entry` was never defined in this file.
    UndefinedEntry { name: String },
    /// A `.string` operand is missing its opening quote.
    MissingOpeningQuote { line_number: usize, line: String },
    /// A `.string` operand is missing its closing quote.
    MissingClosingQuote { line_number: usize, line: String },
    /// The operand list starts with a comma.
    CommaAtStart { line_number: usize, line: String },
    /// The operand list ends with a comma.
    CommaAtEnd { line_number: usize, line: String },
    /// Two operands are separated by more than one comma.
    ConsecutiveCommas { line_number: usize, line: String },
    /// A macro was named after a reserved word (instruction, directive or
    /// register).
    MacroNameIsReserved { name: String, line_number: usize },
    /// `mcro NAME` was followed by extra tokens.
    MacroExtraTokens { line_number: usize, line: String },
    /// `endmcro` was followed by extra tokens.
    EndMacroExtraTokens { line_number: usize, line: String },
    /// The code image ran out of room (more than 1024 words generated).
    MemoryAllocationFailed,
    /// A computed address fell outside the code image.
    MemoryAccessViolation { address: i64, line_number: usize },
    /// A source file could not be opened.
    FileOpen { path: String },
    /// No source file was given on the command line.
    NoSourceFile,
}

impl std::error::Error for AssemblerError {}

fn underline(line: &str, spans: &[&TokenSpan]) -> String {
    let mut marks = vec![' '; line.len()];
    for span in spans {
        for i in span.start()..span.end() {
            if i < marks.len() {
                marks[i] = '^';
            }
        }
    }
    marks.into_iter().collect()
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AssemblerError::*;

        let (message, line, line_number, spans): (String, Option<&str>, Option<usize>, Vec<&TokenSpan>) =
            match self {
                OverflowLine { line_number, line } => (
                    format!("line {} exceeds the maximum line length of 80 characters", line_number),
                    Some(line), Some(*line_number), vec![],
                ),
                OverflowLabel { line_number, line } => (
                    format!("label at line {} exceeds the maximum label length of 31 characters", line_number),
                    Some(line), Some(*line_number), vec![],
                ),
                MissingOperand { mnemonic, line_number, line } => (
                    format!("missing operand for \"{}\" at line {}", mnemonic, line_number),
                    Some(line), Some(*line_number), vec![],
                ),
                TooManyOperands { mnemonic, line_number, line, extra_spans } => (
                    format!("too many operands for \"{}\" at line {}", mnemonic, line_number),
                    Some(line), Some(*line_number), extra_spans.iter().collect(),
                ),
                InvalidOperand { operand, operand_span, line_number, line } => (
                    format!("invalid operand \"{}\" at line {}", operand, line_number),
                    Some(line), Some(*line_number), vec![operand_span],
                ),
                UnknownInstruction { name, span, line_number, line } => (
                    format!("unknown instruction \"{}\" at line {}", name, line_number),
                    Some(line), Some(*line_number), vec![span],
                ),
                UnknownDirective { name, span, line_number, line } => (
                    format!("unknown directive \"{}\" at line {}", name, line_number),
                    Some(line), Some(*line_number), vec![span],
                ),
                UnknownRegister { name, span, line_number, line } => (
                    format!("unknown register \"{}\" at line {}", name, line_number),
                    Some(line), Some(*line_number), vec![span],
                ),
                SymbolAlreadyDefined { name, line_number } => (
                    format!("symbol \"{}\" redefined at line {}", name, line_number),
                    None, None, vec![],
                ),
                EntryExternConflict { name, line_number } => (
                    format!("symbol \"{}\" at line {} is marked both .entry and .extern", name, line_number),
                    None, None, vec![],
                ),
                UndefinedEntry { name } => (
                    format!("symbol \"{}\" marked .entry was never defined", name),
                    None, None, vec![],
                ),
                MissingOpeningQuote { line_number, line } => (
                    format!("missing opening quote at line {}", line_number),
                    Some(line), Some(*line_number), vec![],
                ),
                MissingClosingQuote { line_number, line } => (
                    format!("missing closing quote at line {}", line_number),
                    Some(line), Some(*line_number), vec![],
                ),
                CommaAtStart { line_number, line } => (
                    format!("operand list starts with a comma at line {}", line_number),
                    Some(line), Some(*line_number), vec![],
                ),
                CommaAtEnd { line_number, line } => (
                    format!("operand list ends with a comma at line {}", line_number),
                    Some(line), Some(*line_number), vec![],
                ),
                ConsecutiveCommas { line_number, line } => (
                    format!("consecutive commas at line {}", line_number),
                    Some(line), Some(*line_number), vec![],
                ),
                MacroNameIsReserved { name, line_number } => (
                    format!("macro name \"{}\" at line {} is a reserved word", name, line_number),
                    None, None, vec![],
                ),
                MacroExtraTokens { line_number, line } => (
                    format!("extra tokens after macro name at line {}", line_number),
                    Some(line), Some(*line_number), vec![],
                ),
                EndMacroExtraTokens { line_number, line } => (
                    format!("extra tokens after \"endmcro\" at line {}", line_number),
                    Some(line), Some(*line_number), vec![],
                ),
                MemoryAllocationFailed => (
                    "code image exceeded its 1024-word capacity".to_string(),
                    None, None, vec![],
                ),
                MemoryAccessViolation { address, line_number } => (
                    format!("address {} at line {} falls outside the code image", address, line_number),
                    None, None, vec![],
                ),
                FileOpen { path } => (
                    format!("could not open file \"{}\"", path),
                    None, None, vec![],
                ),
                NoSourceFile => (
                    "no source file given".to_string(),
                    None, None, vec![],
                ),
            };

        writeln!(f, "{}", message)?;
        if let (Some(line), Some(line_number)) = (line, line_number) {
            write!(f, "{}\t{}", line_number, line)?;
            if !spans.is_empty() {
                writeln!(f)?;
                write!(f, "\t{}", underline(line, &spans).green())?;
            }
        }
        Ok(())
    }
}
