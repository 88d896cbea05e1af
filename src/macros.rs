//! The macro pre-processor: a single forward scan that replaces `mcro`
//! blocks with their literal body wherever the macro name is later used.
//!
//! Macros are parameterless and textual — expansion is a straight
//! substitution, with no recursive expansion of macros inside macro
//! bodies (matching how `mcro`/`endmcro` blocks behave in practice: a
//! macro's content is captured once and replayed verbatim).

use crate::error::AssemblerError;
use crate::instructions;
use crate::lexer::{self, is_valid_macro_name};
use std::collections::HashMap;

const RESERVED_DIRECTIVES: &[&str] = &[".string", ".data", ".entry", ".extern"];

fn is_reserved(name: &str) -> bool {
    RESERVED_DIRECTIVES.contains(&name) || instructions::lookup(name).is_some()
}

enum State<'a> {
    Idle,
    Collecting {
        name: String,
        start_line: usize,
        body: Vec<&'a str>,
    },
}

/// Expand all macro definitions and invocations in `source`, returning the
/// expanded text. On error, every problem found during the scan is
/// returned; the caller discards all outputs for this file (per the
/// skip-all-outputs-on-macro-error rule).
pub fn expand(source: &str) -> Result<String, Vec<AssemblerError>> {
    let mut table: HashMap<String, Vec<&str>> = HashMap::new();
    let mut output: Vec<&str> = Vec::new();
    let mut errors: Vec<AssemblerError> = Vec::new();
    let mut state = State::Idle;

    for (i, line) in source.lines().enumerate() {
        let line_number = i + 1;
        match &mut state {
            State::Idle => {
                let tokens = lexer::tokenize(line);
                let first = tokens.first().map(|t| t.text);

                if first == Some("mcro") {
                    match tokens.get(1) {
                        None => {
                            errors.push(AssemblerError::MissingOperand {
                                mnemonic: "mcro".to_string(),
                                line_number,
                                line: line.to_string(),
                            });
                        }
                        Some(name_tok) => {
                            let name = name_tok.text;
                            if is_reserved(name) || !is_valid_macro_name(name) {
                                errors.push(AssemblerError::MacroNameIsReserved {
                                    name: name.to_string(),
                                    line_number,
                                });
                            } else if tokens.len() > 2 {
                                errors.push(AssemblerError::MacroExtraTokens {
                                    line_number,
                                    line: line.to_string(),
                                });
                            } else {
                                state = State::Collecting {
                                    name: name.to_string(),
                                    start_line: line_number,
                                    body: Vec::new(),
                                };
                            }
                        }
                    }
                } else if let Some(name) = first.filter(|n| table.contains_key(*n)) {
                    for body_line in &table[name] {
                        output.push(body_line);
                    }
                } else {
                    output.push(line);
                }
            }
            State::Collecting { name, body, .. } => {
                let tokens = lexer::tokenize(line);
                if tokens.first().map(|t| t.text) == Some("endmcro") {
                    if tokens.len() > 1 {
                        errors.push(AssemblerError::EndMacroExtraTokens {
                            line_number,
                            line: line.to_string(),
                        });
                    }
                    table.insert(name.clone(), std::mem::take(body));
                    state = State::Idle;
                } else {
                    body.push(line);
                }
            }
        }
    }

    if let State::Collecting { start_line, .. } = state {
        errors.push(AssemblerError::MissingOperand {
            mnemonic: "endmcro".to_string(),
            line_number: start_line,
            line: String::new(),
        });
    }

    if errors.is_empty() {
        let mut result = output.join("\n");
        if source.ends_with('\n') {
            result.push('\n');
        }
        Ok(result)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_a_macro_at_each_invocation() {
        let source = "mcro M\nmov @r1, @r2\nendmcro\nM\nstop\nM\n";
        let expanded = expand(source).unwrap();
        assert_eq!(expanded, "mov @r1, @r2\nstop\nmov @r1, @r2\n");
    }

    #[test]
    fn rejects_reserved_macro_names() {
        let source = "mcro mov\nstop\nendmcro\n";
        let errors = expand(source).unwrap_err();
        assert!(matches!(errors[0], AssemblerError::MacroNameIsReserved { .. }));
    }

    #[test]
    fn rejects_extra_tokens_after_macro_name() {
        let source = "mcro M extra\nstop\nendmcro\n";
        let errors = expand(source).unwrap_err();
        assert!(matches!(errors[0], AssemblerError::MacroExtraTokens { .. }));
    }

    #[test]
    fn rejects_extra_tokens_after_endmcro() {
        let source = "mcro M\nstop\nendmcro extra\n";
        let errors = expand(source).unwrap_err();
        assert!(matches!(errors[0], AssemblerError::EndMacroExtraTokens { .. }));
    }

    #[test]
    fn passes_through_lines_with_no_macro_involvement() {
        let source = "MAIN: mov @r1, @r2\nstop\n";
        assert_eq!(expand(source).unwrap(), source);
    }
}
