//! The symbol table and external-reference log.
//!
//! Symbols are kept in insertion order (a `Vec` of names backed by a
//! `HashMap` index) because `.ent` output must list entries in the order
//! their `.entry` directives appeared, not hash order.

use crate::error::AssemblerError;
use std::collections::HashMap;

/// A single symbol: a label's resolved address plus its entry/extern
/// flags.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub value: i64,
    pub is_entry: bool,
    pub is_extern: bool,
}

/// The symbol table for one file being assembled.
#[derive(Debug, Default)]
pub struct SymbolTable {
    order: Vec<String>,
    index: HashMap<String, usize>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&i| &self.symbols[i])
    }

    /// Insertion order of symbol names, for `.ent`/`.ext` iteration.
    pub fn names_in_order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    fn slot(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            i
        } else {
            let i = self.symbols.len();
            self.symbols.push(Symbol {
                name: name.to_string(),
                value: 0,
                is_entry: false,
                is_extern: false,
            });
            self.order.push(name.to_string());
            self.index.insert(name.to_string(), i);
            i
        }
    }

    /// Define `name` at `value`. A symbol already defined with a nonzero
    /// value is a conflict; re-defining with the same placeholder (zero)
    /// value is allowed so declaration order between `.entry`/`.extern`
    /// and the label itself does not matter.
    pub fn define(&mut self, name: &str, value: i64, line_number: usize) -> Result<(), AssemblerError> {
        let i = self.slot(name);
        let sym = &mut self.symbols[i];
        if sym.value != 0 && sym.value != value {
            return Err(AssemblerError::SymbolAlreadyDefined {
                name: name.to_string(),
                line_number,
            });
        }
        sym.value = value;
        Ok(())
    }

    pub fn mark_entry(&mut self, name: &str, line_number: usize) -> Result<(), AssemblerError> {
        let i = self.slot(name);
        let sym = &mut self.symbols[i];
        if sym.is_extern {
            return Err(AssemblerError::EntryExternConflict {
                name: name.to_string(),
                line_number,
            });
        }
        sym.is_entry = true;
        Ok(())
    }

    pub fn mark_extern(&mut self, name: &str, line_number: usize) -> Result<(), AssemblerError> {
        let i = self.slot(name);
        let sym = &mut self.symbols[i];
        if sym.is_entry {
            return Err(AssemblerError::EntryExternConflict {
                name: name.to_string(),
                line_number,
            });
        }
        sym.is_extern = true;
        Ok(())
    }
}

/// One use of an external symbol in the code image, logged for `.ext`
/// output.
#[derive(Debug, Clone)]
pub struct ExternRef {
    pub name: String,
    pub address: u16,
}

/// An append-only, insertion-ordered log of external symbol uses, one
/// entry per use site (not per symbol).
#[derive(Debug, Default)]
pub struct ExternLog {
    refs: Vec<ExternRef>,
}

impl ExternLog {
    pub fn new() -> ExternLog {
        ExternLog::default()
    }

    pub fn push(&mut self, name: &str, address: u16) {
        self.refs.push(ExternRef {
            name: name.to_string(),
            address,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExternRef> {
        self.refs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}
