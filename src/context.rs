//! Per-file assembly state, threaded explicitly through both passes instead
//! of living in process-wide globals.

use crate::encoder::{CodeImage, BASE_ADDRESS};
use crate::error::AssemblerError;
use crate::symbols::{ExternLog, SymbolTable};

/// All mutable state accumulated while assembling one source file.
pub struct AssemblyContext {
    pub address: u16,
    pub line_number: usize,
    /// Set before the second pass begins. Suppresses re-recording of
    /// diagnostics the first pass already reported for the same line.
    pub end_first_pass: bool,
    pub symbols: SymbolTable,
    pub externs: ExternLog,
    pub image: CodeImage,
    pub errors: Vec<AssemblerError>,
    had_error: bool,
}

impl AssemblyContext {
    pub fn new() -> AssemblyContext {
        AssemblyContext {
            address: BASE_ADDRESS,
            line_number: 0,
            end_first_pass: false,
            symbols: SymbolTable::new(),
            externs: ExternLog::new(),
            image: CodeImage::new(),
            errors: Vec::new(),
            had_error: false,
        }
    }

    /// Record a diagnostic. During the second pass, checks that were
    /// already performed identically during the first pass are suppressed
    /// to avoid reporting the same line twice; the failure is still noted
    /// so outputs get withheld.
    pub fn report(&mut self, err: AssemblerError) {
        self.had_error = true;
        if !self.end_first_pass {
            self.errors.push(err);
        }
    }

    /// Record a diagnostic that can only be detected during the second
    /// pass (symbol resolution, `.entry` verification). Always surfaced,
    /// since the first pass never had a chance to report it.
    pub fn report_unconditional(&mut self, err: AssemblerError) {
        self.had_error = true;
        self.errors.push(err);
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Reset the location counter for the second pass, leaving the symbol
    /// table, extern log and code image untouched.
    pub fn begin_second_pass(&mut self) {
        self.address = BASE_ADDRESS;
        self.line_number = 0;
        self.end_first_pass = true;
    }

    /// Write one word at the current location counter and advance it. On
    /// the first pass this appends a new word to the image; on the second
    /// pass it overwrites the word already written at this address during
    /// the first pass. Returns the address the word was written to.
    pub fn emit(&mut self, word: u16) -> Result<u16, AssemblerError> {
        if self.end_first_pass {
            let address = self.address;
            self.image.set(address, word, self.line_number)?;
            self.address += 1;
            Ok(address)
        } else {
            let address = self.image.push(word)?;
            self.address = address + 1;
            Ok(address)
        }
    }
}

impl Default for AssemblyContext {
    fn default() -> AssemblyContext {
        AssemblyContext::new()
    }
}
