//! threadvm assembler: text ↔ program translation.
//!
//! # Syntax
//!
//! Mnemonics are case-insensitive and may use the canonical (`PUSH`) or
//! legacy (`DT_IMMI`) spelling. Tokens are separated by whitespace and/or
//! commas; `;` and `#` start comments. Each mnemonic takes exactly its
//! arity in operands, so a line may hold one instruction or a flat stream
//! such as `DT_IMMI,5,DT_IMMI,3,DT_ADD,DT_SEEK,DT_END`.
//!
//! ```text
//! start:  PUSH 0
//!         STORE_IMM 0, 1
//! loop:   LOAD 0        ; numeric targets are word offsets,
//!         JZ loop       ; labels name instructions
//!         PUSH 1.5      # floats are stored as their f32 bits
//! ```
//!
//! # Usage
//!
//! ```
//! use threadvm_assembler::{assemble, disassemble};
//!
//! let text = "PUSH 5\nPUSH 3\nADD\nSEEK\nEND\n";
//! let program = assemble(text).unwrap();
//! assert_eq!(program.len(), 5);
//! assert_eq!(disassemble(&program), text);
//! ```

pub mod error;

mod disassembler;
mod lexer;
mod parser;

use std::collections::HashMap;

pub use disassembler::disassemble;
pub use error::AsmError;

use lexer::tokenize_line;
use parser::{parse_line, resolve, Entry};
use threadvm_common::Program;

/// Assemble text into a program.
///
/// Returns the first error encountered.
pub fn assemble(text: &str) -> Result<Program, AsmError> {
    let mut statements = Vec::new();
    let mut labels = HashMap::new();

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let tokens = tokenize_line(line, line_num)?;
        for entry in parse_line(&tokens, line_num)? {
            match entry {
                Entry::Label(label) => {
                    if labels.contains_key(&label) {
                        return Err(AsmError::DuplicateLabel {
                            line: line_num,
                            label,
                        });
                    }
                    labels.insert(label, statements.len());
                }
                Entry::Statement(statement) => statements.push(statement),
            }
        }
    }

    resolve(statements, &labels)
}

/// Assemble text straight to image words.
pub fn assemble_words(text: &str) -> Result<Vec<u32>, AsmError> {
    assemble(text).map(|program| program.encode())
}
