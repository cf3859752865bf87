//! threadvm common types and program image codec.
//!
//! This crate provides the data side of the threadvm bytecode:
//!
//! - [`Opcode`]: the 40 opcodes and their fixed arity table
//! - [`Instruction`]: an opcode plus its immediates
//! - [`Program`]: a decoded instruction sequence, with image encode/decode
//! - [`word`]: bit-exact word ↔ `f32` reinterpretation
//! - [`DecodeError`]: errors from decoding program images
//!
//! # Dependencies
//!
//! This crate uses `thiserror` (compile-time proc-macro, zero runtime cost)
//! and has no other dependencies.

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod word;

// Re-export commonly used types at the crate root.
pub use error::DecodeError;
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use program::Program;
pub use word::Word;
