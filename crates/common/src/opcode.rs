//! Opcode definitions and the static arity table.
//!
//! Opcode words are dense (`0..OPCODE_COUNT`) and follow the numbering used
//! by existing program images, so the enum discriminant is the encoded word.

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// Number of defined opcodes. Every opcode word is below this value.
pub const OPCODE_COUNT: usize = 40;

/// Identifies the operation to perform.
///
/// Binary operators pop `a` first (the value pushed last) and then `b`.
/// Non-commutative operators compute `b op a`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Integer arithmetic
    /// Pop a, b; push `a + b` (wrapping).
    Add = 0,
    /// Pop a, b; push `b - a` (wrapping).
    Sub = 1,
    /// Pop a, b; push `a * b` (wrapping).
    Mul = 2,
    /// Pop a, b; push `b / a`. Division by zero is fatal.
    Div = 3,
    /// Pop a, b; push `b % a`. Modulo by zero is fatal.
    Mod = 4,
    /// Pop shift, value; push `value << shift`.
    Shl = 5,
    /// Pop shift, value; push `value >> shift` (logical).
    Shr = 6,

    // Floating point (words reinterpreted as f32 bits)
    /// Pop a, b; push `a + b`.
    FpAdd = 7,
    /// Pop a, b; push `b - a`.
    FpSub = 8,
    /// Pop a, b; push `a * b`.
    FpMul = 9,
    /// Pop a, b; push `b / a`. Division by `0.0` is fatal.
    FpDiv = 10,

    /// Push a copy of the top of stack.
    Dup = 11,
    /// Terminal instruction: reset memory and frames, stop.
    End = 12,

    // Memory
    /// `offset`: push the word stored at `offset`.
    Load = 13,
    /// `offset`: pop a word and store it at `offset`.
    Store = 14,
    /// `value`: push `value`.
    Push = 15,
    /// Pop x; push `x + 1` (wrapping).
    Inc = 16,
    /// Pop x; push `x - 1` (wrapping).
    Dec = 17,
    /// `offset value`: store `value` at `offset` without touching the stack.
    StoreImm = 18,
    /// `dest src len`: copy `len` bytes of memory.
    Copy = 19,
    /// `dest value len`: fill `len` bytes with the low byte of `value`.
    Fill = 20,

    // Control flow
    /// `target`: continue at `target`.
    Jump = 21,
    /// `target`: pop; continue at `target` if the value is zero.
    JumpIfZero = 22,
    /// `true_target false_target`: pop; always transfers control.
    Branch = 23,
    /// `target`: pop; continue at `target` if the value is nonzero.
    JumpIfNonZero = 24,

    // Comparison (push 1 or 0)
    /// `b > a`
    Gt = 25,
    /// `b < a`
    Lt = 26,
    /// `b == a`
    Eq = 27,
    /// `b >= a`
    Ge = 28,
    /// `b <= a`
    Le = 29,

    // Frames
    /// `target param_count`: move parameters into a new frame and jump.
    Call = 30,
    /// Return the top of the active frame to the caller.
    Return = 31,

    // Diagnostics and I/O
    /// Copy the top of stack into the debug register.
    Seek = 32,
    /// Print the top of stack as an unsigned integer.
    Print = 33,
    /// `offset`: read an integer line from input into memory.
    ReadInt = 34,
    /// Print the top of stack as a float.
    PrintFloat = 35,
    /// `offset`: read a float line from input into memory.
    ReadFloat = 36,
    /// Print the `tik` marker.
    Tick = 37,

    // System
    /// Reserved. Decodes, but has no execution semantics.
    Syscall = 38,
    /// Pop max; push a pseudo-random value in `[0, max)`.
    Random = 39,
}

/// All opcodes, indexed by their encoded word.
pub const ALL_OPCODES: [Opcode; OPCODE_COUNT] = [
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Shl,
    Opcode::Shr,
    Opcode::FpAdd,
    Opcode::FpSub,
    Opcode::FpMul,
    Opcode::FpDiv,
    Opcode::Dup,
    Opcode::End,
    Opcode::Load,
    Opcode::Store,
    Opcode::Push,
    Opcode::Inc,
    Opcode::Dec,
    Opcode::StoreImm,
    Opcode::Copy,
    Opcode::Fill,
    Opcode::Jump,
    Opcode::JumpIfZero,
    Opcode::Branch,
    Opcode::JumpIfNonZero,
    Opcode::Gt,
    Opcode::Lt,
    Opcode::Eq,
    Opcode::Ge,
    Opcode::Le,
    Opcode::Call,
    Opcode::Return,
    Opcode::Seek,
    Opcode::Print,
    Opcode::ReadInt,
    Opcode::PrintFloat,
    Opcode::ReadFloat,
    Opcode::Tick,
    Opcode::Syscall,
    Opcode::Random,
];

impl Opcode {
    /// Look up an opcode by its encoded word.
    pub fn from_word(word: u32) -> Option<Self> {
        ALL_OPCODES.get(word as usize).copied()
    }

    /// The encoded word for this opcode.
    pub fn word(self) -> u32 {
        self as u32
    }

    /// Number of immediate words that follow the opcode word.
    ///
    /// Fixed per opcode; never depends on run-time values.
    pub fn arity(self) -> usize {
        match self {
            Opcode::Load
            | Opcode::Store
            | Opcode::Push
            | Opcode::ReadInt
            | Opcode::ReadFloat
            | Opcode::Jump
            | Opcode::JumpIfZero
            | Opcode::JumpIfNonZero => 1,

            Opcode::StoreImm | Opcode::Call | Opcode::Branch => 2,

            Opcode::Copy | Opcode::Fill => 3,

            _ => 0,
        }
    }

    /// Immediate positions that hold control-flow targets.
    pub fn target_slots(self) -> &'static [usize] {
        match self {
            Opcode::Jump | Opcode::JumpIfZero | Opcode::JumpIfNonZero | Opcode::Call => &[0],
            Opcode::Branch => &[0, 1],
            _ => &[],
        }
    }

    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Shl => "SHL",
            Opcode::Shr => "SHR",
            Opcode::FpAdd => "FADD",
            Opcode::FpSub => "FSUB",
            Opcode::FpMul => "FMUL",
            Opcode::FpDiv => "FDIV",
            Opcode::Dup => "DUP",
            Opcode::End => "END",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Push => "PUSH",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::StoreImm => "STORE_IMM",
            Opcode::Copy => "COPY",
            Opcode::Fill => "FILL",
            Opcode::Jump => "JMP",
            Opcode::JumpIfZero => "JZ",
            Opcode::Branch => "BRANCH",
            Opcode::JumpIfNonZero => "JNZ",
            Opcode::Gt => "GT",
            Opcode::Lt => "LT",
            Opcode::Eq => "EQ",
            Opcode::Ge => "GE",
            Opcode::Le => "LE",
            Opcode::Call => "CALL",
            Opcode::Return => "RET",
            Opcode::Seek => "SEEK",
            Opcode::Print => "PRINT",
            Opcode::ReadInt => "READ_INT",
            Opcode::PrintFloat => "FPRINT",
            Opcode::ReadFloat => "READ_FLOAT",
            Opcode::Tick => "TICK",
            Opcode::Syscall => "SYSCALL",
            Opcode::Random => "RAND",
        }
    }

    /// The `DT_`-prefixed name used by older assembly sources.
    pub fn legacy_name(self) -> &'static str {
        match self {
            Opcode::Add => "DT_ADD",
            Opcode::Sub => "DT_SUB",
            Opcode::Mul => "DT_MUL",
            Opcode::Div => "DT_DIV",
            Opcode::Mod => "DT_MOD",
            Opcode::Shl => "DT_SHL",
            Opcode::Shr => "DT_SHR",
            Opcode::FpAdd => "DT_FP_ADD",
            Opcode::FpSub => "DT_FP_SUB",
            Opcode::FpMul => "DT_FP_MUL",
            Opcode::FpDiv => "DT_FP_DIV",
            Opcode::Dup => "DT_DUP",
            Opcode::End => "DT_END",
            Opcode::Load => "DT_LOD",
            Opcode::Store => "DT_STO",
            Opcode::Push => "DT_IMMI",
            Opcode::Inc => "DT_INC",
            Opcode::Dec => "DT_DEC",
            Opcode::StoreImm => "DT_STO_IMMI",
            Opcode::Copy => "DT_MEMCPY",
            Opcode::Fill => "DT_MEMSET",
            Opcode::Jump => "DT_JMP",
            Opcode::JumpIfZero => "DT_JZ",
            Opcode::Branch => "DT_IF_ELSE",
            Opcode::JumpIfNonZero => "DT_JUMP_IF",
            Opcode::Gt => "DT_GT",
            Opcode::Lt => "DT_LT",
            Opcode::Eq => "DT_EQ",
            Opcode::Ge => "DT_GT_EQ",
            Opcode::Le => "DT_LT_EQ",
            Opcode::Call => "DT_CALL",
            Opcode::Return => "DT_RET",
            Opcode::Seek => "DT_SEEK",
            Opcode::Print => "DT_PRINT",
            Opcode::ReadInt => "DT_READ_INT",
            Opcode::PrintFloat => "DT_FP_PRINT",
            Opcode::ReadFloat => "DT_FP_READ",
            Opcode::Tick => "DT_TIK",
            Opcode::Syscall => "DT_SYSCALL",
            Opcode::Random => "DT_RND",
        }
    }

    /// Resolve a mnemonic, case-insensitively. Accepts both the canonical
    /// and the legacy `DT_` spelling.
    pub fn from_mnemonic(text: &str) -> Result<Self, DecodeError> {
        let upper = text.to_ascii_uppercase();
        ALL_OPCODES
            .iter()
            .copied()
            .find(|op| op.mnemonic() == upper || op.legacy_name() == upper)
            .ok_or(DecodeError::UnknownMnemonic(text.to_string()))
    }
}

impl FromStr for Opcode {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::from_mnemonic(s)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
