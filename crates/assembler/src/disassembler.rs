//! Disassembler: program → canonical assembly text.
//!
//! One instruction per line, canonical mnemonics, decimal operands. Every
//! valid jump or call target gets an `L<index>:` label line and is
//! referenced by that label.

use std::collections::BTreeSet;
use std::fmt::Write;

use threadvm_common::Program;

/// Disassemble a program into canonical assembly text.
///
/// For programs whose targets are all valid,
/// `assemble(disassemble(program)) == program`.
pub fn disassemble(program: &Program) -> String {
    let len = program.len();
    let targets: BTreeSet<usize> = program
        .instructions
        .iter()
        .flat_map(|instr| {
            instr
                .opcode
                .target_slots()
                .iter()
                .map(move |&slot| instr.imm(slot) as usize)
        })
        .filter(|&t| t < len)
        .collect();

    let mut out = String::new();
    for (index, instr) in program.instructions.iter().enumerate() {
        if targets.contains(&index) {
            let _ = writeln!(out, "L{index}:");
        }
        out.push_str(instr.opcode.mnemonic());
        for (slot, &value) in instr.immediates().iter().enumerate() {
            let is_target = instr.opcode.target_slots().contains(&slot);
            if is_target && (value as usize) < len {
                let _ = write!(out, " L{value}");
            } else if is_target {
                let _ = write!(out, " {}", Program::UNRESOLVED_TARGET);
            } else {
                let _ = write!(out, " {value}");
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadvm_common::{Instruction, Opcode};

    #[test]
    fn empty_program() {
        assert_eq!(disassemble(&Program::default()), "");
    }

    #[test]
    fn plain_instructions() {
        let program = Program::new(vec![
            Instruction::unary(Opcode::Push, 5),
            Instruction::ternary(Opcode::Fill, 0, 255, 16),
            Instruction::nullary(Opcode::End),
        ]);
        assert_eq!(disassemble(&program), "PUSH 5\nFILL 0 255 16\nEND\n");
    }

    #[test]
    fn targets_become_labels() {
        let program = Program::new(vec![
            Instruction::unary(Opcode::Push, 0),
            Instruction::unary(Opcode::JumpIfZero, 3),
            Instruction::binary(Opcode::Call, 0, 1),
            Instruction::nullary(Opcode::Return),
        ]);
        assert_eq!(
            disassemble(&program),
            "L0:\nPUSH 0\nJZ L3\nCALL L0 1\nL3:\nRET\n"
        );
    }

    #[test]
    fn invalid_targets_stay_numeric() {
        let program = Program::new(vec![Instruction::binary(Opcode::Branch, 0, 7)]);
        assert_eq!(disassemble(&program), "L0:\nBRANCH L0 4294967295\n");
    }
}
