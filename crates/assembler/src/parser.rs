//! Parser for threadvm assembly tokens, plus label and target resolution.

use std::collections::HashMap;

use crate::error::AsmError;
use crate::lexer::Token;
use threadvm_common::{Instruction, Opcode, Program};

/// An operand before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operand {
    /// A literal word. In a target slot this is an image word offset.
    Value(u32),
    /// A label reference. Only valid in target slots.
    Label(String),
}

/// One instruction line before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statement {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    pub line: usize,
}

/// One item of a line, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Entry {
    /// A label definition. It names the next statement.
    Label(String),
    Statement(Statement),
}

/// Parse one line's tokens as a stream of label definitions and
/// instructions.
///
/// Each mnemonic takes exactly `arity` operands; the token after them
/// starts the next instruction. A line may therefore hold a whole program
/// in the flat `DT_IMMI,5,DT_IMMI,3,DT_ADD` form.
pub(crate) fn parse_line(tokens: &[Token], line_num: usize) -> Result<Vec<Entry>, AsmError> {
    let mut entries = Vec::new();
    let mut rest = tokens;

    while let Some((head, tail)) = rest.split_first() {
        let mnemonic = match head {
            Token::Label(name) => {
                entries.push(Entry::Label(name.clone()));
                rest = tail;
                continue;
            }
            Token::Ident(s) => s.as_str(),
            Token::Number(n) => {
                return Err(AsmError::UnexpectedToken {
                    line: line_num,
                    token: n.to_string(),
                })
            }
        };

        let opcode = Opcode::from_mnemonic(mnemonic).map_err(|_| AsmError::UnknownOpcode {
            line: line_num,
            token: mnemonic.to_string(),
        })?;

        let arity = opcode.arity();
        let found = tail
            .iter()
            .take(arity)
            .take_while(|t| !matches!(t, Token::Label(_)))
            .count();
        if found < arity {
            return Err(AsmError::MissingOperand {
                line: line_num,
                opcode: opcode.mnemonic(),
                expected: arity,
                found,
            });
        }
        let (args, next) = tail.split_at(arity);

        let operands = args
            .iter()
            .enumerate()
            .map(|(slot, token)| operand(opcode, slot, token, line_num))
            .collect::<Result<Vec<_>, _>>()?;

        entries.push(Entry::Statement(Statement {
            opcode,
            operands,
            line: line_num,
        }));
        rest = next;
    }
    Ok(entries)
}

fn operand(opcode: Opcode, slot: usize, token: &Token, line_num: usize) -> Result<Operand, AsmError> {
    match token {
        Token::Number(n) => Ok(Operand::Value(*n)),
        Token::Ident(name) if opcode.target_slots().contains(&slot) => {
            Ok(Operand::Label(name.clone()))
        }
        Token::Ident(name) => Err(AsmError::InvalidNumber {
            line: line_num,
            token: name.clone(),
        }),
        Token::Label(_) => Err(AsmError::UnexpectedToken {
            line: line_num,
            token: token_text(token),
        }),
    }
}

fn token_text(token: &Token) -> String {
    match token {
        Token::Ident(s) => s.clone(),
        Token::Label(s) => format!("{s}:"),
        Token::Number(n) => n.to_string(),
    }
}

/// Turn statements into a program. Labels resolve to instruction indices;
/// numeric targets are word offsets and resolve to the instruction starting
/// there, or to [`Program::UNRESOLVED_TARGET`] if none does.
pub(crate) fn resolve(
    statements: Vec<Statement>,
    labels: &HashMap<String, usize>,
) -> Result<Program, AsmError> {
    let mut offsets = Vec::with_capacity(statements.len());
    let mut pos: u32 = 0;
    for s in &statements {
        offsets.push(pos);
        pos = pos.wrapping_add(1 + s.opcode.arity() as u32);
    }

    let mut instructions = Vec::with_capacity(statements.len());
    for s in statements {
        let mut values = Vec::with_capacity(s.operands.len());
        for (slot, op) in s.operands.into_iter().enumerate() {
            let is_target = s.opcode.target_slots().contains(&slot);
            let value = match op {
                Operand::Label(label) => {
                    let index = labels.get(&label).copied().ok_or(AsmError::UnknownLabel {
                        line: s.line,
                        label,
                    })?;
                    u32::try_from(index).unwrap_or(Program::UNRESOLVED_TARGET)
                }
                Operand::Value(offset) if is_target => offsets
                    .binary_search(&offset)
                    .ok()
                    .and_then(|i| u32::try_from(i).ok())
                    .unwrap_or(Program::UNRESOLVED_TARGET),
                Operand::Value(v) => v,
            };
            values.push(value);
        }
        instructions.push(Instruction::new(s.opcode, &values));
    }

    Ok(Program::new(instructions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize_line;

    fn parse(text: &str) -> Result<Vec<Entry>, AsmError> {
        let tokens = tokenize_line(text, 1)?;
        parse_line(&tokens, 1)
    }

    fn statements(text: &str) -> Vec<Statement> {
        parse(text)
            .unwrap()
            .into_iter()
            .filter_map(|e| match e {
                Entry::Statement(s) => Some(s),
                Entry::Label(_) => None,
            })
            .collect()
    }

    fn statement(text: &str) -> Statement {
        let mut all = statements(text);
        assert_eq!(all.len(), 1, "expected one statement in {text:?}");
        all.remove(0)
    }

    #[test]
    fn blank_line() {
        assert_eq!(parse("   ").unwrap(), vec![]);
    }

    #[test]
    fn label_only_line() {
        assert_eq!(
            parse("start: again:").unwrap(),
            vec![Entry::Label("start".to_string()), Entry::Label("again".to_string())]
        );
    }

    #[test]
    fn nullary() {
        let s = statement("add");
        assert_eq!(s.opcode, Opcode::Add);
        assert!(s.operands.is_empty());
    }

    #[test]
    fn legacy_mnemonic_with_operands() {
        let s = statement("DT_STO_IMMI 4, 9");
        assert_eq!(s.opcode, Opcode::StoreImm);
        assert_eq!(s.operands, vec![Operand::Value(4), Operand::Value(9)]);
    }

    #[test]
    fn label_in_target_slot() {
        let s = statement("CALL fn 2");
        assert_eq!(
            s.operands,
            vec![Operand::Label("fn".to_string()), Operand::Value(2)]
        );
    }

    #[test]
    fn label_outside_target_slot() {
        assert_eq!(
            parse("PUSH fn").unwrap_err(),
            AsmError::InvalidNumber {
                line: 1,
                token: "fn".to_string()
            }
        );
        assert!(parse("CALL 0 fn").is_err());
    }

    #[test]
    fn flat_stream_splits_on_arity() {
        let all = statements("DT_IMMI,5,DT_IMMI,3,DT_ADD,DT_SEEK,DT_END");
        let opcodes: Vec<Opcode> = all.iter().map(|s| s.opcode).collect();
        assert_eq!(
            opcodes,
            vec![Opcode::Push, Opcode::Push, Opcode::Add, Opcode::Seek, Opcode::End]
        );
        assert_eq!(all[1].operands, vec![Operand::Value(3)]);
    }

    #[test]
    fn flat_stream_keeps_labels_in_place() {
        assert_eq!(
            parse("PUSH 1, top: TICK, JMP top").unwrap(),
            vec![
                Entry::Statement(Statement {
                    opcode: Opcode::Push,
                    operands: vec![Operand::Value(1)],
                    line: 1,
                }),
                Entry::Label("top".to_string()),
                Entry::Statement(Statement {
                    opcode: Opcode::Tick,
                    operands: vec![],
                    line: 1,
                }),
                Entry::Statement(Statement {
                    opcode: Opcode::Jump,
                    operands: vec![Operand::Label("top".to_string())],
                    line: 1,
                }),
            ]
        );
    }

    #[test]
    fn missing_operand() {
        assert_eq!(
            parse("COPY 1").unwrap_err(),
            AsmError::MissingOperand {
                line: 1,
                opcode: "COPY",
                expected: 3,
                found: 1
            }
        );
    }

    #[test]
    fn label_definition_cuts_operands_short() {
        assert_eq!(
            parse("STORE_IMM 0 next: END").unwrap_err(),
            AsmError::MissingOperand {
                line: 1,
                opcode: "STORE_IMM",
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn too_many_operands() {
        assert_eq!(
            parse("DUP 3").unwrap_err(),
            AsmError::UnexpectedToken {
                line: 1,
                token: "3".to_string()
            }
        );
    }

    #[test]
    fn unknown_opcode() {
        assert_eq!(
            parse("FROB 1").unwrap_err(),
            AsmError::UnknownOpcode {
                line: 1,
                token: "FROB".to_string()
            }
        );
        assert!(matches!(
            parse("DT_ADD, DT_FROB"),
            Err(AsmError::UnknownOpcode { .. })
        ));
    }

    #[test]
    fn number_in_mnemonic_position() {
        assert!(matches!(
            parse("5 ADD"),
            Err(AsmError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn resolve_numeric_targets_as_offsets() {
        let program = resolve(statements("PUSH 1, JNZ 5, TICK, JMP 3"), &HashMap::new()).unwrap();
        assert_eq!(program.instructions[1], Instruction::unary(Opcode::JumpIfNonZero, 3));
        assert_eq!(program.instructions[3], Instruction::unary(Opcode::Jump, Program::UNRESOLVED_TARGET));
    }

    #[test]
    fn resolve_unknown_label() {
        assert_eq!(
            resolve(statements("JMP nowhere"), &HashMap::new()).unwrap_err(),
            AsmError::UnknownLabel {
                line: 1,
                label: "nowhere".to_string()
            }
        );
    }
}
