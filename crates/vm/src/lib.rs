//! threadvm engine: executes decoded programs.
//!
//! The engine is a stack machine with:
//! - a flat little-endian byte memory (4 MiB by default)
//! - a stack of call frames, each with its own operand stack
//! - a write-only debug register, set by `SEEK`
//!
//! Instruction semantics live on [`Engine`]; the fetch/execute loop is
//! supplied by a [`DispatchStrategy`]. Three strategies are built in and
//! are interchangeable: [`SwitchDispatch`], [`JumpTableDispatch`] and
//! [`ThreadedDispatch`].
//!
//! # Usage
//!
//! ```
//! use threadvm_common::{Instruction, Opcode, Program};
//! use threadvm_vm::{run, ExitReason};
//!
//! let program = Program::new(vec![
//!     Instruction::unary(Opcode::Push, 5),
//!     Instruction::unary(Opcode::Push, 3),
//!     Instruction::nullary(Opcode::Add),
//!     Instruction::nullary(Opcode::Seek),
//!     Instruction::nullary(Opcode::End),
//! ]);
//!
//! let result = run(&program).unwrap();
//! assert_eq!(result.debug_register, 8);
//! assert_eq!(result.exit, ExitReason::Terminal);
//! ```

pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod execute;
pub mod frame;
pub mod machine;
pub mod memory;
pub mod rng;

pub use config::EngineConfig;
pub use console::Console;
pub use dispatch::{
    Dispatch, DispatchStrategy, JumpTableDispatch, SwitchDispatch, ThreadedDispatch,
};
pub use error::{ErrorKind, RuntimeError};
pub use machine::{Engine, ExitReason, Flow, RunResult, DEBUG_REGISTER_SENTINEL};

use threadvm_common::Program;

/// Execute a program with default limits and match-based dispatch.
///
/// I/O opcodes use the process's stdin and stdout.
///
/// # Errors
///
/// Returns [`RuntimeError`] on the first fatal condition (division by
/// zero, out-of-bounds memory access, invalid target, etc.).
pub fn run(program: &Program) -> Result<RunResult, RuntimeError> {
    Engine::new(program).run(&SwitchDispatch)
}

/// Execute a program with the chosen strategy and limits.
pub fn run_with(
    program: &Program,
    dispatch: Dispatch,
    config: EngineConfig,
) -> Result<RunResult, RuntimeError> {
    Engine::with_config(program, config).run(dispatch.strategy())
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use threadvm_common::{Instruction, Opcode};

    fn run_binary(opcode: Opcode, b: u32, a: u32) -> Result<Vec<u32>, RuntimeError> {
        let program = Program::new(vec![
            Instruction::unary(Opcode::Push, b),
            Instruction::unary(Opcode::Push, a),
            Instruction::nullary(opcode),
        ]);
        let mut engine = Engine::with_config(&program, EngineConfig::default().with_memory_size(4));
        engine.run(&SwitchDispatch)?;
        Ok(engine.stack().to_vec())
    }

    proptest! {
        #[test]
        fn add_sub_mul_wrap(b in any::<u32>(), a in any::<u32>()) {
            prop_assert_eq!(run_binary(Opcode::Add, b, a).unwrap(), vec![b.wrapping_add(a)]);
            prop_assert_eq!(run_binary(Opcode::Sub, b, a).unwrap(), vec![b.wrapping_sub(a)]);
            prop_assert_eq!(run_binary(Opcode::Mul, b, a).unwrap(), vec![b.wrapping_mul(a)]);
        }

        #[test]
        fn div_and_mod_match_unsigned(b in any::<u32>(), a in any::<u32>()) {
            let div = run_binary(Opcode::Div, b, a);
            let rem = run_binary(Opcode::Mod, b, a);
            if a == 0 {
                prop_assert_eq!(div, Err(RuntimeError::DivisionByZero { at: 2 }));
                prop_assert_eq!(rem, Err(RuntimeError::DivisionByZero { at: 2 }));
            } else {
                prop_assert_eq!(div.unwrap(), vec![b / a]);
                prop_assert_eq!(rem.unwrap(), vec![b % a]);
            }
        }

        #[test]
        fn comparisons_push_bool(b in any::<u32>(), a in any::<u32>()) {
            prop_assert_eq!(run_binary(Opcode::Gt, b, a).unwrap(), vec![u32::from(b > a)]);
            prop_assert_eq!(run_binary(Opcode::Le, b, a).unwrap(), vec![u32::from(b <= a)]);
        }

        #[test]
        fn seek_and_print_leave_stack_alone(values in proptest::collection::vec(any::<u32>(), 1..16)) {
            let mut instrs: Vec<Instruction> =
                values.iter().map(|&v| Instruction::unary(Opcode::Push, v)).collect();
            instrs.push(Instruction::nullary(Opcode::Seek));
            instrs.push(Instruction::nullary(Opcode::Print));
            let program = Program::new(instrs);
            let mut engine = Engine::with_config(&program, EngineConfig::default().with_memory_size(4))
                .with_console(Console::captured(Vec::<String>::new()));
            let result = engine.run(&SwitchDispatch).unwrap();

            let top = *values.last().unwrap();
            prop_assert_eq!(engine.stack(), values.as_slice());
            prop_assert_eq!(result.debug_register, top);
            prop_assert_eq!(engine.console().output(), format!("{top}\n"));
        }
    }
}
