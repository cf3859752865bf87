//! Match-based dispatch.

use super::DispatchStrategy;
use crate::error::RuntimeError;
use crate::machine::{Engine, ExitReason, RunResult};

/// Decodes each instruction with a `match` on its opcode.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchDispatch;

impl DispatchStrategy for SwitchDispatch {
    fn name(&self) -> &'static str {
        "switch"
    }

    fn run(&self, engine: &mut Engine<'_>) -> Result<RunResult, RuntimeError> {
        loop {
            let Some(instr) = engine.fetch() else {
                return Ok(engine.finish(ExitReason::EndOfProgram));
            };
            engine.begin_step()?;
            let flow = engine.execute(instr)?;
            if let Some(exit) = engine.advance(flow) {
                return Ok(engine.finish(exit));
            }
        }
    }
}
