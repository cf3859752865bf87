//! Pre-translated dispatch.
//!
//! Before running, every instruction is turned into a boxed closure with
//! its immediates already captured. The loop then just indexes the
//! translated code by ip and calls.

use threadvm_common::{Instruction, Opcode, Program};

use super::DispatchStrategy;
use crate::error::RuntimeError;
use crate::machine::{Engine, ExitReason, Flow, RunResult};

type Thread = Box<dyn Fn(&mut Engine<'_>) -> Result<Flow, RuntimeError>>;

fn thread<F>(f: F) -> Thread
where
    F: Fn(&mut Engine<'_>) -> Result<Flow, RuntimeError> + 'static,
{
    Box::new(f)
}

fn translate(instr: &Instruction) -> Thread {
    let (a, b, c) = (instr.imm(0), instr.imm(1), instr.imm(2));
    match instr.opcode {
        Opcode::Add => thread(|e| e.add()),
        Opcode::Sub => thread(|e| e.sub()),
        Opcode::Mul => thread(|e| e.mul()),
        Opcode::Div => thread(|e| e.div()),
        Opcode::Mod => thread(|e| e.rem()),
        Opcode::Shl => thread(|e| e.shl()),
        Opcode::Shr => thread(|e| e.shr()),
        Opcode::FpAdd => thread(|e| e.fp_add()),
        Opcode::FpSub => thread(|e| e.fp_sub()),
        Opcode::FpMul => thread(|e| e.fp_mul()),
        Opcode::FpDiv => thread(|e| e.fp_div()),
        Opcode::Dup => thread(|e| e.dup()),
        Opcode::End => thread(|e| e.terminate()),
        Opcode::Load => thread(move |e| e.load(a)),
        Opcode::Store => thread(move |e| e.store(a)),
        Opcode::Push => thread(move |e| e.push_immediate(a)),
        Opcode::Inc => thread(|e| e.inc()),
        Opcode::Dec => thread(|e| e.dec()),
        Opcode::StoreImm => thread(move |e| e.store_immediate(a, b)),
        Opcode::Copy => thread(move |e| e.copy(a, b, c)),
        Opcode::Fill => thread(move |e| e.fill(a, b, c)),
        Opcode::Jump => thread(move |e| e.jump(a)),
        Opcode::JumpIfZero => thread(move |e| e.jump_if_zero(a)),
        Opcode::Branch => thread(move |e| e.branch(a, b)),
        Opcode::JumpIfNonZero => thread(move |e| e.jump_if_nonzero(a)),
        Opcode::Gt => thread(|e| e.gt()),
        Opcode::Lt => thread(|e| e.lt()),
        Opcode::Eq => thread(|e| e.equal()),
        Opcode::Ge => thread(|e| e.ge()),
        Opcode::Le => thread(|e| e.le()),
        Opcode::Call => thread(move |e| e.call(a, b)),
        Opcode::Return => thread(|e| e.ret()),
        Opcode::Seek => thread(|e| e.seek()),
        Opcode::Print => thread(|e| e.print()),
        Opcode::ReadInt => thread(move |e| e.read_int(a)),
        Opcode::PrintFloat => thread(|e| e.print_float()),
        Opcode::ReadFloat => thread(move |e| e.read_float(a)),
        Opcode::Tick => thread(|e| e.tick()),
        Opcode::Syscall => thread(|e| e.syscall()),
        Opcode::Random => thread(|e| e.random()),
    }
}

/// A program translated to closures, reusable across runs.
pub struct ThreadedCode {
    code: Vec<Thread>,
}

impl ThreadedCode {
    pub fn translate(program: &Program) -> Self {
        Self {
            code: program.instructions.iter().map(translate).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Run the translated code on an engine built over the same program.
    ///
    /// The step count restarts at zero, as with [`Engine::run`].
    pub fn run(&self, engine: &mut Engine<'_>) -> Result<RunResult, RuntimeError> {
        engine.steps = 0;
        loop {
            let Some(op) = self.code.get(engine.ip()) else {
                return Ok(engine.finish(ExitReason::EndOfProgram));
            };
            engine.begin_step()?;
            let flow = op(engine)?;
            if let Some(exit) = engine.advance(flow) {
                return Ok(engine.finish(exit));
            }
        }
    }
}

/// Translates the engine's program, then runs the translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadedDispatch;

impl DispatchStrategy for ThreadedDispatch {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn run(&self, engine: &mut Engine<'_>) -> Result<RunResult, RuntimeError> {
        ThreadedCode::translate(engine.program()).run(engine)
    }
}
