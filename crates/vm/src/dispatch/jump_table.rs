//! Table-driven dispatch.
//!
//! [`HANDLERS`] maps every opcode word to a plain function. The loop looks
//! the handler up by opcode each step and calls it indirectly.

use threadvm_common::opcode::OPCODE_COUNT;
use threadvm_common::Instruction;

use super::DispatchStrategy;
use crate::error::RuntimeError;
use crate::machine::{Engine, ExitReason, Flow, RunResult};

/// Handler signature: the engine plus the instruction being executed.
pub type Handler = fn(&mut Engine<'_>, &Instruction) -> Result<Flow, RuntimeError>;

/// One handler per opcode, indexed by opcode word.
pub static HANDLERS: [Handler; OPCODE_COUNT] = [
    op_add,
    op_sub,
    op_mul,
    op_div,
    op_mod,
    op_shl,
    op_shr,
    op_fp_add,
    op_fp_sub,
    op_fp_mul,
    op_fp_div,
    op_dup,
    op_end,
    op_load,
    op_store,
    op_push,
    op_inc,
    op_dec,
    op_store_imm,
    op_copy,
    op_fill,
    op_jump,
    op_jump_if_zero,
    op_branch,
    op_jump_if_nonzero,
    op_gt,
    op_lt,
    op_eq,
    op_ge,
    op_le,
    op_call,
    op_ret,
    op_seek,
    op_print,
    op_read_int,
    op_print_float,
    op_read_float,
    op_tick,
    op_syscall,
    op_random,
];

/// Handlers that ignore the instruction's immediates.
macro_rules! stack_handlers {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            fn $name(engine: &mut Engine<'_>, _: &Instruction) -> Result<Flow, RuntimeError> {
                engine.$method()
            }
        )*
    };
}

stack_handlers! {
    op_add => add,
    op_sub => sub,
    op_mul => mul,
    op_div => div,
    op_mod => rem,
    op_shl => shl,
    op_shr => shr,
    op_fp_add => fp_add,
    op_fp_sub => fp_sub,
    op_fp_mul => fp_mul,
    op_fp_div => fp_div,
    op_dup => dup,
    op_end => terminate,
    op_inc => inc,
    op_dec => dec,
    op_gt => gt,
    op_lt => lt,
    op_eq => equal,
    op_ge => ge,
    op_le => le,
    op_ret => ret,
    op_seek => seek,
    op_print => print,
    op_print_float => print_float,
    op_tick => tick,
    op_syscall => syscall,
    op_random => random,
}

fn op_load(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.load(instr.imm(0))
}

fn op_store(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.store(instr.imm(0))
}

fn op_push(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.push_immediate(instr.imm(0))
}

fn op_store_imm(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.store_immediate(instr.imm(0), instr.imm(1))
}

fn op_copy(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.copy(instr.imm(0), instr.imm(1), instr.imm(2))
}

fn op_fill(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.fill(instr.imm(0), instr.imm(1), instr.imm(2))
}

fn op_jump(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.jump(instr.imm(0))
}

fn op_jump_if_zero(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.jump_if_zero(instr.imm(0))
}

fn op_jump_if_nonzero(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.jump_if_nonzero(instr.imm(0))
}

fn op_branch(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.branch(instr.imm(0), instr.imm(1))
}

fn op_call(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.call(instr.imm(0), instr.imm(1))
}

fn op_read_int(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.read_int(instr.imm(0))
}

fn op_read_float(engine: &mut Engine<'_>, instr: &Instruction) -> Result<Flow, RuntimeError> {
    engine.read_float(instr.imm(0))
}

/// Calls through [`HANDLERS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JumpTableDispatch;

impl DispatchStrategy for JumpTableDispatch {
    fn name(&self) -> &'static str {
        "jump-table"
    }

    fn run(&self, engine: &mut Engine<'_>) -> Result<RunResult, RuntimeError> {
        loop {
            let Some(instr) = engine.fetch() else {
                return Ok(engine.finish(ExitReason::EndOfProgram));
            };
            engine.begin_step()?;
            let handler = HANDLERS[instr.opcode as usize];
            let flow = handler(engine, instr)?;
            if let Some(exit) = engine.advance(flow) {
                return Ok(engine.finish(exit));
            }
        }
    }
}
