//! Engine state: memory, call frames, instruction pointer, debug register.

use threadvm_common::{Instruction, Program, Word};
use tracing::debug;

use crate::config::EngineConfig;
use crate::console::Console;
use crate::dispatch::DispatchStrategy;
use crate::error::RuntimeError;
use crate::frame::CallStack;
use crate::memory::Memory;
use crate::rng::XorShift64;

/// Initial debug register value. `SEEK` is the only thing that changes it.
pub const DEBUG_REGISTER_SENTINEL: Word = 0xFFFF_FFFF;

/// What the dispatch loop does after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue at `ip + 1`.
    Next,
    /// Continue at the given instruction index.
    Jump(usize),
    /// Stop the run.
    Halt(ExitReason),
}

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `END` executed. Memory and frames were reset.
    Terminal,
    /// `RET` on the outermost frame.
    Returned,
    /// The instruction pointer ran past the last instruction.
    EndOfProgram,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    /// Debug register at the end of the run.
    pub debug_register: Word,
    pub exit: ExitReason,
    /// Instructions executed during this run.
    pub steps: u64,
}

/// The threadvm engine.
///
/// Owns all mutable execution state and borrows an immutable program.
/// Dispatch strategies drive it through [`Engine::fetch`],
/// [`Engine::begin_step`] and [`Engine::advance`].
#[derive(Debug)]
pub struct Engine<'p> {
    pub(crate) program: &'p Program,
    pub(crate) memory: Memory,
    pub(crate) frames: CallStack,
    pub(crate) ip: usize,
    pub(crate) debug_register: Word,
    pub(crate) config: EngineConfig,
    pub(crate) console: Console,
    pub(crate) rng: XorShift64,
    pub(crate) steps: u64,
}

impl<'p> Engine<'p> {
    /// Engine with default limits, wired to stdio.
    pub fn new(program: &'p Program) -> Self {
        Self::with_config(program, EngineConfig::default())
    }

    pub fn with_config(program: &'p Program, config: EngineConfig) -> Self {
        Self {
            program,
            memory: Memory::new(config.memory_size),
            frames: CallStack::new(),
            ip: 0,
            debug_register: DEBUG_REGISTER_SENTINEL,
            rng: XorShift64::new(config.seed),
            config,
            console: Console::stdio(),
            steps: 0,
        }
    }

    /// Replace the console.
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Run to completion with the given strategy.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`RuntimeError`]; execution stops there and
    /// the engine state is left as it was at the failing instruction.
    pub fn run(&mut self, strategy: &dyn DispatchStrategy) -> Result<RunResult, RuntimeError> {
        debug!(
            target: "threadvm::engine",
            strategy = strategy.name(),
            instructions = self.program.len(),
            "run started"
        );
        self.steps = 0;
        let result = strategy.run(self);
        match &result {
            Ok(r) => debug!(
                target: "threadvm::engine",
                exit = ?r.exit,
                steps = r.steps,
                debug_register = r.debug_register,
                "run finished"
            ),
            Err(e) => debug!(target: "threadvm::engine", error = %e, steps = self.steps, "run failed"),
        }
        result
    }

    /// Execute one instruction with match-based dispatch.
    ///
    /// Returns `Some(reason)` once the run has ended.
    pub fn step(&mut self) -> Result<Option<ExitReason>, RuntimeError> {
        let Some(instr) = self.fetch() else {
            return Ok(Some(ExitReason::EndOfProgram));
        };
        self.begin_step()?;
        let flow = self.execute(instr)?;
        Ok(self.advance(flow))
    }

    /// Instruction at the current ip, or `None` past the end.
    #[inline]
    pub fn fetch(&self) -> Option<&'p Instruction> {
        self.program.get(self.ip)
    }

    /// Count one step against the budget.
    #[inline]
    pub fn begin_step(&mut self) -> Result<(), RuntimeError> {
        if let Some(limit) = self.config.max_steps {
            if self.steps >= limit {
                return Err(RuntimeError::StepLimitExceeded { at: self.ip, limit });
            }
        }
        self.steps += 1;
        Ok(())
    }

    /// Apply an instruction's flow. Returns `Some` when the run is over.
    #[inline]
    pub fn advance(&mut self, flow: Flow) -> Option<ExitReason> {
        match flow {
            Flow::Next => {
                self.ip += 1;
                None
            }
            Flow::Jump(target) => {
                self.ip = target;
                None
            }
            Flow::Halt(reason) => Some(reason),
        }
    }

    /// Package the end-of-run state.
    pub fn finish(&self, exit: ExitReason) -> RunResult {
        RunResult {
            debug_register: self.debug_register,
            exit,
            steps: self.steps,
        }
    }

    /// Back to the initial state: zeroed memory, one empty frame, ip 0,
    /// sentinel debug register, fresh generator.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.frames.reset();
        self.ip = 0;
        self.debug_register = DEBUG_REGISTER_SENTINEL;
        self.rng = XorShift64::new(self.config.seed);
        self.steps = 0;
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn debug_register(&self) -> Word {
        self.debug_register
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn frames(&self) -> &CallStack {
        &self.frames
    }

    /// Operand stack of the active frame, bottom first.
    pub fn stack(&self) -> &[Word] {
        self.frames.active().stack()
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    // Operand stack helpers. All act on the active frame.

    pub(crate) fn push(&mut self, value: Word) -> Result<(), RuntimeError> {
        let capacity = self.config.stack_capacity;
        let at = self.ip;
        let stack = &mut self.frames.active_mut().stack;
        if stack.len() >= capacity {
            return Err(RuntimeError::StackOverflow { at, capacity });
        }
        stack.push(value);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Result<Word, RuntimeError> {
        let at = self.ip;
        self.frames
            .active_mut()
            .stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { at })
    }

    pub(crate) fn top(&self) -> Option<Word> {
        self.frames.active().stack.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadvm_common::Opcode;

    fn program(instrs: Vec<Instruction>) -> Program {
        Program::new(instrs)
    }

    #[test]
    fn fresh_engine_state() {
        let p = program(vec![Instruction::nullary(Opcode::End)]);
        let engine = Engine::with_config(&p, EngineConfig::default().with_memory_size(16));
        assert_eq!(engine.ip(), 0);
        assert_eq!(engine.debug_register(), DEBUG_REGISTER_SENTINEL);
        assert_eq!(engine.frames().depth(), 1);
        assert!(engine.stack().is_empty());
        assert_eq!(engine.memory().size(), 16);
    }

    #[test]
    fn step_walks_the_program() {
        let p = program(vec![
            Instruction::unary(Opcode::Push, 2),
            Instruction::unary(Opcode::Push, 3),
            Instruction::nullary(Opcode::Add),
        ]);
        let mut engine = Engine::with_config(&p, EngineConfig::default().with_memory_size(16));
        assert_eq!(engine.step(), Ok(None));
        assert_eq!(engine.step(), Ok(None));
        assert_eq!(engine.step(), Ok(None));
        assert_eq!(engine.stack(), &[5]);
        assert_eq!(engine.step(), Ok(Some(ExitReason::EndOfProgram)));
        assert_eq!(engine.steps(), 3);
    }

    #[test]
    fn push_respects_capacity() {
        let p = program(vec![]);
        let mut engine = Engine::with_config(&p, EngineConfig::default().with_stack_capacity(2));
        engine.push(1).unwrap();
        engine.push(2).unwrap();
        assert_eq!(
            engine.push(3),
            Err(RuntimeError::StackOverflow { at: 0, capacity: 2 })
        );
    }

    #[test]
    fn step_budget() {
        let p = program(vec![Instruction::unary(Opcode::Jump, 0)]);
        let mut engine = Engine::with_config(&p, EngineConfig::default().with_max_steps(2));
        engine.step().unwrap();
        engine.step().unwrap();
        assert_eq!(
            engine.step(),
            Err(RuntimeError::StepLimitExceeded { at: 0, limit: 2 })
        );
    }

    #[test]
    fn reset_restores_initial_state() {
        let p = program(vec![
            Instruction::unary(Opcode::Push, 8),
            Instruction::nullary(Opcode::Seek),
            Instruction::binary(Opcode::StoreImm, 0, 5),
        ]);
        let mut engine = Engine::with_config(&p, EngineConfig::default().with_memory_size(16));
        for _ in 0..3 {
            engine.step().unwrap();
        }
        assert_eq!(engine.debug_register(), 8);
        engine.reset();
        assert_eq!(engine.ip(), 0);
        assert_eq!(engine.debug_register(), DEBUG_REGISTER_SENTINEL);
        assert!(engine.stack().is_empty());
        assert_eq!(engine.memory().read_word(0), Ok(0));
    }
}
