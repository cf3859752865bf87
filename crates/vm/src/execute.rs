//! Instruction semantics.
//!
//! One method per operation, each taking its immediates explicitly and
//! returning the [`Flow`] the dispatch loop applies. Every dispatch strategy
//! calls these same methods, which keeps them observably equivalent.
//!
//! Binary operations pop `a` (the top) and then `b`, and push `b op a`.

use threadvm_common::word::{from_float, to_float};
use threadvm_common::{Instruction, Opcode, Word};
use tracing::{trace, warn};

use crate::error::RuntimeError;
use crate::frame::Frame;
use crate::machine::{Engine, ExitReason, Flow};
use crate::memory::OutOfBounds;

impl<'p> Engine<'p> {
    /// Execute one instruction by matching on its opcode.
    pub fn execute(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        let (a, b, c) = (instr.imm(0), instr.imm(1), instr.imm(2));
        match instr.opcode {
            Opcode::Add => self.add(),
            Opcode::Sub => self.sub(),
            Opcode::Mul => self.mul(),
            Opcode::Div => self.div(),
            Opcode::Mod => self.rem(),
            Opcode::Shl => self.shl(),
            Opcode::Shr => self.shr(),
            Opcode::FpAdd => self.fp_add(),
            Opcode::FpSub => self.fp_sub(),
            Opcode::FpMul => self.fp_mul(),
            Opcode::FpDiv => self.fp_div(),
            Opcode::Dup => self.dup(),
            Opcode::End => self.terminate(),
            Opcode::Load => self.load(a),
            Opcode::Store => self.store(a),
            Opcode::Push => self.push_immediate(a),
            Opcode::Inc => self.inc(),
            Opcode::Dec => self.dec(),
            Opcode::StoreImm => self.store_immediate(a, b),
            Opcode::Copy => self.copy(a, b, c),
            Opcode::Fill => self.fill(a, b, c),
            Opcode::Jump => self.jump(a),
            Opcode::JumpIfZero => self.jump_if_zero(a),
            Opcode::Branch => self.branch(a, b),
            Opcode::JumpIfNonZero => self.jump_if_nonzero(a),
            Opcode::Gt => self.gt(),
            Opcode::Lt => self.lt(),
            Opcode::Eq => self.equal(),
            Opcode::Ge => self.ge(),
            Opcode::Le => self.le(),
            Opcode::Call => self.call(a, b),
            Opcode::Return => self.ret(),
            Opcode::Seek => self.seek(),
            Opcode::Print => self.print(),
            Opcode::ReadInt => self.read_int(a),
            Opcode::PrintFloat => self.print_float(),
            Opcode::ReadFloat => self.read_float(a),
            Opcode::Tick => self.tick(),
            Opcode::Syscall => self.syscall(),
            Opcode::Random => self.random(),
        }
    }

    fn binary(&mut self, op: impl FnOnce(Word, Word) -> Word) -> Result<Flow, RuntimeError> {
        let a = self.pop()?;
        let b = self.pop()?;
        self.push(op(a, b))?;
        Ok(Flow::Next)
    }

    fn binary_float(&mut self, op: fn(f32, f32) -> f32) -> Result<Flow, RuntimeError> {
        self.binary(|a, b| from_float(op(to_float(a), to_float(b))))
    }

    fn compare(&mut self, op: fn(Word, Word) -> bool) -> Result<Flow, RuntimeError> {
        self.binary(|a, b| Word::from(op(a, b)))
    }

    fn unary(&mut self, op: fn(Word) -> Word) -> Result<Flow, RuntimeError> {
        let v = self.pop()?;
        self.push(op(v))?;
        Ok(Flow::Next)
    }

    fn fault(&self, fault: OutOfBounds) -> RuntimeError {
        RuntimeError::memory(self.ip, fault)
    }

    fn io_error(&self, err: std::io::Error) -> RuntimeError {
        RuntimeError::io(self.ip, err)
    }

    // ---- Integer arithmetic ----

    pub fn add(&mut self) -> Result<Flow, RuntimeError> {
        self.binary(|a, b| b.wrapping_add(a))
    }

    pub fn sub(&mut self) -> Result<Flow, RuntimeError> {
        self.binary(|a, b| b.wrapping_sub(a))
    }

    pub fn mul(&mut self) -> Result<Flow, RuntimeError> {
        self.binary(|a, b| b.wrapping_mul(a))
    }

    pub fn div(&mut self) -> Result<Flow, RuntimeError> {
        let a = self.pop()?;
        let b = self.pop()?;
        if a == 0 {
            return Err(RuntimeError::DivisionByZero { at: self.ip });
        }
        self.push(b / a)?;
        Ok(Flow::Next)
    }

    /// `MOD`: unsigned remainder.
    pub fn rem(&mut self) -> Result<Flow, RuntimeError> {
        let a = self.pop()?;
        let b = self.pop()?;
        if a == 0 {
            return Err(RuntimeError::DivisionByZero { at: self.ip });
        }
        self.push(b % a)?;
        Ok(Flow::Next)
    }

    /// Shift amounts are taken modulo 32.
    pub fn shl(&mut self) -> Result<Flow, RuntimeError> {
        self.binary(|a, b| b.wrapping_shl(a))
    }

    pub fn shr(&mut self) -> Result<Flow, RuntimeError> {
        self.binary(|a, b| b.wrapping_shr(a))
    }

    pub fn inc(&mut self) -> Result<Flow, RuntimeError> {
        self.unary(|v| v.wrapping_add(1))
    }

    pub fn dec(&mut self) -> Result<Flow, RuntimeError> {
        self.unary(|v| v.wrapping_sub(1))
    }

    pub fn dup(&mut self) -> Result<Flow, RuntimeError> {
        let v = self
            .top()
            .ok_or(RuntimeError::StackUnderflow { at: self.ip })?;
        self.push(v)?;
        Ok(Flow::Next)
    }

    // ---- Float arithmetic (IEEE-754 single precision over word bits) ----

    pub fn fp_add(&mut self) -> Result<Flow, RuntimeError> {
        self.binary_float(|a, b| b + a)
    }

    pub fn fp_sub(&mut self) -> Result<Flow, RuntimeError> {
        self.binary_float(|a, b| b - a)
    }

    pub fn fp_mul(&mut self) -> Result<Flow, RuntimeError> {
        self.binary_float(|a, b| b * a)
    }

    /// A divisor of `+0.0` or `-0.0` is fatal.
    pub fn fp_div(&mut self) -> Result<Flow, RuntimeError> {
        let a = to_float(self.pop()?);
        let b = to_float(self.pop()?);
        if a == 0.0 {
            return Err(RuntimeError::DivisionByZero { at: self.ip });
        }
        self.push(from_float(b / a))?;
        Ok(Flow::Next)
    }

    // ---- Comparisons: push 1 or 0, unsigned ----

    pub fn gt(&mut self) -> Result<Flow, RuntimeError> {
        self.compare(|a, b| b > a)
    }

    pub fn lt(&mut self) -> Result<Flow, RuntimeError> {
        self.compare(|a, b| b < a)
    }

    pub fn equal(&mut self) -> Result<Flow, RuntimeError> {
        self.compare(|a, b| b == a)
    }

    pub fn ge(&mut self) -> Result<Flow, RuntimeError> {
        self.compare(|a, b| b >= a)
    }

    pub fn le(&mut self) -> Result<Flow, RuntimeError> {
        self.compare(|a, b| b <= a)
    }

    // ---- Stack and memory ----

    pub fn push_immediate(&mut self, value: Word) -> Result<Flow, RuntimeError> {
        self.push(value)?;
        Ok(Flow::Next)
    }

    pub fn load(&mut self, offset: Word) -> Result<Flow, RuntimeError> {
        let value = self.memory.read_word(offset).map_err(|f| self.fault(f))?;
        self.push(value)?;
        Ok(Flow::Next)
    }

    pub fn store(&mut self, offset: Word) -> Result<Flow, RuntimeError> {
        let value = self.pop()?;
        self.memory
            .write_word(offset, value)
            .map_err(|f| self.fault(f))?;
        Ok(Flow::Next)
    }

    pub fn store_immediate(&mut self, offset: Word, value: Word) -> Result<Flow, RuntimeError> {
        self.memory
            .write_word(offset, value)
            .map_err(|f| self.fault(f))?;
        Ok(Flow::Next)
    }

    pub fn copy(&mut self, dest: Word, src: Word, len: Word) -> Result<Flow, RuntimeError> {
        self.memory.copy(dest, src, len).map_err(|f| self.fault(f))?;
        Ok(Flow::Next)
    }

    /// Only the low byte of `value` is used.
    pub fn fill(&mut self, dest: Word, value: Word, len: Word) -> Result<Flow, RuntimeError> {
        self.memory
            .fill(dest, value as u8, len)
            .map_err(|f| self.fault(f))?;
        Ok(Flow::Next)
    }

    // ---- Control flow ----

    /// Check a target before any state changes.
    fn target(&self, target: Word) -> Result<usize, RuntimeError> {
        let index = target as usize;
        if index < self.program.len() {
            Ok(index)
        } else {
            Err(RuntimeError::InvalidTarget { at: self.ip, target })
        }
    }

    pub fn jump(&mut self, target: Word) -> Result<Flow, RuntimeError> {
        Ok(Flow::Jump(self.target(target)?))
    }

    /// Targets are validated whether or not the jump is taken.
    pub fn jump_if_zero(&mut self, target: Word) -> Result<Flow, RuntimeError> {
        let target = self.target(target)?;
        let v = self.pop()?;
        Ok(if v == 0 { Flow::Jump(target) } else { Flow::Next })
    }

    pub fn jump_if_nonzero(&mut self, target: Word) -> Result<Flow, RuntimeError> {
        let target = self.target(target)?;
        let v = self.pop()?;
        Ok(if v != 0 { Flow::Jump(target) } else { Flow::Next })
    }

    /// Nonzero goes to `if_true`, zero to `if_false`.
    pub fn branch(&mut self, if_true: Word, if_false: Word) -> Result<Flow, RuntimeError> {
        let if_true = self.target(if_true)?;
        let if_false = self.target(if_false)?;
        let v = self.pop()?;
        Ok(Flow::Jump(if v != 0 { if_true } else { if_false }))
    }

    /// Move the top `param_count` words into a fresh frame, keeping their
    /// order, and jump to `target`.
    pub fn call(&mut self, target: Word, param_count: Word) -> Result<Flow, RuntimeError> {
        let at = self.ip;
        let target = self.target(target)?;
        let available = self.frames.active().stack.len();
        let count = param_count as usize;
        if count > available {
            return Err(RuntimeError::StackUnderflow { at });
        }
        let limit = self.config.max_call_depth;
        if self.frames.nesting() >= limit {
            return Err(RuntimeError::CallDepthExceeded { at, limit });
        }

        let params = self.frames.active_mut().stack.split_off(available - count);
        self.frames.push(Frame::new(params, at + 1));
        trace!(target: "threadvm::engine", at, callee = target, params = count, depth = self.frames.depth(), "call");
        Ok(Flow::Jump(target))
    }

    /// Return the top of the callee's stack to the caller. On the outermost
    /// frame this ends the run successfully.
    pub fn ret(&mut self) -> Result<Flow, RuntimeError> {
        if self.frames.is_outermost() {
            return Ok(Flow::Halt(ExitReason::Returned));
        }
        let value = self.pop()?;
        let Some(frame) = self.frames.pop() else {
            return Ok(Flow::Halt(ExitReason::Returned));
        };
        self.push(value)?;
        trace!(target: "threadvm::engine", at = self.ip, resume = frame.return_ip, "return");
        Ok(Flow::Jump(frame.return_ip))
    }

    /// `END`: zero memory, collapse to one empty frame, rewind to 0.
    /// The debug register is kept.
    pub fn terminate(&mut self) -> Result<Flow, RuntimeError> {
        self.memory.clear();
        self.frames.reset();
        self.ip = 0;
        Ok(Flow::Halt(ExitReason::Terminal))
    }

    pub fn syscall(&mut self) -> Result<Flow, RuntimeError> {
        Err(RuntimeError::UnknownOpcode {
            at: self.ip,
            opcode: Opcode::Syscall.word(),
        })
    }

    // ---- Diagnostics and I/O ----

    /// Copy the top of the stack into the debug register without popping.
    pub fn seek(&mut self) -> Result<Flow, RuntimeError> {
        self.debug_register = self
            .top()
            .ok_or(RuntimeError::StackUnderflow { at: self.ip })?;
        Ok(Flow::Next)
    }

    pub fn print(&mut self) -> Result<Flow, RuntimeError> {
        self.print_top(|w| w.to_string())
    }

    /// Shortest round-trip formatting: 1/3 prints as `0.33333334`, not the
    /// six-significant-digit `0.333333` of C++ stream output.
    pub fn print_float(&mut self) -> Result<Flow, RuntimeError> {
        self.print_top(|w| to_float(w).to_string())
    }

    /// Non-destructive print. An empty stack is reported, not fatal.
    fn print_top(&mut self, render: fn(Word) -> String) -> Result<Flow, RuntimeError> {
        let result = match self.top() {
            Some(w) => self.console.write_line(&render(w)),
            None => {
                warn!(target: "threadvm::engine", at = self.ip, "print with empty stack");
                self.console.diagnostic("Stack is empty.")
            }
        };
        result.map_err(|e| self.io_error(e))?;
        Ok(Flow::Next)
    }

    pub fn tick(&mut self) -> Result<Flow, RuntimeError> {
        self.console
            .write_line("tik")
            .map_err(|e| self.io_error(e))?;
        Ok(Flow::Next)
    }

    /// Read an integer line into memory. Accepts signed and unsigned forms.
    pub fn read_int(&mut self, offset: Word) -> Result<Flow, RuntimeError> {
        self.read_into(offset, |text| {
            text.parse::<i32>()
                .map(|v| v as Word)
                .or_else(|_| text.parse::<Word>())
                .ok()
        })
    }

    pub fn read_float(&mut self, offset: Word) -> Result<Flow, RuntimeError> {
        self.read_into(offset, |text| text.parse::<f32>().ok().map(from_float))
    }

    fn read_into(
        &mut self,
        offset: Word,
        parse: fn(&str) -> Option<Word>,
    ) -> Result<Flow, RuntimeError> {
        let at = self.ip;
        self.memory.range(offset, 4).map_err(|f| self.fault(f))?;
        let line = self
            .console
            .read_line()
            .map_err(|e| self.io_error(e))?
            .ok_or(RuntimeError::InvalidInput {
                at,
                input: String::new(),
            })?;
        let value = parse(line.trim()).ok_or_else(|| RuntimeError::InvalidInput {
            at,
            input: line.clone(),
        })?;
        self.memory
            .write_word(offset, value)
            .map_err(|f| self.fault(f))?;
        Ok(Flow::Next)
    }

    /// Pop `max` and push a value in `[0, max)`, or 0 when `max` is 0.
    pub fn random(&mut self) -> Result<Flow, RuntimeError> {
        let max = self.pop()?;
        let value = self.rng.below(max);
        self.push(value)?;
        Ok(Flow::Next)
    }
}
