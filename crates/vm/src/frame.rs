//! Call frames.

use threadvm_common::Word;

/// One activation: an operand stack and the index to resume at on return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub(crate) stack: Vec<Word>,
    pub(crate) return_ip: usize,
}

impl Frame {
    /// Frame whose stack starts with `stack` (bottom first).
    pub fn new(stack: Vec<Word>, return_ip: usize) -> Self {
        Self { stack, return_ip }
    }

    /// Operand stack, bottom first.
    pub fn stack(&self) -> &[Word] {
        &self.stack
    }

    /// Instruction index the caller resumes at.
    pub fn return_ip(&self) -> usize {
        self.return_ip
    }
}

/// Stack of frames. The outermost frame always exists, so there is always
/// an active frame.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    outermost: Frame,
    nested: Vec<Frame>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The innermost frame.
    pub fn active(&self) -> &Frame {
        self.nested.last().unwrap_or(&self.outermost)
    }

    pub fn active_mut(&mut self) -> &mut Frame {
        match self.nested.last_mut() {
            Some(frame) => frame,
            None => &mut self.outermost,
        }
    }

    /// Enter a callee frame.
    pub fn push(&mut self, frame: Frame) {
        self.nested.push(frame);
    }

    /// Leave the innermost frame. Returns `None` on the outermost frame,
    /// which is never removed.
    pub fn pop(&mut self) -> Option<Frame> {
        self.nested.pop()
    }

    /// Number of frames, including the outermost.
    pub fn depth(&self) -> usize {
        1 + self.nested.len()
    }

    /// Number of calls currently in progress.
    pub fn nesting(&self) -> usize {
        self.nested.len()
    }

    pub fn is_outermost(&self) -> bool {
        self.nested.is_empty()
    }

    /// Collapse to a single empty frame.
    pub fn reset(&mut self) {
        self.nested.clear();
        self.outermost = Frame::default();
    }

    /// All frames, outermost first.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        std::iter::once(&self.outermost).chain(self.nested.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_has_an_active_frame() {
        let mut calls = CallStack::new();
        assert_eq!(calls.depth(), 1);
        assert!(calls.is_outermost());
        assert_eq!(calls.pop(), None);
        assert!(calls.active().stack().is_empty());
    }

    #[test]
    fn push_and_pop() {
        let mut calls = CallStack::new();
        calls.active_mut().stack.push(1);
        calls.push(Frame::new(vec![2, 3], 7));
        assert_eq!(calls.depth(), 2);
        assert_eq!(calls.nesting(), 1);
        assert_eq!(calls.active().stack(), &[2, 3]);

        let frame = calls.pop().unwrap();
        assert_eq!(frame.return_ip(), 7);
        assert_eq!(calls.active().stack(), &[1]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut calls = CallStack::new();
        calls.active_mut().stack.push(9);
        calls.push(Frame::new(vec![1], 3));
        calls.reset();
        assert_eq!(calls.depth(), 1);
        assert!(calls.active().stack().is_empty());
        assert_eq!(calls.iter().count(), 1);
    }
}
