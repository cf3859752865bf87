//! Engine configuration.

/// Memory capacity in bytes (4 MiB).
pub const DEFAULT_MEMORY_SIZE: usize = 4 * 1024 * 1024;

/// Maximum operand stack depth per frame.
pub const DEFAULT_STACK_CAPACITY: usize = 1024;

/// Maximum number of nested calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Seed for the `RAND` generator.
pub const DEFAULT_SEED: u64 = 0x2545_F491_4F6C_DD1D;

/// Resource limits and tunables for one [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Size of the flat memory buffer in bytes.
    pub memory_size: usize,
    /// Operand stack capacity of every frame.
    pub stack_capacity: usize,
    /// Maximum number of frames above the outermost one.
    pub max_call_depth: usize,
    /// Optional cap on executed instructions. `None` runs unbounded.
    pub max_steps: Option<u64>,
    /// Seed for the deterministic `RAND` generator.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            stack_capacity: DEFAULT_STACK_CAPACITY,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_steps: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl EngineConfig {
    pub fn with_memory_size(mut self, bytes: usize) -> Self {
        self.memory_size = bytes;
        self
    }

    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = capacity;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
