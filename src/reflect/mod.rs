//! Reflection loop - iterative prompt refinement with an append-only memory

pub mod agent;
pub mod memory;

pub use agent::{LoopOutcome, ReflectionAgent};
pub use memory::{EntryKind, Memory, MemoryEntry};
