//! Strict FIFO of submitted operations.

use std::collections::VecDeque;

use crate::op::{Operation, OperationId};

/// Unbounded FIFO of operations; the head is the active one.
#[derive(Debug, Default)]
pub struct OperationQueue {
    ops: VecDeque<Operation>,
}

impl OperationQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ops: VecDeque::new(),
        }
    }

    /// Appends an operation behind every queued one.
    pub fn push(&mut self, op: Operation) {
        self.ops.push_back(op);
    }

    /// Active operation, if any.
    #[must_use]
    pub fn front(&self) -> Option<&Operation> {
        self.ops.front()
    }

    /// Removes and returns the active operation.
    pub fn pop_front(&mut self) -> Option<Operation> {
        self.ops.pop_front()
    }

    /// Number of queued operations, including the active one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Identifiers in dispatch order.
    pub fn pending_ids(&self) -> impl Iterator<Item = OperationId> + '_ {
        self.ops.iter().map(Operation::id)
    }

    /// Discards every queued operation; their completions become abandoned.
    ///
    /// Returns how many operations were dropped.
    pub fn abandon_all(&mut self) -> usize {
        let dropped = self.ops.len();
        self.ops.clear();
        dropped
    }
}
