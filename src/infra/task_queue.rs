//! Waiting queue for load tasks, ordered by priority.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::{LoadResourceTask, PipelineError};

/// Wrapper to make a task orderable by priority (highest first) and FIFO within priority.
struct PriorityTask {
    task: Box<LoadResourceTask>,
}

impl PartialEq for PriorityTask {
    fn eq(&self, other: &Self) -> bool {
        self.task.serial_id() == other.task.serial_id()
    }
}

impl Eq for PriorityTask {}

impl PartialOrd for PriorityTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityTask {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.task.priority().cmp(&other.task.priority()) {
            // Lower serial was accepted first; reversed for the max-heap.
            Ordering::Equal => other.task.serial_id().cmp(&self.task.serial_id()),
            ord => ord,
        }
    }
}

/// Bounded priority heap of tasks waiting for an idle agent.
/// O(log n) push and pop.
pub struct WaitingTaskQueue {
    max_depth: usize,
    tasks: BinaryHeap<PriorityTask>,
}

impl WaitingTaskQueue {
    /// Create a queue holding at most `max_depth` tasks.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            tasks: BinaryHeap::with_capacity(max_depth.min(1024)),
        }
    }

    /// Configured depth limit.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of waiting tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// No waiting tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Depth limit reached.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.tasks.len() >= self.max_depth
    }

    /// Enqueue a task.
    ///
    /// # Errors
    ///
    /// `QueueFull` together with the rejected task, so the caller can release it.
    pub fn push(
        &mut self,
        task: Box<LoadResourceTask>,
    ) -> Result<(), (PipelineError, Box<LoadResourceTask>)> {
        if self.is_full() {
            return Err((PipelineError::QueueFull(self.max_depth), task));
        }
        self.tasks.push(PriorityTask { task });
        Ok(())
    }

    /// Dequeue the highest-priority, oldest task.
    pub fn pop(&mut self) -> Option<Box<LoadResourceTask>> {
        self.tasks.pop().map(|pt| pt.task)
    }

    /// Remove every waiting task in no particular order.
    pub fn drain(&mut self) -> Vec<Box<LoadResourceTask>> {
        self.tasks.drain().map(|pt| pt.task).collect()
    }
}

impl std::fmt::Debug for WaitingTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitingTaskQueue")
            .field("max_depth", &self.max_depth)
            .field("len", &self.tasks.len())
            .finish()
    }
}
