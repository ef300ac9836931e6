//! Infrastructure adapters: the waiting queue and async helper bridging.

pub mod async_helper;
pub mod task_queue;

pub use async_helper::AsyncLoadHelper;
pub use task_queue::WaitingTaskQueue;
