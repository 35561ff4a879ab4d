//! Web APIs implementation.
//!
//! This crate provides the page-side APIs the bridge scripts run on:
//! - Mutation Observer API
//! - Timers and the cooperative task queue

pub mod mutation_observer;
pub mod timers;

pub use mutation_observer::{MutationObserver, MutationObserverInit, ObserveError};
pub use timers::{EventLoopContext, Task, TaskQueue, TaskSender};
