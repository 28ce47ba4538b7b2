//! Sampling and persistence pipeline
//!
//! Each channel is one pipeline:
//!
//! ```text
//! SensorSource -> PeriodicProducer -> BoundedQueue -> PersistenceConsumer -> log file
//!                                                             |
//!                                                      SharedStorage lock
//! ```
//!
//! The two pipelines share only the storage lock. Every blocking point
//! (periodic sleep, queue push, queue pop) also watches a
//! [`ShutdownSignal`], so the supervisor can stop and join all tasks.
//!
//! # Counters
//!
//! Producers count a read after the sample is in the queue. Consumers count
//! a save after the append succeeds. Failed appends are dropped, so
//! `saves <= reads` always holds for a channel.

pub mod consumer;
pub mod counters;
pub mod producer;
pub mod queue;
pub mod shutdown;

pub use consumer::{write_sample, PersistenceConsumer};
pub use counters::{ChannelCounters, CounterSnapshot, RunCounters};
pub use producer::{PeriodicProducer, TickOutcome};
pub use queue::{bounded_queue, QueueError, QueueReceiver, QueueSender, QueueStats};
pub use shutdown::ShutdownSignal;
