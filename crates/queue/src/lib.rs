//! Durable, deduplicated task queue.
//!
//! Backed by the `tasks` table. Delivery is at-least-once: a claimed task
//! that never completes is eventually reaped and re-run, and failures are
//! retried with exponential backoff. Consumers must therefore be idempotent.

mod queue;

pub use queue::TaskQueue;
