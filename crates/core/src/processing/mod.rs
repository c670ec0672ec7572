//! Transaction processing pipeline.
//!
//! - `orchestrator` - Runs an intent through validation, execution, balance
//!   update, and ledger posting inside one unit of work
//! - `events` - Outcome notifications
//! - `clock` - Injectable time source

pub mod clock;
pub mod events;
pub mod orchestrator;


pub use clock::{Clock, FixedClock, SystemClock};
pub use events::{ChannelEventSink, EventSink, NoopEventSink, TracingEventSink, TransactionEvent};
pub use orchestrator::TransactionOrchestrator;
