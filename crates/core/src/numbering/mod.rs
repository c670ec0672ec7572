//! Human-readable numbers for transactions and share certificates.
//!
//! - Transactions: `TXN-{YYYYMMDD}-{CODE}-{seq:04}`, sequence per day and type
//! - Share certificates: `SC-{YYYY}-{seq:05}`, sequence per year

mod generator;

pub use generator::NumberGenerator;
