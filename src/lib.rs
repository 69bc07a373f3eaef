pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fetch;
pub mod output;
pub mod records;
pub mod xml;

pub use client::{BusTracker, Endpoint, Format};
pub use config::BusTrackerConfig;
pub use error::{BusTrackerError, EnvelopeError, ErrorKind};
pub use records::{BusRecord, Record, Route, Stop, Table, Vehicle};
