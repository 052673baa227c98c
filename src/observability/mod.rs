// Observability: metrics (logging setup lives in crate::logging)

pub mod metrics;

pub use metrics::{init, render, write_snapshot};
