//! Command handlers for the docchat CLI.

pub mod ask;
pub mod clear;
pub mod ingest;
pub mod serve;
pub mod stats;

pub use ask::AskCommand;
pub use clear::ClearCommand;
pub use ingest::IngestCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;
