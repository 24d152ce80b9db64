pub mod advisory;
pub mod arrivals;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod positions;
pub mod store;
