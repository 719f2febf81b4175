pub mod error;
pub mod options;
pub mod output;
pub mod runtime;
