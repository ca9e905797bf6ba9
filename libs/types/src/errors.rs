//! Error taxonomy for the simulator core
//!
//! Most failures never surface as errors: unknown ids return `false` at
//! the call site, invalid intents are rejected by the manager (id 0) or
//! dropped by the worker, and subscriber panics are contained. Only the
//! book getter reports an error directly.

use thiserror::Error;

/// Engine-level errors returned to callers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },
}
