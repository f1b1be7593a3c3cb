//! Umbrella crate for the toy robot simulator.
//!
//! Re-exports the engine and protocol crates so downstream code can depend on
//! a single crate name (`toybot`).

pub use toybot_engine as engine;
pub use toybot_protocol as protocol;
