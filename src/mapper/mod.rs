//! Bidirectional mapping between normalized and formatted parameter values.
//!
//! A `ValueMapper` is built once from a `ParameterProfile` and answers
//! lookups in both directions without touching the host:
//!
//! - **Binary / enumerated**: exact label dictionary, no interpolation
//! - **Continuous**: linear interpolation between bracketing samples, with
//!   captured strings returned verbatim at sampled points
//! - **Unknown**: nearest-sample lookup
//!
//! # Example
//!
//! ```ignore
//! use paramscope::mapper::ValueMapper;
//!
//! let mapper = ValueMapper::new(&profile);
//! let display = mapper.to_formatted(0.5);
//! let position = mapper.to_normalized("6.0 dB").unwrap_or(current_value);
//! ```

mod engine;

pub use engine::ValueMapper;
