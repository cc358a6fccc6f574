//! Path interpreter.
//!
//! A request path is read one directive at a time. [`parse`] consumes the
//! leading directive and hands back the unconsumed suffix inside the returned
//! [`Directive`]; feeding that suffix back into [`parse`] yields the next
//! directive. Nothing is validated ahead of the directive being consumed.

mod directive;
mod parser;
mod scheme;

pub use directive::{Directive, FaultSpec, HopTarget, DEFAULT_FAULT_PERCENTAGE};
pub use parser::{decode_path, parse};
pub use scheme::Scheme;
