//! Core data model: resource kinds, identifiers, and records.
//!
//! Records are snapshots of what the remote service owns. Identifiers
//! are what the user typed. Everything in between lives in `resolve`
//! and `dispatch`.

mod ident;
mod kind;
mod record;

pub use ident::{Identifier, LATEST};
pub use kind::ResourceKind;
pub use record::Record;
