//! Terraform state document parsing and normalization.
//!
//! Two incompatible schema generations are supported: the values/graph shape
//! emitted by Terraform >= 0.12 and the legacy modules shape of earlier
//! releases. Detection happens once, in [`normalize`]; everything downstream
//! operates on the schema-independent [`UniformView`].

mod legacy;
mod state;
mod values;

pub use state::{normalize, FormatError, Output, SchemaError, UniformView};
