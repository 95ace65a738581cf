//! tfinv - Terraform state to Ansible dynamic inventory.
//!
//! A library for parsing Terraform state documents (legacy modules or
//! values/graph schema), normalizing them to a uniform resource/output view,
//! and aggregating that view into Ansible inventory groups.

pub mod cli;
pub mod error;
pub mod groups;
pub mod input;
pub mod output;
pub mod providers;
pub mod resource;
pub mod terraform;

pub use error::InventoryError;
pub use groups::{aggregate, AggregateOptions, Aggregation, Group};
pub use resource::{ResolveConfig, Resource};
pub use terraform::{normalize, UniformView};
