//! Open state records for declarative workflows
//!
//! This module provides:
//! - `StateSchema` - declares the fields, types and defaults of a record
//! - `WorkflowState` - the runtime record with reducer support
//! - `ReducerType` - strategies for merging values into a field

mod schema;
mod store;

pub use schema::{FieldType, ReducerType, StateFieldDef, StateSchema};
pub use store::WorkflowState;
