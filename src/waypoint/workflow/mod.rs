pub mod builder;
pub mod condition;
pub mod loader;
pub mod registry;
pub mod state;
pub mod template;
pub mod types;

pub use builder::{Workflow, WorkflowBuilder};
pub use loader::WorkflowLoader;
pub use registry::StepRegistry;
pub use state::WorkflowState;
