pub mod context;
pub mod error;
pub mod module;
pub mod types;
pub mod validate;

pub use context::{CancelFlag, InvocationContext};
pub use error::{ErrorKind, ToolError};
pub use module::CapabilityModule;
pub use types::{
    CapabilityBinding, ExecutionKind, Health, InvocationResult, ModuleState, OperationSpec,
    ParamSpec, ParamType,
};
pub use validate::validate_args;
