//! Domain facades for the explorer.
//!
//! These facades combine collaborator calls with the explorer's state
//! rules. [`ExplorerSession`] wires them together.

mod execution;
mod rules;
mod selection;
mod session;

pub use execution::{predecessor, resolve_context, EngineState, ExecutionEngine};
pub use rules::{RegistryState, RulesDomain};
pub use selection::{FilterChange, SelectionDomain};
pub use session::{ExplorerSession, FilterStats};
