//! Execution service contract.
//!
//! The compiler never talks to an engine directly. Anything that can run a
//! statement with its binding map and hand back rows implements
//! [`Executor`]; connection and transaction handling stay on the
//! implementor's side.

pub mod memory;

use std::error::Error;

use crate::builder::Params;
use crate::decode::ResultSet;

pub use memory::MemoryExecutor;

/// Boxed error reported by an execution service.
pub type ExecutionError = Box<dyn Error + Send + Sync>;

/// Trait for services that can execute compiled statements.
pub trait Executor: Send + Sync {
    /// Execute a statement with its parameters, returning all rows.
    fn execute(&self, statement: &str, params: &Params) -> Result<ResultSet, ExecutionError>;

    /// Execute a statement without parameters.
    fn execute_no_params(&self, statement: &str) -> Result<ResultSet, ExecutionError> {
        self.execute(statement, &Params::new())
    }

    /// Get the backend name for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_is_object_safe() {
        fn accepts_executor(_executor: &dyn Executor) {}
        let executor = MemoryExecutor::new();
        accepts_executor(&executor);
    }

    #[test]
    fn test_no_params_default() {
        let executor = MemoryExecutor::new();
        executor.execute_no_params("RETURN 1").unwrap();
        let executed = executor.executed();
        assert_eq!(executed.len(), 1);
        assert!(executed[0].1.is_empty());
    }
}
