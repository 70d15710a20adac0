//! Scripted in-memory executor.
//!
//! Replays queued result sets in order and records every statement it is
//! given. An exhausted queue answers with an empty result.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use super::{ExecutionError, Executor};
use crate::builder::Params;
use crate::decode::ResultSet;

#[derive(Debug, Default)]
pub struct MemoryExecutor {
    results: Mutex<VecDeque<Result<ResultSet, String>>>,
    executed: Mutex<Vec<(String, Params)>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next unanswered execution.
    pub fn push_result(&self, result: ResultSet) {
        lock(&self.results).push_back(Ok(result));
    }

    /// Queue a failure for the next unanswered execution.
    pub fn push_failure(&self, message: impl Into<String>) {
        lock(&self.results).push_back(Err(message.into()));
    }

    pub fn with_result(self, result: ResultSet) -> Self {
        self.push_result(result);
        self
    }

    /// Every `(statement, params)` pair executed so far, oldest first.
    pub fn executed(&self) -> Vec<(String, Params)> {
        lock(&self.executed).clone()
    }

    pub fn pending(&self) -> usize {
        lock(&self.results).len()
    }
}

impl Executor for MemoryExecutor {
    fn execute(&self, statement: &str, params: &Params) -> Result<ResultSet, ExecutionError> {
        lock(&self.executed).push((statement.to_string(), params.clone()));
        let next = lock(&self.results).pop_front();
        trace!(statement, scripted = next.is_some(), "memory execute");
        match next {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(message.into()),
            None => Ok(ResultSet::default()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
