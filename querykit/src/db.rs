//! Compile, execute and decode in one call.
//!
//! A [`Session`] pairs an [`Executor`] with a [`QueryCompiler`]:
//! - `run` compiles a query and returns the raw rows
//! - `fetch_*` additionally decode the rows into domain records
//! - `execute` runs a write and reports how many rows it returned

use tracing::debug;

use crate::backend::Executor;
use crate::builder::{CompiledQuery, Query, QueryCompiler};
use crate::config::CompilerConfig;
use crate::decode::{self, ResultSet};
use crate::error::Error;
use crate::schema::GraphModel;

pub struct Session<E: Executor> {
    executor: E,
    compiler: QueryCompiler,
}

impl<E: Executor> Session<E> {
    /// A session compiling with the default configuration.
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, CompilerConfig::default())
    }

    pub fn with_config(executor: E, config: CompilerConfig) -> Self {
        Self {
            executor,
            compiler: QueryCompiler::new(config),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    /// Compile and execute a query, returning its rows.
    pub fn run(&self, query: &Query) -> Result<ResultSet, Error> {
        let compiled = self.compiler.compile(query)?;
        self.run_compiled(&compiled)
    }

    /// Execute an already compiled statement.
    pub fn run_compiled(&self, compiled: &CompiledQuery) -> Result<ResultSet, Error> {
        let backend = self.executor.backend_name();
        debug!(
            backend,
            statement = %compiled.statement,
            params = compiled.param_count(),
            "executing statement"
        );
        self.executor
            .execute(&compiled.statement, &compiled.params)
            .map_err(|e| Error::Execution {
                backend,
                message: e.to_string(),
            })
    }

    pub fn fetch_all<T: GraphModel>(&self, query: &Query) -> Result<Vec<T>, Error> {
        let result = self.run(query)?;
        Ok(decode::decode_all(&result)?)
    }

    /// Fetch exactly one record; an empty result is `NoResults`.
    pub fn fetch_one<T: GraphModel>(&self, query: &Query) -> Result<T, Error> {
        let result = self.run(query)?;
        Ok(decode::decode_one(&result)?)
    }

    pub fn fetch_optional<T: GraphModel>(&self, query: &Query) -> Result<Option<T>, Error> {
        let result = self.run(query)?;
        Ok(decode::decode_optional(&result)?)
    }

    /// Run a query for its effect, returning the number of rows it produced.
    pub fn execute(&self, query: &Query) -> Result<usize, Error> {
        Ok(self.run(query)?.len())
    }
}
