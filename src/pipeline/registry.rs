//! Name-keyed constructor tables, one per axis.
//!
//! A registry only holds constructors. Every `create` call builds a fresh instance that the
//! caller owns outright, so nothing is shared between pipeline runs.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::{Axis, PipelineError};

/// Builds a component from the construction arguments of its axis.
pub type Constructor<C, A> = Arc<dyn Fn(&A) -> Result<Box<C>, PipelineError> + Send + Sync>;

pub struct Registry<C: ?Sized, A = ()> {
    axis: Axis,
    constructors: HashMap<String, Constructor<C, A>>,
}

impl<C: ?Sized, A> Registry<C, A> {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            constructors: HashMap::new(),
        }
    }

    /// Inserts or replaces the constructor for `name`. The last registration wins.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&A) -> Result<Box<C>, PipelineError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .constructors
            .insert(name.clone(), Arc::new(constructor))
            .is_some()
        {
            tracing::debug!(axis = %self.axis, name = %name, "Replaced registered constructor");
        }
    }

    pub fn create_with(&self, name: &str, args: &A) -> Result<Box<C>, PipelineError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| PipelineError::unknown(name, self.axis))?;
        constructor(args)
    }

    /// Sorted snapshot of the registered names.
    pub fn available_types(&self) -> BTreeSet<String> {
        self.constructors.keys().cloned().collect()
    }
}

impl<C: ?Sized> Registry<C, ()> {
    pub fn create(&self, name: &str) -> Result<Box<C>, PipelineError> {
        self.create_with(name, &())
    }
}
