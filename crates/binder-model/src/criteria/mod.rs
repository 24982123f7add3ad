mod criterion;
pub use criterion::{Criterion, CriterionBuilder};

mod execution;
pub use execution::ExecutionResourceCriteria;
