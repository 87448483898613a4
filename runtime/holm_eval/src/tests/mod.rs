//! Evaluator integration tests, built over the [`crate::test_helpers`]
//! fixture. Grouped by the semantics under test.

mod classes;
mod vivification;
