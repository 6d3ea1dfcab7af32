//! Expression engine for the docstore API layer.
//!
//! Implements the three expression forms a request may carry — update,
//! condition, and projection — as a pure, synchronous pipeline:
//!
//! 1. **Parse** ([`parse_update_expression`], [`parse_condition_expression`],
//!    [`parse_projection_expression`]) turns expression text into a tree.
//! 2. **Resolve** ([`resolve_update_expression`],
//!    [`resolve_condition_expression`], [`resolve_projection_expression`])
//!    substitutes `#name` and `:value` placeholders in place from the
//!    request's dictionaries, recording which entries were used;
//!    [`verify_all_used`] then rejects entries nothing referenced.
//! 3. **Evaluate** ([`calculate_value`], [`calculate_set_rhs`],
//!    [`eval_condition_expression`]) runs a resolved tree against an
//!    optional snapshot of the previous item.
//!
//! No shared state is held across calls, so every entry point may be
//! invoked concurrently as long as each call owns its trees; the read-only
//! dictionaries may be shared.
// The type-tag abbreviations (S, N, SS, ...) trip the doc-markdown lint.
#![allow(clippy::doc_markdown)]

pub mod ast;
pub mod condition;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod value;

pub use ast::{
    AddClause, ArithmeticOp, Comparator, ConditionExpression, DeleteClause, Path, PathOperator,
    Predicate, SetClause, UpdateExpression, Value, ValueFunction,
};
pub use condition::{
    condition_expression_on, eval_condition_expression, for_condition_expression_on,
};
pub use error::{ExpressionError, PlaceholderKind};
pub use parser::{
    parse_condition_expression, parse_projection_expression, parse_update_expression,
};
pub use resolver::{
    resolve_condition_expression, resolve_projection_expression, resolve_update_expression,
    verify_all_used,
};
pub use value::{calculate_set_rhs, calculate_value, CalculateValueCaller, SetRhsOp};
