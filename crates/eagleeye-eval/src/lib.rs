//! # eagleeye-eval — Sandboxed Rule-Expression Evaluator
//!
//! Evaluates a rulebook expression such as
//! `(货币资金 / (短期借款 + 长期借款)) < 0.5` against a [`FinancialRecord`]
//! and returns a structured [`EvaluationOutcome`].
//!
//! ## Pipeline
//!
//! 1. **Normalize** ([`normalize`]): rulebook spellings (`AND`, `且`,
//!    `包含`, `== NULL`, `COUNT(...)`) are rewritten into the canonical
//!    grammar.
//! 2. **Bind** ([`binding`]): record values replace field names, longest
//!    name first, at identifier boundaries only.
//! 3. **Check completeness** ([`completeness`]): leftover field names mean
//!    insufficient data, which is a non-violating outcome rather than an
//!    error of the rule.
//! 4. **Evaluate** ([`parser`], [`interpreter`]): the bound text is parsed
//!    into a closed [`ast::Expr`] and walked. There is no general-purpose
//!    evaluator behind it; anything outside the grammar is rejected.
//!
//! ## Crate Policy
//!
//! - [`ExpressionEvaluator::evaluate`] never panics and never returns an
//!   error; failures are data.
//! - No shared mutable state. The evaluator is `Copy + Send + Sync`.
//!
//! [`FinancialRecord`]: eagleeye_core::FinancialRecord
//! [`EvaluationOutcome`]: eagleeye_core::EvaluationOutcome

pub mod ast;
pub mod binding;
pub mod completeness;
pub mod error;
pub mod evaluator;
pub mod fallback;
pub mod interpreter;
pub mod lexer;
pub mod normalize;
pub mod parser;
mod scan;
pub mod value;

pub use error::{ExprError, ExprResult};
pub use evaluator::ExpressionEvaluator;
pub use normalize::normalize;
pub use parser::parse;
pub use value::Value;
