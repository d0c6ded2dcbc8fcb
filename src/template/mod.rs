//! Template expansion for textual assets.
//!
//! Textual assets may contain three kinds of directives:
//!
//! - `{repeatN:body}`: unroll `body` N times, with `{count}` / `{countS}`
//!   inside each copy replaced by the copy index (offset by S)
//! - `{emoji:a.b.c}`: look up a dotted path in the emoji namespace of the
//!   dataset
//! - `{data:a.b.c}`: same lookup against the generic data namespace
//!
//! Expansion is total: malformed or unresolvable directives pass through as
//! literal text so content authors can spot them in the output.

mod dataset;
mod engine;

pub use dataset::{Dataset, DatasetError, Namespace};
pub use engine::TemplateEngine;
