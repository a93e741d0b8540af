pub mod parse;
pub mod schema;
pub mod types;

pub use parse::parse;
pub use schema::{describe_schema, FieldSpec, MENTION_FIELDS};
pub use types::*;
