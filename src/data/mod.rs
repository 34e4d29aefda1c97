//! Data structures for module significance testing.

mod expression;
mod module_map;
mod result;

pub use expression::ExpressionMap;
pub use module_map::ModuleMap;
pub use result::{ModuleComparison, ModuleComparisonSet, NullComparison, NullComparisonSet};
