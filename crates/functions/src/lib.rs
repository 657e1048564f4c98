//! Scalar function library, aggregate registry, and the
//! [`UserDefinedFunction`] trait for the embeddable SQL engine.
//!
//! Grounded on `function-registry/src/registry.rs`'s case-insensitive
//! lookup design, rebuilt to hold executable closures instead of metadata.

pub mod aggregate;
pub mod registry;
pub mod scalar;
pub mod udf;

pub use aggregate::{make_aggregate, Aggregate};
pub use registry::{FunctionRegistry, ScalarFn, SpatialPredicate};
pub use scalar::regex_fns::like_to_regex;
pub use udf::{Arity, UserDefinedFunction};
