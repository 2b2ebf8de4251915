pub mod ast;
pub mod builders;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod error;
pub mod eval;
pub mod format;
pub mod operators;
pub mod sql_compiler;

pub use ast::{
    Clause, Comparison, Connective, CustomQueryRequest, FieldDescriptor, FieldType, FilterEntry,
    FilterTerm, FilterValue, IncludeDescriptor, Literal, QueryStructure,
};
pub use catalog::{ModelCatalog, StaticCatalog};
pub use compiler::{compile, QueryCompiler};
pub use error::{CompileError, ConfigError};
