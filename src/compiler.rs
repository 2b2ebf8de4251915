//! Filter query compiler: turns filter entries and connectives into a
//! [`QueryStructure`].
//!
//! ## Pipeline
//!
//! ```text
//! compile()
//!   ├─ reject an empty entry list (CompileError::NoFilters)
//!   ├─ compile_entry() for every entry, in order
//!   │    ├─ drop entries missing term / operator / field name / field type
//!   │    ├─ drop entries whose value has an unusable shape
//!   │    ├─ string | number | date | boolean → builders::*_clause()
//!   │    └─ entity → resolve_entity()
//!   │         ├─ no catalog or own attribute   → plain predicate
//!   │         ├─ alias found, model resolvable → IncludeDescriptor (id ∈ value)
//!   │         └─ otherwise                     → plain predicate
//!   ├─ route includes to include_options, predicates to the clause list
//!   └─ fold_clauses() → where_options
//! ```

use crate::ast::{
    Clause, Connective, FieldType, FilterEntry, FilterValue, IncludeDescriptor, QueryStructure,
};
use crate::builders::{boolean_clause, date_clause, entity_clause, number_clause, text_clause};
use crate::catalog::{association_alias, naive_singularize, ModelCatalog};
use crate::error::CompileError;
use tracing::{debug, warn};

/// Output of a single entry before routing.
#[derive(Debug, Clone, PartialEq)]
enum Compiled {
    Where(Clause),
    Include(IncludeDescriptor),
}

/// Compiles filter entries, optionally resolving entity fields through a
/// model catalog.
#[derive(Clone, Copy, Default)]
pub struct QueryCompiler<'a> {
    catalog: Option<&'a dyn ModelCatalog>,
    target_model: Option<&'a str>,
}

impl<'a> QueryCompiler<'a> {
    /// A compiler without catalog: entity fields become plain predicates.
    pub fn new() -> Self {
        Self::default()
    }

    /// A compiler resolving entity fields of `target_model` through `catalog`.
    pub fn with_catalog(catalog: &'a dyn ModelCatalog, target_model: &'a str) -> Self {
        Self {
            catalog: Some(catalog),
            target_model: Some(target_model),
        }
    }

    pub fn compile(
        &self,
        entries: &[FilterEntry],
        connectives: &[Connective],
    ) -> Result<QueryStructure, CompileError> {
        if entries.is_empty() {
            return Err(CompileError::NoFilters);
        }
        if connectives.len() + 1 != entries.len() {
            warn!(
                entries = entries.len(),
                connectives = connectives.len(),
                "connective count does not match entry count, missing connectives default to or"
            );
        }

        let (clauses, includes) = entries
            .iter()
            .filter_map(|entry| self.compile_entry(entry))
            .fold(
                (Vec::new(), Vec::new()),
                |(mut clauses, mut includes), compiled| {
                    match compiled {
                        Compiled::Where(clause) => clauses.push(clause),
                        Compiled::Include(include) => includes.push(include),
                    }
                    (clauses, includes)
                },
            );

        Ok(QueryStructure {
            where_options: fold_clauses(clauses, connectives),
            include_options: (!includes.is_empty()).then_some(includes),
        })
    }

    fn compile_entry(&self, entry: &FilterEntry) -> Option<Compiled> {
        let (Some(term), Some(field)) = (&entry.filter, &entry.field) else {
            debug!("skipping entry without filter term or field descriptor");
            return None;
        };
        let name = field.field_name.as_str();
        let (Some(field_type), false) = (field.field_type, name.is_empty()) else {
            debug!(field = name, "skipping entry without field name or type");
            return None;
        };
        let Some(operator) = term.operator.as_deref().filter(|op| !op.is_empty()) else {
            debug!(field = name, "skipping entry without operator");
            return None;
        };
        if term.value.is_unusable() {
            debug!(field = name, operator, "skipping entry with unusable value");
            return None;
        }

        let (value, upper) = term.value.bounds();
        match field_type {
            FieldType::String => text_clause(operator, value, name).map(Compiled::Where),
            FieldType::Number => number_clause(operator, value, upper, name).map(Compiled::Where),
            FieldType::Date => date_clause(operator, value, upper, name).map(Compiled::Where),
            FieldType::Boolean => Some(Compiled::Where(boolean_clause(value, name))),
            FieldType::Entity => Some(self.resolve_entity(operator, &term.value, name)),
        }
    }

    fn resolve_entity(&self, operator: &str, value: &FilterValue, field: &str) -> Compiled {
        let plain = || Compiled::Where(entity_clause(operator, value, field));

        let (Some(catalog), Some(model)) = (self.catalog, self.target_model) else {
            return plain();
        };
        if catalog.has_own_attribute(model, field) {
            return plain();
        }

        let alias = association_alias(field, model);
        let Some(association) = catalog.resolve_association(model, &alias) else {
            debug!(field, %alias, "association alias not found, using plain predicate");
            return plain();
        };
        let singular = naive_singularize(field);
        let Some(joined) = catalog
            .resolve_model(singular)
            .or_else(|| catalog.resolve_model(&association.target))
        else {
            debug!(field, singular, "associated model not in catalog, using plain predicate");
            return plain();
        };

        let foreign_key = association
            .foreign_key
            .clone()
            .unwrap_or_else(|| format!("{}_id", model.to_lowercase()));
        Compiled::Include(IncludeDescriptor {
            model: joined,
            alias,
            foreign_key,
            ids: value.to_list(),
        })
    }
}

/// Compiles without a catalog unless both `catalog` and `target_model` are given.
pub fn compile(
    entries: &[FilterEntry],
    connectives: &[Connective],
    catalog: Option<&dyn ModelCatalog>,
    target_model: Option<&str>,
) -> Result<QueryStructure, CompileError> {
    let compiler = match (catalog, target_model) {
        (Some(catalog), Some(model)) => QueryCompiler::with_catalog(catalog, model),
        _ => QueryCompiler::new(),
    };
    compiler.compile(entries, connectives)
}

/// Folds clauses pairwise until a single node remains.
///
/// Pair `k` (clauses `2k` and `2k+1`) is combined with connective `k`; an odd
/// trailing clause is carried through untouched. Each further pass drops the
/// first connective and pairs again. Missing connectives default to `or` and
/// surplus connectives are ignored. Returns `None` for an empty list.
pub fn fold_clauses(clauses: Vec<Clause>, connectives: &[Connective]) -> Option<Clause> {
    if clauses.len() <= 1 {
        return clauses.into_iter().next();
    }

    let mut pending = clauses.into_iter();
    let folded: Vec<Clause> = std::iter::from_fn(|| {
        let left = pending.next()?;
        Some((left, pending.next()))
    })
    .enumerate()
    .map(|(pair, (left, right))| match right {
        Some(right) => connectives
            .get(pair)
            .copied()
            .unwrap_or_default()
            .combine(left, right),
        None => left,
    })
    .collect();

    fold_clauses(folded, connectives.get(1..).unwrap_or_default())
}
