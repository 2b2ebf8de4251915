//! SQL compiler that renders a compiled [`QueryStructure`] into a SQL query
//! using sea-query.

use crate::ast::{Clause, Comparison, DatePart, IncludeDescriptor, LikePattern, Literal, Predicate, QueryStructure};
use crate::catalog::ModelCatalog;
use sea_query::{
    Asterisk, Expr, Func, Iden, JoinType, LikeExpr, PostgresQueryBuilder, SelectStatement,
    SimpleExpr, Value,
};

/// Table identifier for sea-query
#[derive(Debug, Clone)]
pub enum TableName {
    /// A physical table
    Table(String),
    /// An association alias used for a joined table
    Alias(String),
}

impl Iden for TableName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        match self {
            TableName::Table(name) | TableName::Alias(name) => write!(s, "{}", name).unwrap(),
        }
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Result of SQL compilation
#[derive(Debug)]
pub struct CompileResult {
    pub sql: String,
    /// Number of joins emitted for include descriptors
    pub join_count: usize,
}

/// Renders query structures against one base table
pub struct SqlCompiler {
    base_table: String,
}

impl SqlCompiler {
    pub fn new(base_table: &str) -> Self {
        Self {
            base_table: base_table.to_string(),
        }
    }

    /// Uses the catalog's table for `model`, or the lowercased model name
    pub fn for_model(catalog: &dyn ModelCatalog, model: &str) -> Self {
        let table = catalog
            .resolve_model(model)
            .map(|model| model.table)
            .unwrap_or_else(|| model.to_lowercase());
        Self { base_table: table }
    }

    pub fn base_table(&self) -> &str {
        &self.base_table
    }

    /// Render the query into Postgres SQL
    pub fn compile(&self, query: &QueryStructure) -> CompileResult {
        let select = self.select(query);
        CompileResult {
            sql: select.to_string(PostgresQueryBuilder),
            join_count: query.include_options.as_ref().map_or(0, Vec::len),
        }
    }

    /// Build the SELECT statement: WHERE from `where_options`, one INNER JOIN per include
    pub fn select(&self, query: &QueryStructure) -> SelectStatement {
        let mut select = SelectStatement::new();
        select.from(self.table());
        select.column((self.table(), Asterisk));

        if let Some(clause) = &query.where_options {
            select.and_where(self.condition(clause));
        }

        if let Some(includes) = &query.include_options {
            // one-to-many joins may repeat base rows
            select.distinct();
            for include in includes {
                self.join_include(&mut select, include);
            }
        }

        select
    }

    fn table(&self) -> TableName {
        TableName::Table(self.base_table.clone())
    }

    fn join_include(&self, select: &mut SelectStatement, include: &IncludeDescriptor) {
        let joined = TableName::Alias(include.alias.clone());
        let on = Expr::col((joined.clone(), ColumnName(include.foreign_key.clone())))
            .equals((self.table(), ColumnName("id".to_string())));
        let on = on.and(
            Expr::col((joined.clone(), ColumnName("id".to_string())))
                .is_in(include.ids.iter().map(literal_to_value)),
        );

        select.join_as(
            JoinType::InnerJoin,
            TableName::Table(include.model.table.clone()),
            joined,
            on,
        );
    }

    /// Compile a clause tree into a boolean expression
    pub fn condition(&self, clause: &Clause) -> SimpleExpr {
        match clause {
            Clause::And(left, right) => self.condition(left).and(self.condition(right)),
            Clause::Or(left, right) => self.condition(left).or(self.condition(right)),
            Clause::Predicate(predicate) => self.compile_predicate(predicate),
        }
    }

    fn compile_predicate(&self, predicate: &Predicate) -> SimpleExpr {
        let col = || Expr::col((self.table(), ColumnName(predicate.field.clone())));

        match &predicate.comparison {
            Comparison::Eq(Literal::Null) | Comparison::IsNull => col().is_null(),
            Comparison::Ne(Literal::Null) | Comparison::IsNotNull => col().is_not_null(),
            Comparison::Eq(value) => col().eq(literal_to_value(value)),
            Comparison::Ne(value) => col().ne(literal_to_value(value)),
            Comparison::Gt(value) => col().gt(literal_to_value(value)),
            Comparison::Gte(value) => col().gte(literal_to_value(value)),
            Comparison::Lt(value) => col().lt(literal_to_value(value)),
            Comparison::Lte(value) => col().lte(literal_to_value(value)),
            Comparison::Between(low, high) => {
                col().between(literal_to_value(low), literal_to_value(high))
            }
            Comparison::In(values) => col().is_in(values.iter().map(literal_to_value)),
            Comparison::NotIn(values) => col().is_not_in(values.iter().map(literal_to_value)),
            Comparison::Like { pattern, negated } => {
                let lowered = Expr::expr(Func::lower(col()));
                let like = LikeExpr::new(like_pattern(pattern)).escape('\\');
                if *negated {
                    lowered.not_like(like)
                } else {
                    lowered.like(like)
                }
            }
            Comparison::DatePart { part, value } => {
                let unit = match part {
                    DatePart::Day => "DAY",
                    DatePart::Month => "MONTH",
                };
                let extract = Expr::cust_with_exprs(
                    format!("EXTRACT({} FROM $1)", unit),
                    [SimpleExpr::from(col())],
                );
                Expr::expr(extract).eq(*value)
            }
        }
    }
}

/// Lowercased LIKE pattern with `%`, `_` and `\` escaped in the user text
fn like_pattern(pattern: &LikePattern) -> String {
    match pattern {
        LikePattern::Contains(text) => format!("%{}%", escape_like_pattern(&text.to_lowercase())),
        LikePattern::StartsWith(text) => format!("{}%", escape_like_pattern(&text.to_lowercase())),
        LikePattern::EndsWith(text) => format!("%{}", escape_like_pattern(&text.to_lowercase())),
    }
}

pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Convert a Literal to a sea-query Value
fn literal_to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::String(None),
        Literal::Bool(b) => Value::Bool(Some(*b)),
        Literal::Integer(n) => Value::BigInt(Some(*n)),
        Literal::Float(f) => Value::Double(Some(*f)),
        Literal::Text(s) => Value::from(s.clone()),
        Literal::DateTime(dt) => Value::from(*dt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Connective, ModelRef};
    use crate::catalog::{ModelDescriptor, StaticCatalog};

    fn create_test_compiler() -> SqlCompiler {
        SqlCompiler::new("patients")
    }

    fn query(clause: Clause) -> QueryStructure {
        QueryStructure {
            where_options: Some(clause),
            include_options: None,
        }
    }

    #[test]
    fn test_simple_filter_compilation() {
        let compiler = create_test_compiler();
        let result = compiler.compile(&query(Clause::predicate(
            "status",
            Comparison::Eq(Literal::from("Open")),
        )));

        assert!(result.sql.contains(r#"FROM "patients""#));
        assert!(result.sql.contains(r#""patients"."status" = 'Open'"#));
        assert_eq!(result.join_count, 0);
    }

    #[test]
    fn test_connectives_render_as_and_or() {
        let compiler = create_test_compiler();
        let clause = Connective::Or.combine(
            Connective::And.combine(
                Clause::predicate("age", Comparison::Gte(Literal::Integer(18))),
                Clause::predicate("active", Comparison::Eq(Literal::Bool(true))),
            ),
            Clause::predicate("vip", Comparison::Eq(Literal::Bool(true))),
        );
        let sql = compiler.compile(&query(clause)).sql;

        assert!(sql.contains(" AND "));
        assert!(sql.contains(" OR "));
        assert!(sql.contains(r#""patients"."age" >= 18"#));
    }

    #[test]
    fn test_like_is_lowercased_and_escaped() {
        let compiler = create_test_compiler();
        let sql = compiler
            .compile(&query(Clause::predicate(
                "name",
                Comparison::Like {
                    pattern: LikePattern::Contains("AnA".to_string()),
                    negated: false,
                },
            )))
            .sql;
        assert!(sql.contains("LIKE '%ana%'"));
        assert!(sql.contains("ESCAPE"));

        assert_eq!(escape_like_pattern("50%_off"), "50\\%\\_off");
        assert_eq!(
            like_pattern(&LikePattern::StartsWith("Jo".to_string())),
            "jo%"
        );
    }

    #[test]
    fn test_between_and_in() {
        let compiler = create_test_compiler();
        let sql = compiler
            .compile(&query(Connective::And.combine(
                Clause::predicate(
                    "age",
                    Comparison::Between(Literal::Integer(18), Literal::Integer(65)),
                ),
                Clause::predicate(
                    "role_id",
                    Comparison::In(vec![Literal::Integer(1), Literal::Integer(2)]),
                ),
            )))
            .sql;
        assert!(sql.contains("BETWEEN 18 AND 65"));
        assert!(sql.contains("IN (1, 2)"));
    }

    #[test]
    fn test_null_comparisons() {
        let compiler = create_test_compiler();
        let sql = compiler
            .compile(&query(Clause::predicate("deleted_at", Comparison::Eq(Literal::Null))))
            .sql;
        assert!(sql.contains("IS NULL"));
    }

    #[test]
    fn test_date_part_extraction() {
        let compiler = create_test_compiler();
        let sql = compiler
            .compile(&query(Clause::predicate(
                "born",
                Comparison::DatePart {
                    part: DatePart::Month,
                    value: 3,
                },
            )))
            .sql;
        // sea-query wraps custom expressions in parentheses
        assert!(sql.contains(r#"(EXTRACT(MONTH FROM "patients"."born")) = 3"#));
    }

    #[test]
    fn test_include_becomes_join() {
        let catalog = StaticCatalog::new().with_model(
            "patient",
            ModelDescriptor::new().table("patients"),
        );
        let compiler = SqlCompiler::for_model(&catalog, "patient");
        assert_eq!(compiler.base_table(), "patients");

        let structure = QueryStructure {
            where_options: None,
            include_options: Some(vec![IncludeDescriptor {
                model: ModelRef {
                    name: "role".to_string(),
                    table: "roles".to_string(),
                },
                alias: "ALIASrolesALIASpatientALIAS".to_string(),
                foreign_key: "patient_id".to_string(),
                ids: vec![Literal::Integer(3)],
            }]),
        };
        let result = compiler.compile(&structure);

        assert_eq!(result.join_count, 1);
        assert!(result.sql.contains("SELECT DISTINCT"));
        assert!(result
            .sql
            .contains(r#"INNER JOIN "roles" AS "ALIASrolesALIASpatientALIAS""#));
        assert!(result.sql.contains(r#""ALIASrolesALIASpatientALIAS"."patient_id" = "patients"."id""#));
        assert!(!result.sql.contains("WHERE"));
    }

    #[test]
    fn test_unknown_model_uses_lowercase_table() {
        let catalog = StaticCatalog::new();
        assert_eq!(SqlCompiler::for_model(&catalog, "Menu").base_table(), "menu");
    }
}
