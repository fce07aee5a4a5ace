//! Filter expression engine.
//!
//! A minimal boolean DSL over dotted field paths, evaluated against the
//! denormalized JSON view of a resource (nested tag/author objects, not the
//! id-list form):
//!
//! | Form            | Meaning                                  |
//! |-----------------|------------------------------------------|
//! | `field:value`   | equality                                 |
//! | `field:-value`  | negation                                 |
//! | `field:[a,b]`   | set membership                           |
//! | `field:-[a,b]`  | negated set membership                   |
//! | `a:x+b:y`       | conjunction                              |
//!
//! Convenience aliases are rewritten to canonical paths before evaluation:
//! `tag`/`tags` -> `tags.slug`, `author`/`authors` -> `authors.slug`,
//! `primary_tag` -> `primary_tag.slug`, `primary_author` ->
//! `primary_author.slug`. Path traversal maps over arrays, so `tags.slug`
//! yields every tag slug of a post and equality holds if *any* element
//! matches (and negation only if *none* does).

use serde_json::Value as JsonValue;

use crate::core::RouteError;

// ============================================================================
// Filter
// ============================================================================

/// A compiled filter expression.
#[derive(Debug, Clone)]
pub struct Filter {
    source: String,
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
struct Clause {
    /// Canonical dotted path, already alias-expanded.
    path: Vec<String>,
    predicate: Predicate,
}

#[derive(Debug, Clone)]
enum Predicate {
    Equals(String),
    NotEquals(String),
    AnyOf(Vec<String>),
    NoneOf(Vec<String>),
}

impl Filter {
    /// Compile a filter expression.
    ///
    /// Malformed expressions (empty field, empty value, missing `:`,
    /// unterminated `[`) are validation errors.
    pub fn compile(expression: &str) -> Result<Self, RouteError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(RouteError::validation("empty filter expression"));
        }

        let clauses = split_conjunction(trimmed)
            .into_iter()
            .map(|part| parse_clause(part, trimmed))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: trimmed.to_string(),
            clauses,
        })
    }

    /// The expression this filter was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against a denormalized resource view.
    ///
    /// Pure and side-effect free. Errors only on a structurally unusable
    /// subject (non-object root); a clause over a missing field is simply
    /// a non-match (or a match, for negation).
    pub fn matches(&self, subject: &JsonValue) -> Result<bool, RouteError> {
        if !subject.is_object() {
            return Err(RouteError::validation(format!(
                "filter `{}` evaluated against a non-object value",
                self.source
            )));
        }

        for clause in &self.clauses {
            let mut leaves = Vec::new();
            collect_leaves(subject, &clause.path, &mut leaves);

            let hit = match &clause.predicate {
                Predicate::Equals(needle) => leaves.iter().any(|v| scalar_eq(v, needle)),
                Predicate::NotEquals(needle) => !leaves.iter().any(|v| scalar_eq(v, needle)),
                Predicate::AnyOf(needles) => leaves
                    .iter()
                    .any(|v| needles.iter().any(|n| scalar_eq(v, n))),
                Predicate::NoneOf(needles) => !leaves
                    .iter()
                    .any(|v| needles.iter().any(|n| scalar_eq(v, n))),
            };

            if !hit {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Split on `+` at the top level (never inside a `[...]` list).
fn split_conjunction(expression: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in expression.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '+' if depth == 0 => {
                parts.push(&expression[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&expression[start..]);
    parts
}

fn parse_clause(part: &str, expression: &str) -> Result<Clause, RouteError> {
    let part = part.trim();
    let Some((field, value)) = part.split_once(':') else {
        return Err(RouteError::validation(format!(
            "filter `{expression}`: clause `{part}` is missing `:`"
        )));
    };

    let field = field.trim();
    if field.is_empty() {
        return Err(RouteError::validation(format!(
            "filter `{expression}`: clause with empty field"
        )));
    }

    let value = value.trim();
    let (negated, value) = match value.strip_prefix('-') {
        Some(rest) => (true, rest.trim()),
        None => (false, value),
    };

    let predicate = if let Some(inner) = value.strip_prefix('[') {
        let Some(inner) = inner.strip_suffix(']') else {
            return Err(RouteError::validation(format!(
                "filter `{expression}`: unterminated `[` in clause `{part}`"
            )));
        };
        let items: Vec<String> = inner
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if items.is_empty() {
            return Err(RouteError::validation(format!(
                "filter `{expression}`: empty set in clause `{part}`"
            )));
        }
        if negated {
            Predicate::NoneOf(items)
        } else {
            Predicate::AnyOf(items)
        }
    } else {
        if value.is_empty() {
            return Err(RouteError::validation(format!(
                "filter `{expression}`: clause `{part}` has no value"
            )));
        }
        if negated {
            Predicate::NotEquals(value.to_string())
        } else {
            Predicate::Equals(value.to_string())
        }
    };

    Ok(Clause {
        path: expand_field(field),
        predicate,
    })
}

/// Rewrite convenience aliases to canonical dotted paths.
fn expand_field(field: &str) -> Vec<String> {
    let canonical = match field {
        "author" | "authors" => "authors.slug",
        "tag" | "tags" => "tags.slug",
        "primary_tag" => "primary_tag.slug",
        "primary_author" => "primary_author.slug",
        other => other,
    };
    canonical.split('.').map(str::to_string).collect()
}

// ============================================================================
// Evaluation
// ============================================================================

/// Walk a dotted path, fanning out over arrays, collecting leaf values.
fn collect_leaves<'a>(value: &'a JsonValue, path: &[String], out: &mut Vec<&'a JsonValue>) {
    match value {
        JsonValue::Array(items) => {
            for item in items {
                collect_leaves(item, path, out);
            }
        }
        _ if path.is_empty() => out.push(value),
        JsonValue::Object(map) => {
            if let Some(next) = map.get(&path[0]) {
                collect_leaves(next, &path[1..], out);
            }
        }
        // Scalar with path segments left over: dead end.
        _ => {}
    }
}

/// Compare a JSON scalar against the clause's text value.
fn scalar_eq(value: &JsonValue, needle: &str) -> bool {
    match value {
        JsonValue::String(s) => s == needle,
        JsonValue::Bool(b) => needle == if *b { "true" } else { "false" },
        JsonValue::Number(n) => n.to_string() == needle,
        _ => false,
    }
}
