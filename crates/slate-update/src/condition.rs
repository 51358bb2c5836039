//! Element conditions for `$pull`.
//!
//! A `$pull` operand is one of:
//! - a plain value: elements equal to it are removed
//! - a regex: string elements matching it are removed
//! - a document of comparison operators (`{ "$gte": 6 }`): evaluated against
//!   each element
//! - a document of field conditions (`{ "score": { "$lt": 5 }, "item": "B" }`):
//!   evaluated as a query against each document element

use std::cmp::Ordering;

use bson::{Bson, Document};
use regex::Regex;

use crate::path::{self, Path};
use crate::value::{canonical_rank, compare, values_equal};

/// Parse error for `$pull` conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionError(pub String);

impl std::fmt::Display for ConditionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "condition parse error: {}", self.0)
    }
}

impl std::error::Error for ConditionError {}

/// Comparison applied to a single value.
#[derive(Debug, Clone)]
pub enum Predicate {
    Eq(Bson),
    Ne(Bson),
    Gt(Bson),
    Gte(Bson),
    Lt(Bson),
    Lte(Bson),
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    Regex(Regex),
    Exists(bool),
    Not(Vec<Predicate>),
}

/// Query over the fields of a document element.
#[derive(Debug, Clone)]
pub enum Query {
    And(Vec<Query>),
    Or(Vec<Query>),
    Field(Path, Vec<Predicate>),
}

#[derive(Debug, Clone)]
pub enum PullCondition {
    Equals(Bson),
    Pattern { regex: Regex, literal: Bson },
    Predicate(Vec<Predicate>),
    Query(Query),
}

const PREDICATE_OPERATORS: [&str; 12] = [
    "$eq", "$ne", "$gt", "$gte", "$lt", "$lte", "$in", "$nin", "$regex", "$options", "$exists",
    "$not",
];

impl PullCondition {
    /// Parse a `$pull` operand.
    pub fn parse(operand: &Bson) -> Result<PullCondition, ConditionError> {
        match operand {
            Bson::Document(doc) if !doc.is_empty() => {
                if doc.keys().all(|k| PREDICATE_OPERATORS.contains(&k.as_str())) {
                    Ok(PullCondition::Predicate(parse_predicates(doc)?))
                } else {
                    Ok(PullCondition::Query(parse_query(doc)?))
                }
            }
            Bson::RegularExpression(re) => Ok(PullCondition::Pattern {
                regex: build_regex(re.pattern.as_str(), Some(re.options.as_str()))?,
                literal: operand.clone(),
            }),
            other => Ok(PullCondition::Equals(other.clone())),
        }
    }

    /// True if `element` should be removed.
    pub fn matches(&self, element: &Bson) -> bool {
        match self {
            PullCondition::Equals(value) => values_equal(element, value),
            PullCondition::Pattern { regex, literal } => {
                regex_matches(regex, element) || values_equal(element, literal)
            }
            PullCondition::Predicate(predicates) => {
                predicates.iter().all(|p| field_matches(p, Some(element)))
            }
            PullCondition::Query(query) => match element {
                Bson::Document(doc) => query_matches(query, doc),
                _ => false,
            },
        }
    }
}

// ── Parsing ─────────────────────────────────────────────────────

fn parse_query(doc: &Document) -> Result<Query, ConditionError> {
    let mut children = Vec::new();

    for (key, value) in doc {
        match key.as_str() {
            "$and" => children.push(Query::And(parse_logical_array(value)?)),
            "$or" => children.push(Query::Or(parse_logical_array(value)?)),
            k if k.starts_with('$') => {
                return Err(ConditionError(format!("unknown top-level operator: {k}")));
            }
            _ => {
                let path = Path::parse(key).map_err(|e| ConditionError(e.to_string()))?;
                children.push(Query::Field(path, parse_field_condition(value)?));
            }
        }
    }

    if children.len() == 1 {
        Ok(children.remove(0))
    } else {
        Ok(Query::And(children))
    }
}

fn parse_logical_array(value: &Bson) -> Result<Vec<Query>, ConditionError> {
    let arr = match value {
        Bson::Array(a) => a,
        _ => return Err(ConditionError("$and/$or value must be an array".into())),
    };

    let mut children = Vec::new();
    for elem in arr {
        match elem {
            Bson::Document(sub) if !sub.is_empty() => children.push(parse_query(sub)?),
            _ => {
                return Err(ConditionError(
                    "$and/$or array elements must be non-empty documents".into(),
                ));
            }
        }
    }

    if children.is_empty() {
        return Err(ConditionError("$and/$or array must not be empty".into()));
    }
    Ok(children)
}

/// Either an operator sub-document or an implicit `$eq`.
fn parse_field_condition(value: &Bson) -> Result<Vec<Predicate>, ConditionError> {
    match value {
        Bson::Document(sub) if sub.keys().next().is_some_and(|k| k.starts_with('$')) => {
            parse_predicates(sub)
        }
        Bson::RegularExpression(re) => Ok(vec![Predicate::Regex(build_regex(
            re.pattern.as_str(),
            Some(re.options.as_str()),
        )?)]),
        other => Ok(vec![Predicate::Eq(other.clone())]),
    }
}

fn parse_predicates(doc: &Document) -> Result<Vec<Predicate>, ConditionError> {
    let mut predicates = Vec::new();

    for (op, value) in doc {
        let predicate = match op.as_str() {
            "$eq" => Predicate::Eq(value.clone()),
            "$ne" => Predicate::Ne(value.clone()),
            "$gt" => Predicate::Gt(value.clone()),
            "$gte" => Predicate::Gte(value.clone()),
            "$lt" => Predicate::Lt(value.clone()),
            "$lte" => Predicate::Lte(value.clone()),
            "$in" => Predicate::In(parse_list(op, value)?),
            "$nin" => Predicate::Nin(parse_list(op, value)?),
            "$exists" => match value {
                Bson::Boolean(b) => Predicate::Exists(*b),
                _ => return Err(ConditionError("$exists value must be a boolean".into())),
            },
            "$regex" => parse_regex(doc)?,
            "$options" => {
                if !doc.contains_key("$regex") {
                    return Err(ConditionError("$options without $regex".into()));
                }
                continue;
            }
            "$not" => match value {
                Bson::Document(sub) if !sub.is_empty() => Predicate::Not(parse_predicates(sub)?),
                Bson::RegularExpression(re) => Predicate::Not(vec![Predicate::Regex(
                    build_regex(re.pattern.as_str(), Some(re.options.as_str()))?,
                )]),
                _ => {
                    return Err(ConditionError(
                        "$not needs a regex or a document of operators".into(),
                    ));
                }
            },
            k => return Err(ConditionError(format!("unknown field operator: {k}"))),
        };
        predicates.push(predicate);
    }

    if predicates.is_empty() {
        return Err(ConditionError("empty operator document".into()));
    }
    Ok(predicates)
}

fn parse_list(op: &str, value: &Bson) -> Result<Vec<Bson>, ConditionError> {
    match value {
        Bson::Array(items) => Ok(items.clone()),
        _ => Err(ConditionError(format!("{op} needs an array"))),
    }
}

/// Parse `$regex` together with its optional `$options` sibling.
fn parse_regex(doc: &Document) -> Result<Predicate, ConditionError> {
    let options = match doc.get("$options") {
        None => None,
        Some(Bson::String(s)) => Some(s.as_str()),
        Some(_) => return Err(ConditionError("$options value must be a string".into())),
    };

    let re = match doc.get("$regex") {
        Some(Bson::String(pattern)) => build_regex(pattern, options)?,
        Some(Bson::RegularExpression(re)) => {
            let opts = options.unwrap_or(re.options.as_str());
            build_regex(re.pattern.as_str(), Some(opts))?
        }
        _ => return Err(ConditionError("$regex value must be a string".into())),
    };
    Ok(Predicate::Regex(re))
}

fn build_regex(pattern: &str, options: Option<&str>) -> Result<Regex, ConditionError> {
    let full_pattern = match options {
        Some(opts) if !opts.is_empty() => {
            let mut prefix = String::with_capacity(4 + opts.len() + pattern.len());
            prefix.push_str("(?");
            for ch in opts.chars() {
                match ch {
                    'i' | 's' | 'm' | 'x' => prefix.push(ch),
                    c => return Err(ConditionError(format!("unknown regex option: {c}"))),
                }
            }
            prefix.push(')');
            prefix.push_str(pattern);
            prefix
        }
        _ => pattern.to_string(),
    };

    Regex::new(&full_pattern).map_err(|e| ConditionError(format!("invalid regex pattern: {e}")))
}

// ── Evaluation ──────────────────────────────────────────────────

fn query_matches(query: &Query, doc: &Document) -> bool {
    match query {
        Query::And(children) => children.iter().all(|c| query_matches(c, doc)),
        Query::Or(children) => children.iter().any(|c| query_matches(c, doc)),
        Query::Field(path, predicates) => {
            let value = path::get(doc, path).ok().flatten();
            predicates.iter().all(|p| field_matches(p, value))
        }
    }
}

/// Evaluate a predicate against a possibly-missing value. Array values match
/// when the array itself or any of its elements matches.
fn field_matches(predicate: &Predicate, value: Option<&Bson>) -> bool {
    match predicate {
        Predicate::Exists(expected) => value.is_some() == *expected,
        Predicate::Ne(v) => !field_matches(&Predicate::Eq(v.clone()), value),
        Predicate::Nin(vs) => !field_matches(&Predicate::In(vs.clone()), value),
        Predicate::Not(inner) => !inner.iter().all(|p| field_matches(p, value)),
        _ => match value {
            Some(Bson::Array(items)) => {
                value_matches(predicate, value) || items.iter().any(|e| value_matches(predicate, Some(e)))
            }
            _ => value_matches(predicate, value),
        },
    }
}

fn value_matches(predicate: &Predicate, value: Option<&Bson>) -> bool {
    let Some(value) = value else {
        // A missing field compares equal to null and to nothing else.
        return match predicate {
            Predicate::Eq(Bson::Null) | Predicate::Gte(Bson::Null) | Predicate::Lte(Bson::Null) => {
                true
            }
            Predicate::In(vs) => vs.iter().any(|v| matches!(v, Bson::Null)),
            _ => false,
        };
    };

    match predicate {
        Predicate::Eq(v) => values_equal(value, v),
        Predicate::Gt(v) => ordered(value, v, |o| o == Ordering::Greater),
        Predicate::Gte(v) => ordered(value, v, |o| o != Ordering::Less),
        Predicate::Lt(v) => ordered(value, v, |o| o == Ordering::Less),
        Predicate::Lte(v) => ordered(value, v, |o| o != Ordering::Greater),
        Predicate::In(vs) => vs.iter().any(|v| match v {
            Bson::RegularExpression(re) => {
                build_regex(re.pattern.as_str(), Some(re.options.as_str()))
                    .is_ok_and(|r| regex_matches(&r, value))
                    || values_equal(value, v)
            }
            _ => values_equal(value, v),
        }),
        Predicate::Regex(re) => regex_matches(re, value),
        Predicate::Ne(_) | Predicate::Nin(_) | Predicate::Exists(_) | Predicate::Not(_) => {
            field_matches(predicate, Some(value))
        }
    }
}

/// Range comparisons only match values in the same type bracket.
fn ordered(value: &Bson, operand: &Bson, predicate: fn(Ordering) -> bool) -> bool {
    canonical_rank(value) == canonical_rank(operand) && predicate(compare(value, operand))
}

fn regex_matches(re: &Regex, value: &Bson) -> bool {
    match value {
        Bson::String(s) | Bson::Symbol(s) => re.is_match(s),
        _ => false,
    }
}
