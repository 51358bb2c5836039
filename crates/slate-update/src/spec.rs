use std::cmp::Ordering;

use bson::{Bson, Document};
use tracing::trace;

use crate::condition::PullCondition;
use crate::error::UpdateError;
use crate::operator::UpdateOperator;
use crate::ops::array::{self, PopEnd, PushSort, PushUpdate, Sort, SortDirection};
use crate::ops::field::{self, BitOp, Bound, DateKind};
use crate::options::UpdateOptions;
use crate::path::Path;
use crate::value::{as_integer, compare, is_numeric, type_name};

/// A validated operand, one variant per operator.
#[derive(Debug, Clone)]
pub enum FieldUpdate {
    Set(Bson),
    Unset,
    SetOnInsert(Bson),
    CurrentDate(DateKind),
    Inc(Bson),
    Mul(Bson),
    Min(Bson),
    Max(Bson),
    Rename(Path),
    Bit(Vec<(BitOp, Bson)>),
    AddToSet(Vec<Bson>),
    Push(PushUpdate),
    Pop(PopEnd),
    Pull(PullCondition),
    PullAll(Vec<Bson>),
}

impl FieldUpdate {
    pub fn operator(&self) -> UpdateOperator {
        match self {
            FieldUpdate::Set(_) => UpdateOperator::Set,
            FieldUpdate::Unset => UpdateOperator::Unset,
            FieldUpdate::SetOnInsert(_) => UpdateOperator::SetOnInsert,
            FieldUpdate::CurrentDate(_) => UpdateOperator::CurrentDate,
            FieldUpdate::Inc(_) => UpdateOperator::Inc,
            FieldUpdate::Mul(_) => UpdateOperator::Mul,
            FieldUpdate::Min(_) => UpdateOperator::Min,
            FieldUpdate::Max(_) => UpdateOperator::Max,
            FieldUpdate::Rename(_) => UpdateOperator::Rename,
            FieldUpdate::Bit(_) => UpdateOperator::Bit,
            FieldUpdate::AddToSet(_) => UpdateOperator::AddToSet,
            FieldUpdate::Push(_) => UpdateOperator::Push,
            FieldUpdate::Pop(_) => UpdateOperator::Pop,
            FieldUpdate::Pull(_) => UpdateOperator::Pull,
            FieldUpdate::PullAll(_) => UpdateOperator::PullAll,
        }
    }
}

/// One `(operator, path, operand)` entry of an update document.
#[derive(Debug, Clone)]
pub struct FieldMutation {
    pub path: Path,
    pub update: FieldUpdate,
}

impl FieldMutation {
    /// Apply to `doc`. Returns true if the document changed.
    pub fn apply(&self, doc: &mut Document, options: &UpdateOptions) -> Result<bool, UpdateError> {
        let path = &self.path;
        match &self.update {
            FieldUpdate::Set(value) => field::set(doc, path, value),
            FieldUpdate::Unset => field::unset(doc, path),
            FieldUpdate::SetOnInsert(value) => {
                field::set_on_insert(doc, path, value, options.is_insert)
            }
            FieldUpdate::CurrentDate(kind) => field::current_date(doc, path, *kind, options.now),
            FieldUpdate::Inc(amount) => field::inc(doc, path, amount),
            FieldUpdate::Mul(factor) => field::mul(doc, path, factor),
            FieldUpdate::Min(value) => field::min_max(doc, path, value, Bound::Min),
            FieldUpdate::Max(value) => field::min_max(doc, path, value, Bound::Max),
            FieldUpdate::Rename(to) => field::rename(doc, path, to),
            FieldUpdate::Bit(steps) => field::bit(doc, path, steps),
            FieldUpdate::AddToSet(values) => array::add_to_set(doc, path, values),
            FieldUpdate::Push(update) => array::push(doc, path, update),
            FieldUpdate::Pop(end) => array::pop(doc, path, *end),
            FieldUpdate::Pull(condition) => array::pull(doc, path, condition),
            FieldUpdate::PullAll(values) => array::pull_all(doc, path, values),
        }
    }
}

/// A parsed and validated update document such as
/// `{ "$set": { "a": 1 }, "$inc": { "n": 2 } }`.
///
/// Mutations are kept in document order: operators in the order they appear,
/// and within an operator, paths in the order they appear.
#[derive(Debug, Clone)]
pub struct UpdateSpec {
    mutations: Vec<FieldMutation>,
}

impl UpdateSpec {
    /// Parse an update document.
    ///
    /// # Errors
    ///
    /// - `EmptySpec` for `{}`
    /// - `UnknownOperator` for unrecognised keys, including bare field names
    /// - `InvalidPath` / `UnsupportedPath` for malformed paths
    /// - `InvalidOperand` for operands of the wrong shape
    /// - `UnsupportedRename` for nested `$rename` paths
    /// - `ConflictingOperators` when two entries touch overlapping paths
    pub fn parse(spec: &Document) -> Result<UpdateSpec, UpdateError> {
        if let Some(key) = spec.keys().find(|k| UpdateOperator::from_name(k).is_none()) {
            return Err(UpdateError::UnknownOperator(key.clone()));
        }
        if spec.is_empty() {
            return Err(UpdateError::EmptySpec);
        }

        let mut mutations = Vec::new();
        for (key, value) in spec {
            let operator = UpdateOperator::from_name(key)
                .ok_or_else(|| UpdateError::UnknownOperator(key.clone()))?;
            let fields = match value {
                Bson::Document(fields) => fields,
                other => {
                    return Err(UpdateError::invalid_operand(
                        operator.name(),
                        key,
                        format!("modifier must be a document, found {}", type_name(other)),
                    ));
                }
            };
            for (raw_path, operand) in fields {
                let path = Path::parse(raw_path)?;
                let update = parse_operand(operator, &path, operand)?;
                mutations.push(FieldMutation { path, update });
            }
        }

        check_conflicts(&mutations)?;
        Ok(UpdateSpec { mutations })
    }

    pub fn mutations(&self) -> &[FieldMutation] {
        &self.mutations
    }

    /// Apply every mutation to `doc` in order, stopping at the first error.
    /// Returns true if anything changed.
    ///
    /// On error `doc` may be partially updated; [`crate::apply_updates`]
    /// works on a copy and discards it.
    pub fn apply(&self, doc: &mut Document, options: &UpdateOptions) -> Result<bool, UpdateError> {
        let mut modified = false;
        for mutation in &self.mutations {
            let changed = mutation.apply(doc, options)?;
            trace!(
                operator = %mutation.update.operator(),
                path = %mutation.path,
                changed,
                "applied field update"
            );
            modified |= changed;
        }
        Ok(modified)
    }
}

/// Reject two entries whose paths are equal or nested in one another.
/// `$rename` claims both its source and its destination.
fn check_conflicts(mutations: &[FieldMutation]) -> Result<(), UpdateError> {
    let mut claimed: Vec<&Path> = Vec::with_capacity(mutations.len());
    for mutation in mutations {
        let mut paths = vec![&mutation.path];
        if let FieldUpdate::Rename(to) = &mutation.update {
            paths.push(to);
        }
        for path in &paths {
            if let Some(prior) = claimed.iter().find(|c| c.overlaps(path)) {
                return Err(UpdateError::ConflictingOperators {
                    path: path.to_string(),
                    conflict: prior.to_string(),
                });
            }
        }
        claimed.extend(paths);
    }
    Ok(())
}

// ── Operand parsing ─────────────────────────────────────────────

fn parse_operand(
    operator: UpdateOperator,
    path: &Path,
    operand: &Bson,
) -> Result<FieldUpdate, UpdateError> {
    let update = match operator {
        UpdateOperator::Set => FieldUpdate::Set(operand.clone()),
        UpdateOperator::Unset => FieldUpdate::Unset,
        UpdateOperator::SetOnInsert => FieldUpdate::SetOnInsert(operand.clone()),
        UpdateOperator::CurrentDate => FieldUpdate::CurrentDate(parse_date_kind(path, operand)?),
        UpdateOperator::Inc => FieldUpdate::Inc(numeric_operand("$inc", path, operand)?),
        UpdateOperator::Mul => FieldUpdate::Mul(numeric_operand("$mul", path, operand)?),
        UpdateOperator::Min => FieldUpdate::Min(operand.clone()),
        UpdateOperator::Max => FieldUpdate::Max(operand.clone()),
        UpdateOperator::Rename => FieldUpdate::Rename(parse_rename(path, operand)?),
        UpdateOperator::Bit => FieldUpdate::Bit(parse_bit(path, operand)?),
        UpdateOperator::AddToSet => FieldUpdate::AddToSet(parse_add_to_set(path, operand)?),
        UpdateOperator::Push => FieldUpdate::Push(parse_push(path, operand)?),
        UpdateOperator::Pop => FieldUpdate::Pop(parse_pop(path, operand)?),
        UpdateOperator::Pull => FieldUpdate::Pull(
            PullCondition::parse(operand)
                .map_err(|e| UpdateError::invalid_operand("$pull", path, e.0))?,
        ),
        UpdateOperator::PullAll => match operand {
            Bson::Array(values) => FieldUpdate::PullAll(values.clone()),
            other => {
                return Err(UpdateError::invalid_operand(
                    "$pullAll",
                    path,
                    format!("expected an array but found {}", type_name(other)),
                ));
            }
        },
    };
    Ok(update)
}

fn numeric_operand(operator: &'static str, path: &Path, operand: &Bson) -> Result<Bson, UpdateError> {
    if is_numeric(operand) {
        Ok(operand.clone())
    } else {
        Err(UpdateError::invalid_operand(
            operator,
            path,
            format!("cannot apply with a non-numeric argument of type {}", type_name(operand)),
        ))
    }
}

/// Positive removes the last element, negative the first.
fn parse_pop(path: &Path, operand: &Bson) -> Result<PopEnd, UpdateError> {
    let nan = matches!(operand, Bson::Double(f) if f.is_nan());
    if is_numeric(operand) && !nan {
        match compare(operand, &Bson::Int32(0)) {
            Ordering::Greater => return Ok(PopEnd::Last),
            Ordering::Less => return Ok(PopEnd::First),
            Ordering::Equal => {}
        }
    }
    Err(UpdateError::invalid_operand(
        "$pop",
        path,
        format!("expected a non-zero number but found {operand}"),
    ))
}

fn parse_date_kind(path: &Path, operand: &Bson) -> Result<DateKind, UpdateError> {
    match operand {
        Bson::Boolean(_) => Ok(DateKind::Date),
        Bson::Document(spec) if spec.len() == 1 => match spec.get("$type") {
            Some(Bson::String(t)) if t == "date" => Ok(DateKind::Date),
            Some(Bson::String(t)) if t == "timestamp" => Ok(DateKind::Timestamp),
            _ => Err(UpdateError::invalid_operand(
                "$currentDate",
                path,
                "$type must be \"date\" or \"timestamp\"",
            )),
        },
        other => Err(UpdateError::invalid_operand(
            "$currentDate",
            path,
            format!(
                "expected a boolean or a $type document but found {}",
                type_name(other)
            ),
        )),
    }
}

fn parse_rename(from: &Path, operand: &Bson) -> Result<Path, UpdateError> {
    let to = match operand {
        Bson::String(s) => Path::parse(s)?,
        other => {
            return Err(UpdateError::invalid_operand(
                "$rename",
                from,
                format!("target must be a string but found {}", type_name(other)),
            ));
        }
    };
    if from.len() > 1 || to.len() > 1 {
        return Err(UpdateError::UnsupportedRename {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    if from.overlaps(&to) {
        return Err(UpdateError::ConflictingOperators {
            path: to.to_string(),
            conflict: from.to_string(),
        });
    }
    Ok(to)
}

fn parse_bit(path: &Path, operand: &Bson) -> Result<Vec<(BitOp, Bson)>, UpdateError> {
    let spec = match operand {
        Bson::Document(spec) if !spec.is_empty() => spec,
        _ => {
            return Err(UpdateError::invalid_operand(
                "$bit",
                path,
                "expected a non-empty document of and/or/xor",
            ));
        }
    };

    let mut steps = Vec::with_capacity(spec.len());
    for (key, value) in spec {
        let op = match key.as_str() {
            "and" => BitOp::And,
            "or" => BitOp::Or,
            "xor" => BitOp::Xor,
            other => {
                return Err(UpdateError::invalid_operand(
                    "$bit",
                    path,
                    format!("unknown bitwise operation '{other}'"),
                ));
            }
        };
        match value {
            Bson::Int32(_) | Bson::Int64(_) => steps.push((op, value.clone())),
            other => {
                return Err(UpdateError::invalid_operand(
                    "$bit",
                    path,
                    format!("'{key}' needs a 32 or 64 bit integer, found {}", type_name(other)),
                ));
            }
        }
    }
    Ok(steps)
}

fn parse_each(operator: &'static str, path: &Path, value: &Bson) -> Result<Vec<Bson>, UpdateError> {
    match value {
        Bson::Array(items) => Ok(items.clone()),
        other => Err(UpdateError::invalid_operand(
            operator,
            path,
            format!("$each must be an array but found {}", type_name(other)),
        )),
    }
}

fn parse_add_to_set(path: &Path, operand: &Bson) -> Result<Vec<Bson>, UpdateError> {
    match operand {
        Bson::Document(spec) if spec.contains_key("$each") => {
            if spec.len() != 1 {
                return Err(UpdateError::invalid_operand(
                    "$addToSet",
                    path,
                    "$each cannot be combined with other fields",
                ));
            }
            match spec.get("$each") {
                Some(each) => parse_each("$addToSet", path, each),
                None => Ok(Vec::new()),
            }
        }
        value => Ok(vec![value.clone()]),
    }
}

fn parse_push(path: &Path, operand: &Bson) -> Result<PushUpdate, UpdateError> {
    let spec = match operand {
        Bson::Document(spec) if spec.contains_key("$each") => spec,
        value => {
            return Ok(PushUpdate {
                each: vec![value.clone()],
                position: None,
                sort: None,
                slice: None,
            });
        }
    };

    let mut update = PushUpdate {
        each: Vec::new(),
        position: None,
        sort: None,
        slice: None,
    };
    for (key, value) in spec {
        match key.as_str() {
            "$each" => update.each = parse_each("$push", path, value)?,
            "$position" => update.position = Some(integer_modifier(path, key, value)?),
            "$slice" => update.slice = Some(integer_modifier(path, key, value)?),
            "$sort" => update.sort = Some(parse_push_sort(path, value)?),
            other => {
                return Err(UpdateError::invalid_operand(
                    "$push",
                    path,
                    format!("unrecognized modifier '{other}'"),
                ));
            }
        }
    }
    Ok(update)
}

fn integer_modifier(path: &Path, key: &str, value: &Bson) -> Result<i64, UpdateError> {
    as_integer(value).ok_or_else(|| {
        UpdateError::invalid_operand(
            "$push",
            path,
            format!("{key} must be an integer but found {}", type_name(value)),
        )
    })
}

fn sort_direction(value: &Bson) -> Option<SortDirection> {
    match as_integer(value) {
        Some(1) => Some(SortDirection::Asc),
        Some(-1) => Some(SortDirection::Desc),
        _ => None,
    }
}

fn parse_push_sort(path: &Path, value: &Bson) -> Result<PushSort, UpdateError> {
    let invalid = || {
        UpdateError::invalid_operand(
            "$push",
            path,
            "$sort must be 1, -1 or a non-empty document of fields to 1 or -1",
        )
    };

    if let Some(direction) = sort_direction(value) {
        return Ok(PushSort::Value(direction));
    }
    let Bson::Document(spec) = value else {
        return Err(invalid());
    };
    if spec.is_empty() {
        return Err(invalid());
    }

    let mut keys = Vec::with_capacity(spec.len());
    for (field, dir) in spec {
        keys.push(Sort {
            field: Path::parse(field)?,
            direction: sort_direction(dir).ok_or_else(invalid)?,
        });
    }
    Ok(PushSort::Fields(keys))
}
