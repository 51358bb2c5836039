use std::cmp::Ordering;

use bson::{Bson, Document};

use crate::condition::PullCondition;
use crate::error::UpdateError;
use crate::path::{self, Path};
use crate::value::{compare, type_name, values_equal};

static NULL: Bson = Bson::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// One key of a `$sort` document, e.g. `{ "score": -1 }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: Path,
    pub direction: SortDirection,
}

/// The `$sort` modifier of `$push`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushSort {
    /// Sort whole elements.
    Value(SortDirection),
    /// Sort document elements by one or more fields.
    Fields(Vec<Sort>),
}

/// A validated `$push` operand. A bare value is `each: vec![value]` with no
/// modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct PushUpdate {
    pub each: Vec<Bson>,
    pub position: Option<i64>,
    pub sort: Option<PushSort>,
    pub slice: Option<i64>,
}

/// The end `$pop` removes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopEnd {
    First,
    Last,
}

fn not_an_array(operator: &'static str, path: &Path, found: &Bson) -> UpdateError {
    UpdateError::type_mismatch(
        operator,
        path,
        format!("field must be an array but is of type {}", type_name(found)),
    )
}

/// The array at `path`, created empty when missing. The flag is true when
/// the array was created.
fn array_for_write<'a>(
    doc: &'a mut Document,
    path: &Path,
    operator: &'static str,
) -> Result<(&'a mut Vec<Bson>, bool), UpdateError> {
    let created = match path::get_for_write(doc, path)? {
        None => true,
        Some(Bson::Array(_)) => false,
        Some(other) => return Err(not_an_array(operator, path, other)),
    };
    if created {
        path::set(doc, path, Bson::Array(Vec::new()))?;
    }
    match path::get_mut_for_write(doc, path)? {
        Some(Bson::Array(arr)) => Ok((arr, created)),
        Some(other) => Err(not_an_array(operator, path, other)),
        None => Err(UpdateError::path_conflict(path, "array could not be created")),
    }
}

/// The array at `path`, or `None` when the field is missing.
fn existing_array<'a>(
    doc: &'a mut Document,
    path: &Path,
    operator: &'static str,
) -> Result<Option<&'a mut Vec<Bson>>, UpdateError> {
    match path::get_mut(doc, path)? {
        None => Ok(None),
        Some(Bson::Array(arr)) => Ok(Some(arr)),
        Some(other) => Err(not_an_array(operator, path, other)),
    }
}

/// `$addToSet`: append each value not already present.
pub(crate) fn add_to_set(doc: &mut Document, path: &Path, values: &[Bson]) -> Result<bool, UpdateError> {
    let (arr, mut changed) = array_for_write(doc, path, "$addToSet")?;
    for value in values {
        if !arr.iter().any(|e| values_equal(e, value)) {
            arr.push(value.clone());
            changed = true;
        }
    }
    Ok(changed)
}

/// `$push`: insert at the position, then sort, then slice.
pub(crate) fn push(doc: &mut Document, path: &Path, update: &PushUpdate) -> Result<bool, UpdateError> {
    let (arr, created) = array_for_write(doc, path, "$push")?;
    let before = (update.sort.is_some() || update.slice.is_some()).then(|| arr.clone());

    let at = insert_position(arr.len(), update.position);
    arr.splice(at..at, update.each.iter().cloned());

    if let Some(sort) = &update.sort {
        sort_elements(arr, sort);
    }
    if let Some(n) = update.slice {
        slice(arr, n);
    }

    let changed = match before {
        Some(before) => before != *arr,
        None => !update.each.is_empty(),
    };
    Ok(created || changed)
}

/// Negative positions count from the end. Out-of-range positions clamp.
fn insert_position(len: usize, position: Option<i64>) -> usize {
    match position {
        None => len,
        Some(p) if p < 0 => {
            let back = usize::try_from(p.unsigned_abs()).unwrap_or(usize::MAX);
            len.saturating_sub(back)
        }
        Some(p) => usize::try_from(p).unwrap_or(usize::MAX).min(len),
    }
}

fn sort_elements(arr: &mut [Bson], sort: &PushSort) {
    match sort {
        PushSort::Value(direction) => arr.sort_by(|a, b| direction.apply(compare(a, b))),
        PushSort::Fields(keys) => arr.sort_by(|a, b| {
            for key in keys {
                let ord = compare(sort_key(a, &key.field), sort_key(b, &key.field));
                let ord = key.direction.apply(ord);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        }),
    }
}

/// Missing fields and non-document elements sort as null.
fn sort_key<'a>(elem: &'a Bson, field: &Path) -> &'a Bson {
    match elem {
        Bson::Document(d) => path::get(d, field).ok().flatten().unwrap_or(&NULL),
        _ => &NULL,
    }
}

/// `n >= 0` keeps the first `n` elements, `n < 0` the last `|n|`.
fn slice(arr: &mut Vec<Bson>, n: i64) {
    if n >= 0 {
        arr.truncate(usize::try_from(n).unwrap_or(usize::MAX));
    } else {
        let keep = usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX);
        if arr.len() > keep {
            arr.drain(..arr.len() - keep);
        }
    }
}

/// `$pop`
pub(crate) fn pop(doc: &mut Document, path: &Path, end: PopEnd) -> Result<bool, UpdateError> {
    let Some(arr) = existing_array(doc, path, "$pop")? else {
        return Ok(false);
    };
    if arr.is_empty() {
        return Ok(false);
    }
    match end {
        PopEnd::First => {
            arr.remove(0);
        }
        PopEnd::Last => {
            arr.pop();
        }
    }
    Ok(true)
}

/// `$pull`: remove every element matching the condition.
pub(crate) fn pull(doc: &mut Document, path: &Path, condition: &PullCondition) -> Result<bool, UpdateError> {
    let Some(arr) = existing_array(doc, path, "$pull")? else {
        return Ok(false);
    };
    let len = arr.len();
    arr.retain(|e| !condition.matches(e));
    Ok(arr.len() != len)
}

/// `$pullAll`: remove every element equal to one of `values`.
pub(crate) fn pull_all(doc: &mut Document, path: &Path, values: &[Bson]) -> Result<bool, UpdateError> {
    let Some(arr) = existing_array(doc, path, "$pullAll")? else {
        return Ok(false);
    };
    let len = arr.len();
    arr.retain(|e| !values.iter().any(|v| values_equal(e, v)));
    Ok(arr.len() != len)
}
