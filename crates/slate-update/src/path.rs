//! Dotted field paths and navigation over nested documents and arrays.
//!
//! A segment made only of digits addresses an array element when the
//! container it is applied to is an array, and is an ordinary field name
//! when the container is a document.

use std::fmt;

use bson::{Bson, Document};

use crate::error::UpdateError;
use crate::value::type_name;

/// Upper bound on the number of `null` elements a single write may pad an
/// array with.
pub const MAX_ARRAY_PADDING: usize = 1_500_000;

/// A parsed, immutable field path such as `"address.lines.0"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    raw: String,
    segments: Vec<String>,
}

impl Path {
    /// Parse a dotted path.
    ///
    /// # Errors
    ///
    /// `InvalidPath` for empty paths, empty segments and `$`-prefixed field
    /// names; `UnsupportedPath` for the positional segments `$`, `$[]` and
    /// `$[identifier]`.
    pub fn parse(raw: &str) -> Result<Path, UpdateError> {
        if raw.is_empty() {
            return Err(UpdateError::invalid_path(raw, "empty field path"));
        }

        let mut segments = Vec::new();
        for segment in raw.split('.') {
            if segment.is_empty() {
                return Err(UpdateError::invalid_path(
                    raw,
                    "field path contains an empty field name",
                ));
            }
            if segment == "$" || (segment.starts_with("$[") && segment.ends_with(']')) {
                return Err(UpdateError::UnsupportedPath {
                    path: raw.to_string(),
                    segment: segment.to_string(),
                });
            }
            if segment.starts_with('$') {
                return Err(UpdateError::invalid_path(
                    raw,
                    format!("dollar-prefixed field name '{segment}' is not valid"),
                ));
            }
            segments.push(segment.to_string());
        }

        Ok(Path {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub(crate) fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when the paths are equal or one is a segment-wise prefix of the
    /// other (`a.b` overlaps `a` and `a.b.c`, but not `a.bc`).
    pub fn overlaps(&self, other: &Path) -> bool {
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a == b)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Interpret a segment as an array index. Leading zeros are not indexes.
pub(crate) fn array_index(segment: &str) -> Option<usize> {
    let bytes = segment.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    segment.parse().ok()
}

/// Where a walk stopped because a non-container value sits in the middle of
/// the path: the segment index holding it, and its type.
struct Blocked {
    depth: usize,
    found: &'static str,
}

fn blocked_reason(path: &Path, blocked: &Blocked) -> String {
    format!(
        "cannot use the part '{}' to traverse the element '{}' of type {}",
        path.segments.get(blocked.depth + 1).map(String::as_str).unwrap_or_default(),
        path.segments[blocked.depth],
        blocked.found
    )
}

fn lookup<'a>(doc: &'a Document, segments: &[String]) -> Result<Option<&'a Bson>, Blocked> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(None);
    };
    let mut current = match doc.get(first) {
        Some(v) => v,
        None => return Ok(None),
    };
    for (depth, segment) in rest.iter().enumerate() {
        current = match current {
            Bson::Document(d) => match d.get(segment) {
                Some(v) => v,
                None => return Ok(None),
            },
            Bson::Array(arr) => match array_index(segment).and_then(|i| arr.get(i)) {
                Some(v) => v,
                None => return Ok(None),
            },
            other => {
                return Err(Blocked {
                    depth,
                    found: type_name(other),
                });
            }
        };
    }
    Ok(Some(current))
}

fn lookup_mut<'a>(
    doc: &'a mut Document,
    segments: &[String],
) -> Result<Option<&'a mut Bson>, Blocked> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(None);
    };
    let mut current = match doc.get_mut(first) {
        Some(v) => v,
        None => return Ok(None),
    };
    for (depth, segment) in rest.iter().enumerate() {
        current = match current {
            Bson::Document(d) => match d.get_mut(segment) {
                Some(v) => v,
                None => return Ok(None),
            },
            Bson::Array(arr) => match array_index(segment).and_then(|i| arr.get_mut(i)) {
                Some(v) => v,
                None => return Ok(None),
            },
            other => {
                return Err(Blocked {
                    depth,
                    found: type_name(other),
                });
            }
        };
    }
    Ok(Some(current))
}

/// Read the value at `path`. Missing segments yield `Ok(None)`.
///
/// # Errors
///
/// `InvalidPath` when an intermediate segment holds a non-container value,
/// e.g. `"name.first"` where `name` is a string.
pub fn get<'a>(doc: &'a Document, path: &Path) -> Result<Option<&'a Bson>, UpdateError> {
    lookup(doc, &path.segments)
        .map_err(|blocked| UpdateError::invalid_path(path, blocked_reason(path, &blocked)))
}

/// Mutable counterpart of [`get`].
pub fn get_mut<'a>(doc: &'a mut Document, path: &Path) -> Result<Option<&'a mut Bson>, UpdateError> {
    lookup_mut(doc, &path.segments)
        .map_err(|blocked| UpdateError::invalid_path(path, blocked_reason(path, &blocked)))
}

/// Like [`get`], but a scalar in the middle of the path is reported as a
/// write conflict. Used by operators that create the field when absent.
pub(crate) fn get_for_write<'a>(
    doc: &'a Document,
    path: &Path,
) -> Result<Option<&'a Bson>, UpdateError> {
    lookup(doc, &path.segments)
        .map_err(|blocked| UpdateError::path_conflict(path, blocked_reason(path, &blocked)))
}

pub(crate) fn get_mut_for_write<'a>(
    doc: &'a mut Document,
    path: &Path,
) -> Result<Option<&'a mut Bson>, UpdateError> {
    lookup_mut(doc, &path.segments)
        .map_err(|blocked| UpdateError::path_conflict(path, blocked_reason(path, &blocked)))
}

/// Write `value` at `path`, creating what is missing on the way.
///
/// Missing field segments become empty documents. Missing array indexes pad
/// the array with `null` up to the index. Arrays are never created as
/// intermediates. A new terminal field is appended to its parent; an
/// existing one is replaced where it stands.
///
/// # Errors
///
/// `PathConflict` when the path runs through a scalar, or names a field
/// inside an array.
pub fn set(doc: &mut Document, path: &Path, value: Bson) -> Result<(), UpdateError> {
    write_document(doc, path, 0, value)
}

fn write_document(
    doc: &mut Document,
    path: &Path,
    depth: usize,
    value: Bson,
) -> Result<(), UpdateError> {
    let segment = &path.segments[depth];
    if depth + 1 == path.segments.len() {
        doc.insert(segment.clone(), value);
        return Ok(());
    }
    let child = doc
        .entry(segment.clone())
        .or_insert_with(|| Bson::Document(Document::new()));
    write_value(child, path, depth + 1, value)
}

fn write_value(target: &mut Bson, path: &Path, depth: usize, value: Bson) -> Result<(), UpdateError> {
    match target {
        Bson::Document(d) => write_document(d, path, depth, value),
        Bson::Array(arr) => write_array(arr, path, depth, value),
        other => Err(UpdateError::path_conflict(
            path,
            format!(
                "cannot create field '{}' in element '{}' of type {}",
                path.segments[depth],
                path.segments[depth - 1],
                type_name(other)
            ),
        )),
    }
}

fn write_array(arr: &mut Vec<Bson>, path: &Path, depth: usize, value: Bson) -> Result<(), UpdateError> {
    let segment = &path.segments[depth];
    let index = array_index(segment).ok_or_else(|| {
        UpdateError::path_conflict(
            path,
            format!(
                "cannot create field '{segment}' in array '{}'",
                path.segments[depth - 1]
            ),
        )
    })?;
    let terminal = depth + 1 == path.segments.len();

    if index >= arr.len() {
        if index - arr.len() > MAX_ARRAY_PADDING {
            return Err(UpdateError::path_conflict(
                path,
                format!("cannot pad array by more than {MAX_ARRAY_PADDING} elements"),
            ));
        }
        arr.resize(index, Bson::Null);
        if terminal {
            arr.push(value);
            return Ok(());
        }
        arr.push(Bson::Document(Document::new()));
    } else if terminal {
        arr[index] = value;
        return Ok(());
    }
    write_value(&mut arr[index], path, depth + 1, value)
}

/// Remove the value at `path`.
///
/// A document field is removed; an array element is replaced with `null`
/// so that the positions of later elements do not shift. Paths that do not
/// resolve are ignored. Returns true if something was removed.
pub fn unset(doc: &mut Document, path: &Path) -> bool {
    let Some((leaf, parents)) = path.segments.split_last() else {
        return false;
    };
    if parents.is_empty() {
        return doc.remove(leaf).is_some();
    }
    match lookup_mut(doc, parents) {
        Ok(Some(Bson::Document(d))) => d.remove(leaf).is_some(),
        Ok(Some(Bson::Array(arr))) => match array_index(leaf).and_then(|i| arr.get_mut(i)) {
            Some(slot) => {
                *slot = Bson::Null;
                true
            }
            None => false,
        },
        _ => false,
    }
}
