use bson::{Bson, DateTime, Document, Timestamp};

use crate::error::UpdateError;
use crate::path::{self, Path};
use crate::value::{self, Arith, type_name};

/// What `$currentDate` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    Date,
    Timestamp,
}

/// Which side `$min` / `$max` keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

impl Bound {
    fn operator(self) -> &'static str {
        match self {
            Bound::Min => "$min",
            Bound::Max => "$max",
        }
    }
}

/// A single `$bit` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    And,
    Or,
    Xor,
}

impl BitOp {
    fn apply32(self, a: i32, b: i32) -> i32 {
        match self {
            BitOp::And => a & b,
            BitOp::Or => a | b,
            BitOp::Xor => a ^ b,
        }
    }

    fn apply64(self, a: i64, b: i64) -> i64 {
        match self {
            BitOp::And => a & b,
            BitOp::Or => a | b,
            BitOp::Xor => a ^ b,
        }
    }
}

/// `$set`: write `value`, appending a new field or replacing an existing one
/// where it stands. Writing an identical value is not a change.
pub(crate) fn set(doc: &mut Document, path: &Path, value: &Bson) -> Result<bool, UpdateError> {
    if path::get_for_write(doc, path)? == Some(value) {
        return Ok(false);
    }
    path::set(doc, path, value.clone())?;
    Ok(true)
}

/// `$unset`
pub(crate) fn unset(doc: &mut Document, path: &Path) -> Result<bool, UpdateError> {
    Ok(path::unset(doc, path))
}

/// `$setOnInsert`: `$set` when the update is creating the document,
/// otherwise nothing.
pub(crate) fn set_on_insert(
    doc: &mut Document,
    path: &Path,
    value: &Bson,
    is_insert: bool,
) -> Result<bool, UpdateError> {
    if !is_insert {
        return Ok(false);
    }
    set(doc, path, value)
}

/// `$currentDate`
pub(crate) fn current_date(
    doc: &mut Document,
    path: &Path,
    kind: DateKind,
    now: DateTime,
) -> Result<bool, UpdateError> {
    let value = match kind {
        DateKind::Date => Bson::DateTime(now),
        DateKind::Timestamp => {
            let secs = now.timestamp_millis().div_euclid(1000);
            Bson::Timestamp(Timestamp {
                time: secs.clamp(0, i64::from(u32::MAX)) as u32,
                increment: 1,
            })
        }
    };
    set(doc, path, &value)
}

/// `$inc`: a missing field takes the increment as its value.
pub(crate) fn inc(doc: &mut Document, path: &Path, amount: &Bson) -> Result<bool, UpdateError> {
    let result = match path::get_for_write(doc, path)? {
        None => amount.clone(),
        Some(current) => value::arithmetic(Arith::Add, current, amount)
            .ok_or_else(|| not_numeric("$inc", path, current))?,
    };
    set(doc, path, &result)
}

/// `$mul`: a missing field is set to zero of the multiplier's type.
pub(crate) fn mul(doc: &mut Document, path: &Path, factor: &Bson) -> Result<bool, UpdateError> {
    let result = match path::get_for_write(doc, path)? {
        None => value::zero_like(factor).ok_or_else(|| {
            UpdateError::invalid_operand("$mul", path, "multiplier must be a number")
        })?,
        Some(current) => value::arithmetic(Arith::Mul, current, factor)
            .ok_or_else(|| not_numeric("$mul", path, current))?,
    };
    set(doc, path, &result)
}

fn not_numeric(operator: &'static str, path: &Path, current: &Bson) -> UpdateError {
    UpdateError::type_mismatch(
        operator,
        path,
        format!(
            "cannot apply to a value of non-numeric type {}",
            type_name(current)
        ),
    )
}

/// `$min` / `$max`: replace only when the operand sorts strictly before
/// (`$min`) or after (`$max`) the current value.
pub(crate) fn min_max(
    doc: &mut Document,
    path: &Path,
    operand: &Bson,
    bound: Bound,
) -> Result<bool, UpdateError> {
    match path::get_for_write(doc, path)? {
        None => {}
        Some(current @ (Bson::Array(_) | Bson::Document(_))) => {
            return Err(UpdateError::type_mismatch(
                bound.operator(),
                path,
                format!("cannot compare with a value of type {}", type_name(current)),
            ));
        }
        Some(current) => {
            let ord = value::compare(operand, current);
            let replace = match bound {
                Bound::Min => ord.is_lt(),
                Bound::Max => ord.is_gt(),
            };
            if !replace {
                return Ok(false);
            }
        }
    }
    path::set(doc, path, operand.clone())?;
    Ok(true)
}

/// `$rename`: the value leaves its old position and is appended under the
/// new name, replacing anything already there.
pub(crate) fn rename(doc: &mut Document, from: &Path, to: &Path) -> Result<bool, UpdateError> {
    let Some(value) = path::get(doc, from)?.cloned() else {
        return Ok(false);
    };
    path::unset(doc, from);
    path::unset(doc, to);
    path::set(doc, to, value)?;
    Ok(true)
}

/// `$bit`: apply each step in order. A missing field starts from zero of
/// the first operand's type.
pub(crate) fn bit(doc: &mut Document, path: &Path, steps: &[(BitOp, Bson)]) -> Result<bool, UpdateError> {
    let mut acc = match path::get_for_write(doc, path)? {
        Some(current @ (Bson::Int32(_) | Bson::Int64(_))) => current.clone(),
        Some(other) => {
            return Err(UpdateError::type_mismatch(
                "$bit",
                path,
                format!(
                    "cannot apply to a value of non-integral type {}",
                    type_name(other)
                ),
            ));
        }
        None => match steps.first() {
            Some((_, Bson::Int64(_))) => Bson::Int64(0),
            _ => Bson::Int32(0),
        },
    };

    for (op, operand) in steps {
        acc = match (&acc, operand) {
            (Bson::Int32(a), Bson::Int32(b)) => Bson::Int32(op.apply32(*a, *b)),
            (a, b) => match (value::as_integer(a), value::as_integer(b)) {
                (Some(a), Some(b)) => Bson::Int64(op.apply64(a, b)),
                _ => {
                    return Err(UpdateError::invalid_operand(
                        "$bit",
                        path,
                        "bitwise operands must be 32 or 64 bit integers",
                    ));
                }
            },
        };
    }
    set(doc, path, &acc)
}
