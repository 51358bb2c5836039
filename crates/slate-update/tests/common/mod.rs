#![allow(dead_code)]

use bson::{DateTime, Document};
use slate_update::{ErrorKind, UpdateOptions, apply_updates};

/// Fixed clock so `$currentDate` results are comparable.
pub const NOW_MILLIS: i64 = 1_700_000_000_000;

pub fn options() -> UpdateOptions {
    UpdateOptions::default().with_now(DateTime::from_millis(NOW_MILLIS))
}

pub fn insert_options() -> UpdateOptions {
    UpdateOptions::insert().with_now(DateTime::from_millis(NOW_MILLIS))
}

/// Apply a single update document, panicking on error.
pub fn apply(document: Document, update: Document) -> Document {
    apply_updates(&document, &[update], &options()).unwrap()
}

/// Apply a single update document and return the error kind.
pub fn apply_err(document: Document, update: Document) -> ErrorKind {
    apply_updates(&document, &[update], &options())
        .unwrap_err()
        .kind()
}

pub fn keys(document: &Document) -> Vec<&str> {
    document.keys().map(String::as_str).collect()
}
