use bson::{Bson, Document};
use tracing::debug;

use crate::error::UpdateError;
use crate::options::UpdateOptions;
use crate::spec::UpdateSpec;

/// Field names allowed to start with `$` in stored documents (DBRef).
const DBREF_KEYS: [&str; 3] = ["$ref", "$id", "$db"];

/// Result of [`UpdatePipeline::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Updated {
    pub document: Document,
    /// True if any update changed the document.
    pub modified: bool,
}

/// An ordered list of update documents, parsed once and applied as many
/// times as needed.
#[derive(Debug, Clone)]
pub struct UpdatePipeline {
    specs: Vec<UpdateSpec>,
}

impl UpdatePipeline {
    /// Parse every update document up front.
    pub fn parse(updates: &[Document]) -> Result<UpdatePipeline, UpdateError> {
        if updates.is_empty() {
            return Err(UpdateError::EmptySpecList);
        }
        let specs = updates
            .iter()
            .map(UpdateSpec::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(UpdatePipeline { specs })
    }

    pub fn specs(&self) -> &[UpdateSpec] {
        &self.specs
    }

    /// Apply to a copy of `document`. The input is never modified.
    pub fn apply(&self, document: &Document, options: &UpdateOptions) -> Result<Updated, UpdateError> {
        let mut working = document.clone();
        let mut modified = false;
        for (i, spec) in self.specs.iter().enumerate() {
            debug!(step = i, mutations = spec.mutations().len(), "applying update");
            modified |= spec.apply(&mut working, options)?;
            validate_document(&working)?;
        }
        Ok(Updated {
            document: working,
            modified,
        })
    }
}

/// Apply `updates` in order to a copy of `document`.
///
/// Each update document is parsed and applied before the next one is looked
/// at, so a later malformed update still fails the whole call but only after
/// the earlier ones have been checked. Any error discards the working copy.
pub fn apply_updates(
    document: &Document,
    updates: &[Document],
    options: &UpdateOptions,
) -> Result<Document, UpdateError> {
    if updates.is_empty() {
        return Err(UpdateError::EmptySpecList);
    }
    debug!(updates = updates.len(), is_insert = options.is_insert, "apply_updates");

    let mut working = document.clone();
    for (i, update) in updates.iter().enumerate() {
        let result = UpdateSpec::parse(update).and_then(|spec| {
            spec.apply(&mut working, options)?;
            validate_document(&working)
        });
        if let Err(error) = result {
            debug!(step = i, %error, "update rejected");
            return Err(error);
        }
    }
    Ok(working)
}

/// Check that a document can be stored: no empty field names and no
/// `$`-prefixed field names other than the DBRef keys, at any depth.
pub fn validate_document(doc: &Document) -> Result<(), UpdateError> {
    for (key, value) in doc {
        if key.is_empty() {
            return Err(UpdateError::InvalidDocument(
                "field names must not be empty".into(),
            ));
        }
        if key.starts_with('$') && !DBREF_KEYS.contains(&key.as_str()) {
            return Err(UpdateError::InvalidDocument(format!(
                "field name '{key}' must not start with '$'"
            )));
        }
        validate_value(value)?;
    }
    Ok(())
}

fn validate_value(value: &Bson) -> Result<(), UpdateError> {
    match value {
        Bson::Document(doc) => validate_document(doc),
        Bson::Array(items) => items.iter().try_for_each(validate_value),
        _ => Ok(()),
    }
}
