use std::io::Read;

use bson::{Bson, Document};
use serde::Deserialize;
use slate_update::{UpdateOptions, apply_updates};
use tracing::info;

/// `{ "document": {...}, "updates": [{...}], "is_insert": false }`
#[derive(Debug, Deserialize)]
struct Request {
    document: Document,
    updates: Vec<Document>,
    #[serde(default)]
    is_insert: bool,
}

/// Request source: first argument, then `SLATE_UPDATE_INPUT`, then stdin.
fn read_input() -> Result<String, String> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SLATE_UPDATE_INPUT").ok());

    match path {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read request from {path}: {e}")),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| format!("failed to read request from stdin: {e}"))?;
            Ok(input)
        }
    }
}

fn run(input: &str) -> Result<Document, String> {
    let request: Request =
        serde_json::from_str(input).map_err(|e| format!("failed to parse request: {e}"))?;
    let options = UpdateOptions {
        is_insert: request.is_insert,
        ..UpdateOptions::default()
    };
    info!(
        updates = request.updates.len(),
        is_insert = options.is_insert,
        "applying updates"
    );
    apply_updates(&request.document, &request.updates, &options)
        .map_err(|e| format!("update failed ({}): {e}", e.kind()))
}

/// Relaxed extended JSON: plain numbers where JSON can hold them, `$date`
/// and friends for the BSON-only types.
fn render(document: Document) -> Result<String, String> {
    serde_json::to_string_pretty(&Bson::Document(document).into_relaxed_extjson())
        .map_err(|e| format!("failed to encode result: {e}"))
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let input = read_input().unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    let document = run(&input).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    match render(document) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{DateTime, doc};
    use slate_update::values_equal;

    #[test]
    fn applies_request() {
        let input = r#"{
            "document": { "n": 1, "tags": ["a"] },
            "updates": [
                { "$inc": { "n": 1 } },
                { "$push": { "tags": "b" } }
            ]
        }"#;
        let document = run(input).unwrap();
        assert_eq!(document.get_array("tags").unwrap().len(), 2);
        let n = document.get("n").unwrap();
        assert!(values_equal(n, &Bson::Int32(2)), "{n:?}");
    }

    #[test]
    fn set_on_insert_follows_flag() {
        let input = r#"{
            "document": {},
            "updates": [{ "$setOnInsert": { "created": true } }],
            "is_insert": true
        }"#;
        assert_eq!(run(input).unwrap(), doc! { "created": true });
    }

    #[test]
    fn reports_update_errors() {
        let input = r#"{ "document": { "a": 1 }, "updates": [] }"#;
        let err = run(input).unwrap_err();
        assert!(err.contains("EmptySpecList"), "{err}");
    }

    #[test]
    fn renders_relaxed_extended_json() {
        let json = render(doc! {
            "n": 5,
            "d": DateTime::from_millis(0),
            "x": 1.5
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["n"], serde_json::json!(5));
        assert_eq!(value["x"], serde_json::json!(1.5));
        assert_eq!(value["d"]["$date"], serde_json::json!("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn reports_malformed_json() {
        assert!(run("{").unwrap_err().starts_with("failed to parse request"));
    }
}
