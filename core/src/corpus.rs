//! Loading raw product records into a [`DocumentStore`].
//!
//! Records arrive as JSON (one array or one object per file) or JSONL. Text
//! fields run through [`tokenize`]; numeric attributes are parsed leniently
//! because catalog dumps carry values like `"1,299"` or `"69% off"`.

use crate::document::{Document, DocumentStore, Field, FieldTokens, NumericAttributes};
use crate::error::Result;
use crate::tokenizer::tokenize;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
pub struct RawProduct {
    pub pid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub product_details: Option<Value>,
    #[serde(default)]
    pub average_rating: Option<Value>,
    #[serde(default)]
    pub discount: Option<Value>,
    #[serde(default)]
    pub selling_price: Option<Value>,
    #[serde(default)]
    pub actual_price: Option<Value>,
    #[serde(default)]
    pub out_of_stock: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RawProduct {
    pub fn into_document(self) -> Document {
        let mut tokens = FieldTokens::default();
        let texts = [
            (Field::Title, self.title.as_deref()),
            (Field::Description, self.description.as_deref()),
            (Field::Brand, self.brand.as_deref()),
            (Field::Category, self.category.as_deref()),
            (Field::SubCategory, self.sub_category.as_deref()),
            (Field::Seller, self.seller.as_deref()),
        ];
        for (field, text) in texts {
            if let Some(text) = text {
                *tokens.get_mut(field) = tokenize(text);
            }
        }
        if let Some(details) = &self.product_details {
            let mut flat = String::new();
            flatten_details(details, &mut flat);
            tokens.product_details = tokenize(&flat);
        }

        let numeric = NumericAttributes {
            average_rating: self.average_rating.as_ref().and_then(parse_number),
            discount: self.discount.as_ref().and_then(parse_number),
            selling_price: self.selling_price.as_ref().and_then(parse_number),
            actual_price: self.actual_price.as_ref().and_then(parse_number),
            out_of_stock: self.out_of_stock.as_ref().and_then(parse_bool),
        };

        Document {
            pid: self.pid,
            title: self.title.unwrap_or_default(),
            url: self.url.filter(|u| !u.is_empty()),
            tokens,
            numeric,
        }
    }
}

/// `product_details` is a list of single-entry `{key: value}` maps in catalog
/// dumps; keys and values are both searchable text.
fn flatten_details(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            out.push_str(s);
            out.push(' ');
        }
        Value::Array(items) => items.iter().for_each(|v| flatten_details(v, out)),
        Value::Object(map) => {
            for (k, v) in map {
                out.push_str(k);
                out.push(' ');
                flatten_details(v, out);
            }
        }
        Value::Number(n) => {
            out.push_str(&n.to_string());
            out.push(' ');
        }
        Value::Bool(_) | Value::Null => {}
    }
}

/// Accepts JSON numbers and strings such as `"4.1"`, `"1,299"` or `"69% off"`.
pub fn parse_number(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit() && *c != '.')
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .filter(|c| *c != ',')
                .collect();
            cleaned.parse::<f32>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

/// Parse newline-delimited product records. Blank lines are skipped.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<RawProduct>> {
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line)?);
    }
    Ok(out)
}

/// Parse a JSON document holding either one record or an array of records.
pub fn read_json<R: BufRead>(reader: R) -> Result<Vec<RawProduct>> {
    let json: Value = serde_json::from_reader(reader)?;
    let out = match json {
        Value::Array(arr) => arr
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<RawProduct>, _>>()?,
        obj @ Value::Object(_) => vec![serde_json::from_value(obj)?],
        _ => Vec::new(),
    };
    Ok(out)
}

/// `.json`/`.jsonl` files under `path` (or `path` itself), in sorted order so
/// internal ids are reproducible across runs.
pub fn corpus_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
        files.sort();
    } else if path.is_file() {
        files.push(path.to_path_buf());
    }
    files
}

/// Load every record reachable from `path` into a fresh store.
pub fn load_corpus(path: &Path) -> Result<DocumentStore> {
    let mut store = DocumentStore::new();
    for file in corpus_files(path) {
        let reader = BufReader::new(File::open(&file)?);
        let records = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(reader)?
        } else {
            read_json(reader)?
        };
        tracing::debug!(file = %file.display(), records = records.len(), "read corpus file");
        for raw in records {
            store.insert(raw.into_document())?;
        }
    }
    tracing::info!(num_docs = store.len(), path = %path.display(), "corpus loaded");
    Ok(store)
}
