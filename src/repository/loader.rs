use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::types::{RepositorySnapshot, ResourceEntry};

const COLUMN_URL: &str = "URL";
const COLUMN_CONTENT: &str = "Content";
const COLUMN_PARADATA: &str = "Paradata";
const COLUMN_MANUAL_ALIGNMENT: &str = "Manual-Alignment";
const COLUMN_LEARNING_AREA: &str = "Learning-Area";
const COLUMN_YEAR: &str = "Year";

/// Load every `*.txt` (tab-delimited) and `*.json` repository file in `dir`.
///
/// Files are read in sorted path order and rows in file order, so when two
/// rows share a URL the later one wins deterministically.
///
/// # Errors
///
/// Returns an error if:
/// - No repository files are found
/// - A file cannot be read or is structurally malformed
/// - The files contain no entries at all
pub fn load_repository(dir: &Path) -> Result<RepositorySnapshot> {
    let files = repository_files(dir)?;
    if files.is_empty() {
        bail!(
            "No *.txt or *.json repository files found in {}",
            dir.display()
        );
    }

    let mut entries = Vec::new();
    for path in &files {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read repository file {}", path.display()))?;
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => parse_json(&raw)
                .with_context(|| format!("Failed to parse repository JSON in {}", path.display()))?,
            _ => parse_tsv(&raw)
                .with_context(|| format!("Failed to parse repository file {}", path.display()))?,
        };
        debug!(file = %path.display(), entries = parsed.len(), "loaded repository file");
        entries.extend(parsed);
    }

    let snapshot = RepositorySnapshot::from_entries(entries);
    if snapshot.is_empty() {
        bail!("Repository in {} contains no entries", dir.display());
    }
    info!(
        files = files.len(),
        entries = snapshot.len(),
        "repository loaded"
    );
    Ok(snapshot)
}

fn repository_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for ext in ["txt", "json"] {
        let pattern = dir.join(format!("*.{}", ext));
        let pattern = pattern.to_string_lossy();
        let paths = glob::glob(&pattern)
            .with_context(|| format!("Invalid repository path pattern {}", pattern))?;
        for path in paths {
            files.push(path.context("Failed to read repository directory entry")?);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse a tab-delimited repository file with a header row.
///
/// Quoted fields may span tabs and line breaks (see [`split_records`]).
/// Malformed `Paradata` or `Manual-Alignment` JSON is treated as empty.
pub fn parse_tsv(raw: &str) -> Result<Vec<ResourceEntry>> {
    let mut records = split_records(raw).into_iter();
    let Some(columns) = records.next() else {
        return Ok(Vec::new());
    };
    let column = |name: &str| columns.iter().position(|c| c.trim() == name);
    let Some(url_idx) = column(COLUMN_URL) else {
        bail!("Missing '{}' column in header", COLUMN_URL);
    };
    let content_idx = column(COLUMN_CONTENT);
    let paradata_idx = column(COLUMN_PARADATA);
    let alignment_idx = column(COLUMN_MANUAL_ALIGNMENT);
    let area_idx = column(COLUMN_LEARNING_AREA);
    let year_idx = column(COLUMN_YEAR);

    let mut entries = Vec::new();
    for (row, fields) in records.enumerate() {
        let field = |idx: Option<usize>| field_at(&fields, idx);

        let url = field(Some(url_idx)).trim();
        if url.is_empty() {
            warn!(row = row + 1, "skipping repository row without URL");
            continue;
        }

        let paradata: BTreeMap<String, u64> =
            serde_json::from_str(field(paradata_idx)).unwrap_or_default();
        let manual_alignment: Vec<String> =
            serde_json::from_str(field(alignment_idx)).unwrap_or_default();

        entries.push(ResourceEntry {
            url: url.to_string(),
            content: field(content_idx).to_string(),
            paradata,
            manual_alignment,
            learning_area: parse_list(field(area_idx)),
            year: parse_list(field(year_idx)),
        });
    }
    Ok(entries)
}

/// Split tab-delimited text into records of unquoted fields.
///
/// A field that starts with `"` runs to the closing quote that is followed by
/// a tab, a line break or the end of input, so it may contain both. Inside it
/// `""` is one literal quote and any other quote is kept as is. Quotes that do
/// not open a field are literal too. Blank records are dropped.
fn split_records(raw: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut at_field_start = true;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if at_field_start => {
                at_field_start = false;
                while let Some(q) = chars.next() {
                    if q != '"' {
                        field.push(q);
                        continue;
                    }
                    match chars.peek() {
                        Some('"') => {
                            chars.next();
                            field.push('"');
                        }
                        None | Some('\t') | Some('\n') | Some('\r') => break,
                        Some(_) => field.push('"'),
                    }
                }
            }
            '\t' => {
                record.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
                at_field_start = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            _ => {
                field.push(c);
                at_field_start = false;
            }
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }
    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    if record.iter().any(|f| !f.trim().is_empty()) {
        records.push(record);
    }
}

/// One record of a JSON repository file
#[derive(Debug, Deserialize)]
struct JsonRecord {
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "Content", default)]
    content: String,
    #[serde(rename = "Paradata", default)]
    paradata: BTreeMap<String, u64>,
    #[serde(rename = "Manual-Alignment", default)]
    manual_alignment: Vec<String>,
    #[serde(rename = "Learning-Area", default)]
    learning_area: ListField,
    #[serde(rename = "Year", default)]
    year: ListField,
}

/// A list column given either as a delimited string or a JSON array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListField {
    Delimited(String),
    Items(Vec<String>),
}

impl Default for ListField {
    fn default() -> Self {
        ListField::Items(Vec::new())
    }
}

impl ListField {
    fn into_set(self) -> BTreeSet<String> {
        match self {
            ListField::Delimited(s) => parse_list(&s),
            ListField::Items(items) => items
                .iter()
                .flat_map(|item| parse_list(item))
                .collect(),
        }
    }
}

/// Parse a JSON repository file: an array of records with the same fields
/// as the tab-delimited format.
pub fn parse_json(raw: &str) -> Result<Vec<ResourceEntry>> {
    let records: Vec<JsonRecord> = serde_json::from_str(raw)?;
    Ok(records
        .into_iter()
        .filter(|r| !r.url.trim().is_empty())
        .map(|r| ResourceEntry {
            url: r.url.trim().to_string(),
            content: r.content,
            paradata: r.paradata,
            manual_alignment: r.manual_alignment,
            learning_area: r.learning_area.into_set(),
            year: r.year.into_set(),
        })
        .collect())
}

/// Split a `;` or `,` delimited list, dropping quotes and empty items.
pub fn parse_list(s: &str) -> BTreeSet<String> {
    s.split([';', ','])
        .map(|item| item.replace('"', "").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn field_at(fields: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| fields.get(i)).map(String::as_str).unwrap_or("")
}
