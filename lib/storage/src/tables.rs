// Item, review and scene table loading (CSV, JSON array, JSON lines)
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tastematch_core::item::{validate_item_columns, validate_review_columns};
use tastematch_core::{RawItem, Record, Review};
use tastematch_recommend::SceneTable;
use tracing::debug;

/// A loaded table: header row plus one string record per row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
    JsonLines,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "json" => Ok(TableFormat::Json),
            "jsonl" | "ndjson" => Ok(TableFormat::JsonLines),
            _ => bail!("Unsupported table format for {}", path.display()),
        }
    }
}

pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let table = match TableFormat::from_path(path)? {
        TableFormat::Csv => load_csv(path),
        TableFormat::Json => load_json(path),
        TableFormat::JsonLines => load_json_lines(path),
    }
    .with_context(|| format!("Failed to load table {}", path.display()))?;
    debug!("Loaded {} rows from {}", table.records.len(), path.display());
    Ok(table)
}

fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Bad CSV row {}", line + 2))?;
        let record: Record = headers
            .iter()
            .cloned()
            .zip(row.iter().map(str::to_string))
            .collect();
        records.push(record);
    }
    Ok(Table { headers, records })
}

fn load_json(path: &Path) -> Result<Table> {
    let file = File::open(path)?;
    let value: Value = serde_json::from_reader(BufReader::new(file))?;
    let Value::Array(rows) = value else {
        bail!("Expected a JSON array of objects");
    };
    let mut table = Table::default();
    for (i, row) in rows.into_iter().enumerate() {
        match row {
            Value::Object(obj) => push_object(&mut table, obj),
            _ => bail!("Row {} is not a JSON object", i + 1),
        }
    }
    Ok(table)
}

fn load_json_lines(path: &Path) -> Result<Table> {
    let file = File::open(path)?;
    let mut table = Table::default();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let obj: Map<String, Value> = serde_json::from_str(&line)
            .with_context(|| format!("Line {} is not a JSON object", i + 1))?;
        push_object(&mut table, obj);
    }
    Ok(table)
}

fn push_object(table: &mut Table, obj: Map<String, Value>) {
    let mut record = Record::with_capacity(obj.len());
    for (key, value) in obj {
        if !table.headers.contains(&key) {
            table.headers.push(key.clone());
        }
        record.insert(key, cell_text(value));
    }
    table.records.push(record);
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(values) => values
            .into_iter()
            .map(cell_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Load and validate the item table.
pub fn load_items<P: AsRef<Path>>(path: P) -> Result<Vec<RawItem>> {
    let table = load_table(&path)?;
    validate_item_columns(&table.headers)?;
    table
        .records
        .iter()
        .map(|r| RawItem::from_record(r).map_err(anyhow::Error::from))
        .collect()
}

/// Load and validate the review table.
pub fn load_reviews<P: AsRef<Path>>(path: P) -> Result<Vec<Review>> {
    let table = load_table(&path)?;
    validate_review_columns(&table.headers)?;
    table
        .records
        .iter()
        .map(|r| Review::from_record(r).map_err(anyhow::Error::from))
        .collect()
}

/// Load a `scene -> [item names]` JSON table.
pub fn load_scene_table<P: AsRef<Path>>(path: P) -> Result<SceneTable> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene table {}", path.display()))?;
    SceneTable::from_json_str(&json).map_err(|e| anyhow!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tastematch_core::Error;

    const ITEMS_CSV: &str = "\
BizId,Name,Categories,Neighborhoods_0,PriceRange,Rating,ReviewCount,Ranking
a1,Luigi's,\"Italian, Pizza\",Midtown,$$,4.5,120,1
b2,Bangkok Garden,Thai,Chelsea,$,4.0,80,2
";

    #[test]
    fn test_load_items_csv_with_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.csv");
        fs::write(&path, ITEMS_CSV).unwrap();

        let items = load_items(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a1");
        assert_eq!(items[0].categories, "Italian, Pizza");
        assert_eq!(items[1].price, "$");
    }

    #[test]
    fn test_missing_column_is_input_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.csv");
        fs::write(&path, "id,name\nx,y\n").unwrap();

        let err = load_items(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InputValidation { .. })
        ));
    }

    #[test]
    fn test_load_reviews_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.jsonl");
        fs::write(
            &path,
            "{\"business_id\":\"a1\",\"language\":\"en\",\"text\":\"Great\"}\n\n{\"business_id\":\"a1\",\"language\":\"fr\",\"text\":\"Bon\"}\n",
        )
        .unwrap();
        let reviews = load_reviews(&path).unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[1].language, "fr");
    }

    #[test]
    fn test_json_cells_become_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        fs::write(
            &path,
            r#"[{"id":"a","name":"A","categories":["Thai","Noodles"],"location":null,
                "price":"$","rating":4.5,"review_count":10,"rank":3}]"#,
        )
        .unwrap();
        let items = load_items(&path).unwrap();
        assert_eq!(items[0].categories, "Thai, Noodles");
        assert_eq!(items[0].location, "");
        assert_eq!(items[0].rating, "4.5");
        assert_eq!(items[0].review_count, "10");
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(load_table("items.xlsx").is_err());
    }

    #[test]
    fn test_load_scene_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenes.json");
        fs::write(&path, r#"{"dating":["Luigi's"]}"#).unwrap();
        let scenes = load_scene_table(&path).unwrap();
        assert_eq!(scenes.scenes_for("luigi's"), vec!["dating"]);
    }
}
