//! Serialization of chunks, attribute groups, derived artifacts and reports

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::error::{WriteError, WriteResult};
use crate::config::{OutputFormat, OutputFormats, OutputSettings};
use crate::generate::{render_search_index, render_story_file, story_file_name};
use crate::models::{CanonicalField, DerivedArtifacts, PropertyRecord, PropertyStory};
use crate::split::{AttributeGroup, Chunk};

pub const CHUNKS_DIR: &str = "chunks";
pub const STORIES_FILE: &str = "property_stories.jsonl";
pub const QA_PAIRS_FILE: &str = "property_qa_pairs.jsonl";
pub const RAG_CHUNKS_FILE: &str = "rag_chunks.jsonl";
pub const SEARCH_QUERIES_FILE: &str = "search_queries.jsonl";
pub const STORY_FILES_DIR: &str = "stories";
pub const SEARCH_INDEX_FILE: &str = "property_search_index.txt";

/// Files in the RAG directory that only exist when their generator ran
const ARTIFACT_FILES: [&str; 5] = [
    STORIES_FILE,
    QA_PAIRS_FILE,
    RAG_CHUNKS_FILE,
    SEARCH_QUERIES_FILE,
    SEARCH_INDEX_FILE,
];

/// Writes run outputs into the configured directories
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output: OutputSettings,
    formats: Vec<OutputFormat>,
}

impl OutputWriter {
    pub fn new(output: &OutputSettings, formats: &OutputFormats) -> Self {
        Self {
            output: output.clone(),
            formats: formats.enabled(),
        }
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.output.base_directory.join(CHUNKS_DIR)
    }

    pub fn group_dir(&self, field: CanonicalField) -> PathBuf {
        self.output.base_directory.join(format!("by_{}", field.name()))
    }

    pub fn story_files_dir(&self) -> PathBuf {
        self.output.rag_directory.join(STORY_FILES_DIR)
    }

    /// Create the output directories and clear chunk, group and artifact
    /// files left by an earlier run. Afterwards only what this run writes is
    /// present, including when a generator was switched off in between.
    pub fn prepare(&self, group_fields: &[CanonicalField]) -> WriteResult<()> {
        reset_dir(&self.chunks_dir())?;
        for field in group_fields {
            reset_dir(&self.group_dir(*field))?;
        }
        for dir in [&self.output.rag_directory, &self.output.reports_directory] {
            fs::create_dir_all(dir).map_err(|e| WriteError::io(dir, e))?;
        }

        let stories_dir = self.story_files_dir();
        if stories_dir.exists() {
            fs::remove_dir_all(&stories_dir).map_err(|e| WriteError::io(&stories_dir, e))?;
        }
        for name in ARTIFACT_FILES {
            let path = self.output.rag_directory.join(name);
            if path.exists() {
                fs::remove_file(&path).map_err(|e| WriteError::io(&path, e))?;
                debug!(path = %path.display(), "Removed stale artifact");
            }
        }
        Ok(())
    }

    /// Write one chunk in every enabled format
    pub fn write_chunk(&self, chunk: &Chunk<'_>) -> WriteResult<Vec<PathBuf>> {
        let dir = self.chunks_dir();
        let stem = chunk.name();
        let mut files = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            let path = dir.join(format!("{stem}.{}", format.extension()));
            match format {
                OutputFormat::Json => write_json(&path, &feature_collection(chunk.records.iter()))?,
                OutputFormat::Jsonl => {
                    write_jsonl(&path, chunk.records.iter())?;
                }
                OutputFormat::Csv => write_csv(&path, chunk.records.iter())?,
            }
            files.push(path);
        }
        debug!(chunk = %stem, records = chunk.len(), files = files.len(), "Wrote chunk");
        Ok(files)
    }

    /// Write one attribute group as JSON, plus CSV when enabled
    pub fn write_group(&self, group: &AttributeGroup<'_>) -> WriteResult<Vec<PathBuf>> {
        let dir = self.group_dir(group.field);
        let stem = group.file_stem();
        let records = || group.records.iter().copied();

        let json_path = dir.join(format!("{stem}.json"));
        write_json(&json_path, &feature_collection(records()))?;
        let mut files = vec![json_path];
        if self.formats.contains(&OutputFormat::Csv) {
            let csv_path = dir.join(format!("{stem}.csv"));
            write_csv(&csv_path, records())?;
            files.push(csv_path);
        }
        Ok(files)
    }

    /// Write each non-empty artifact collection as JSON Lines
    pub fn write_artifacts(&self, artifacts: &DerivedArtifacts) -> WriteResult<Vec<PathBuf>> {
        let dir = &self.output.rag_directory;
        let mut files = Vec::new();
        if !artifacts.stories.is_empty() {
            files.push(write_jsonl(&dir.join(STORIES_FILE), artifacts.stories.iter())?);
        }
        if !artifacts.qa_pairs.is_empty() {
            files.push(write_jsonl(&dir.join(QA_PAIRS_FILE), artifacts.qa_pairs.iter())?);
        }
        if !artifacts.rag_chunks.is_empty() {
            files.push(write_jsonl(&dir.join(RAG_CHUNKS_FILE), artifacts.rag_chunks.iter())?);
        }
        if !artifacts.search_queries.is_empty() {
            files.push(write_jsonl(
                &dir.join(SEARCH_QUERIES_FILE),
                artifacts.search_queries.iter(),
            )?);
        }
        Ok(files)
    }

    /// Plain-text story files, `records_per_file` stories per file
    pub fn write_story_files(
        &self,
        stories: &[PropertyStory],
        records_per_file: usize,
    ) -> WriteResult<Vec<PathBuf>> {
        let dir = self.story_files_dir();
        let per_file = records_per_file.max(1);
        let generated_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut files = Vec::new();
        for (index, batch) in stories.chunks(per_file).enumerate() {
            let path = dir.join(story_file_name(index));
            let text = render_story_file(index, index * per_file + 1, stories.len(), batch, &generated_at);
            ensure_parent(&path)?;
            fs::write(&path, text).map_err(|e| WriteError::io(&path, e))?;
            files.push(path);
        }
        debug!(files = files.len(), stories = stories.len(), "Wrote story files");
        Ok(files)
    }

    /// Address lookup table pointing into the story files
    pub fn write_search_index(
        &self,
        records: &[PropertyRecord],
        records_per_file: usize,
    ) -> WriteResult<PathBuf> {
        let path = self.output.rag_directory.join(SEARCH_INDEX_FILE);
        ensure_parent(&path)?;
        fs::write(&path, render_search_index(records, records_per_file))
            .map_err(|e| WriteError::io(&path, e))?;
        Ok(path)
    }

    /// Pretty JSON document in the reports directory
    pub fn write_report<T: Serialize>(&self, file_name: &str, value: &T) -> WriteResult<PathBuf> {
        let path = self.output.reports_directory.join(file_name);
        write_json(&path, value)?;
        Ok(path)
    }

    pub fn write_text_report(&self, file_name: &str, text: &str) -> WriteResult<PathBuf> {
        let path = self.output.reports_directory.join(file_name);
        ensure_parent(&path)?;
        fs::write(&path, text).map_err(|e| WriteError::io(&path, e))?;
        Ok(path)
    }
}

/// GeoJSON feature for a record; coordinates move into a Point geometry
pub fn record_feature(record: &PropertyRecord) -> Value {
    let mut properties = Map::new();
    properties.insert("id".to_string(), json!(record.id));
    for field in CanonicalField::all() {
        let value = match field {
            CanonicalField::YearBuilt => record.year_built.map(|y| json!(y)),
            CanonicalField::BuildingValue
            | CanonicalField::LandValue
            | CanonicalField::TotalValue => record.amount(field).map(|v| json!(v)),
            _ => record.text(field).map(|s| json!(s)),
        };
        if let Some(value) = value {
            properties.insert(field.name().to_string(), value);
        }
    }
    let geometry = match record.coordinates {
        Some(c) => json!({"type": "Point", "coordinates": [c.longitude, c.latitude]}),
        None => Value::Null,
    };
    json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": properties,
    })
}

pub fn feature_collection<'a>(records: impl Iterator<Item = &'a PropertyRecord>) -> Value {
    let features: Vec<Value> = records.map(record_feature).collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// CSV header: id, every canonical field, then the coordinate pair
pub fn csv_header() -> Vec<&'static str> {
    let mut header = vec!["id"];
    header.extend(CanonicalField::all().iter().map(|f| f.name()));
    header.push("latitude");
    header.push("longitude");
    header
}

fn csv_row(record: &PropertyRecord) -> Vec<String> {
    let mut row = vec![record.id.clone()];
    for field in CanonicalField::all() {
        let cell = match field {
            CanonicalField::YearBuilt => record.year_built.map(|y| y.to_string()),
            CanonicalField::BuildingValue
            | CanonicalField::LandValue
            | CanonicalField::TotalValue => record.amount(field).map(|v| v.to_string()),
            _ => record.text(field).map(str::to_string),
        };
        row.push(cell.unwrap_or_default());
    }
    match record.coordinates {
        Some(c) => {
            row.push(c.latitude.to_string());
            row.push(c.longitude.to_string());
        }
        None => row.extend([String::new(), String::new()]),
    }
    row
}

fn write_csv<'a>(path: &Path, records: impl Iterator<Item = &'a PropertyRecord>) -> WriteResult<()> {
    ensure_parent(path)?;
    let csv_error = |source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(csv_header()).map_err(csv_error)?;
    for record in records {
        writer.write_record(csv_row(record)).map_err(csv_error)?;
    }
    writer.flush().map_err(|e| WriteError::io(path, e))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> WriteResult<()> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| WriteError::io(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, value).map_err(|source| WriteError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    out.flush().map_err(|e| WriteError::io(path, e))
}

/// One JSON document per line; returns the path written
pub fn write_jsonl<T: Serialize>(
    path: &Path,
    items: impl Iterator<Item = T>,
) -> WriteResult<PathBuf> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| WriteError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for item in items {
        serde_json::to_writer(&mut out, &item).map_err(|source| WriteError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        out.write_all(b"\n").map_err(|e| WriteError::io(path, e))?;
    }
    out.flush().map_err(|e| WriteError::io(path, e))?;
    Ok(path.to_path_buf())
}

fn ensure_parent(path: &Path) -> WriteResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| WriteError::io(parent, e))?;
    }
    Ok(())
}

fn reset_dir(dir: &Path) -> WriteResult<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| WriteError::io(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| WriteError::io(dir, e))
}
