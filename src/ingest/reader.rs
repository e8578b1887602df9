//! Dataset reader: size bound, text decoding and record extraction

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::error::{ReadError, ReadResult};
use crate::config::{Encoding, InputSettings};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Top-level layout the records were found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// `{"type": "FeatureCollection", "features": [...]}`
    FeatureCollection,
    /// A bare array of features or attribute objects
    Array,
    /// `{"properties": [...]}`
    PropertiesArray,
}

/// One raw entry of the source collection, untouched
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    /// Zero-based position in the source collection
    pub index: usize,
    pub value: Value,
}

impl RawFeature {
    /// Attribute object of the entry: the `properties` member of a feature,
    /// or the entry itself when it is a bare attribute object
    pub fn attributes(&self) -> Option<&Map<String, Value>> {
        let object = self.value.as_object()?;
        match object.get("properties") {
            Some(Value::Object(properties)) => Some(properties),
            Some(_) => None,
            None if object.contains_key("type") => None,
            None => Some(object),
        }
    }
}

/// The loaded source document
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub source: PathBuf,
    pub size_bytes: u64,
    pub shape: DocumentShape,
    pub features: Vec<RawFeature>,
}

impl RawDocument {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Mean serialized size of one record, used to bound batch sizes
    pub fn avg_record_bytes(&self) -> u64 {
        if self.features.is_empty() {
            return self.size_bytes.max(1);
        }
        (self.size_bytes / self.features.len() as u64).max(1)
    }
}

/// Loads the property-records file under a size bound and declared encoding
#[derive(Debug, Clone)]
pub struct DatasetReader {
    encoding: Encoding,
    max_bytes: u64,
}

impl DatasetReader {
    pub fn new(encoding: Encoding, max_bytes: u64) -> Self {
        Self {
            encoding,
            max_bytes,
        }
    }

    pub fn from_settings(settings: &InputSettings) -> Self {
        Self::new(settings.encoding, settings.max_file_size_bytes())
    }

    /// Read and parse the document at `path`
    pub fn read(&self, path: &Path) -> ReadResult<RawDocument> {
        if !path.exists() {
            return Err(ReadError::FileNotFound(path.to_path_buf()));
        }
        let size_bytes = fs::metadata(path)
            .map_err(|source| ReadError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        if size_bytes > self.max_bytes {
            return Err(ReadError::InputTooLarge {
                path: path.to_path_buf(),
                size_bytes,
                limit_bytes: self.max_bytes,
            });
        }

        debug!(path = %path.display(), size_bytes, encoding = self.encoding.name(), "Reading input");
        let bytes = fs::read(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = self.decode(&bytes, path)?;
        let document = parse_document(&text, path, size_bytes)?;

        info!(
            path = %path.display(),
            records = document.len(),
            shape = ?document.shape,
            "Loaded input document"
        );
        Ok(document)
    }

    /// Decode raw bytes according to the declared encoding
    pub fn decode(&self, bytes: &[u8], path: &Path) -> ReadResult<String> {
        let decode_error = |offset: usize| ReadError::DecodeError {
            path: path.to_path_buf(),
            encoding: self.encoding.name(),
            offset,
        };
        match self.encoding {
            Encoding::Utf8 => {
                if bytes.starts_with(UTF8_BOM) {
                    return Err(ReadError::UnexpectedBom {
                        path: path.to_path_buf(),
                    });
                }
                std::str::from_utf8(bytes)
                    .map(str::to_string)
                    .map_err(|e| decode_error(e.valid_up_to()))
            }
            Encoding::Utf8Sig => {
                let (body, skipped) = match bytes.strip_prefix(UTF8_BOM) {
                    Some(rest) => (rest, UTF8_BOM.len()),
                    None => (bytes, 0),
                };
                std::str::from_utf8(body)
                    .map(str::to_string)
                    .map_err(|e| decode_error(skipped + e.valid_up_to()))
            }
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(decode_error(offset)),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            // Every byte maps to the code point of the same value
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Parse decoded text into the raw record collection
pub fn parse_document(text: &str, path: &Path, size_bytes: u64) -> ReadResult<RawDocument> {
    let value: Value = serde_json::from_str(text).map_err(|source| ReadError::JsonParse {
        path: path.to_path_buf(),
        source,
    })?;

    let unsupported = |found: &str| ReadError::UnsupportedStructure {
        path: path.to_path_buf(),
        found: found.to_string(),
    };

    let (shape, entries) = match value {
        Value::Array(items) => (DocumentShape::Array, items),
        Value::Object(mut map) => {
            let is_collection = map.get("type").and_then(Value::as_str) == Some("FeatureCollection");
            if is_collection || map.contains_key("features") {
                match map.remove("features") {
                    Some(Value::Array(items)) => (DocumentShape::FeatureCollection, items),
                    Some(_) => return Err(unsupported("'features' is not an array")),
                    None => return Err(unsupported("FeatureCollection without 'features'")),
                }
            } else {
                match map.remove("properties") {
                    Some(Value::Array(items)) => (DocumentShape::PropertiesArray, items),
                    Some(_) => return Err(unsupported("'properties' is not an array")),
                    None => return Err(unsupported("object without 'features' or 'properties'")),
                }
            }
        }
        Value::Null => return Err(unsupported("null")),
        Value::Bool(_) => return Err(unsupported("boolean")),
        Value::Number(_) => return Err(unsupported("number")),
        Value::String(_) => return Err(unsupported("string")),
    };

    let features = entries
        .into_iter()
        .enumerate()
        .map(|(index, value)| RawFeature { index, value })
        .collect();

    Ok(RawDocument {
        source: path.to_path_buf(),
        size_bytes,
        shape,
        features,
    })
}
