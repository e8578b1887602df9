//! Typed settings document
//!
//! Every group and every key carries a default, so an empty document (or a
//! document that names only a few keys) yields a complete configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{ConfigError, ConfigResult};
use crate::models::CanonicalField;

/// Process-wide configuration, loaded once and read-only afterwards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input: InputSettings,
    pub output: OutputSettings,
    pub processing: ProcessingSettings,
    pub llm_training: LlmTrainingSettings,
    pub analysis: AnalysisSettings,
    pub logging: LoggingSettings,
    pub error_handling: ErrorHandlingSettings,
    pub performance: PerformanceSettings,
    pub validation: ValidationSettings,
    pub field_mapping: FieldMappingSettings,
    pub output_formats: OutputFormats,
    pub backup: BackupSettings,
}

/// Text encoding of the input document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    /// UTF-8 with an optional leading byte-order mark
    #[serde(rename = "utf-8-sig", alias = "utf8-sig")]
    Utf8Sig,
    #[serde(rename = "ascii", alias = "us-ascii")]
    Ascii,
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Sig => "utf-8-sig",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin-1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub file_path: PathBuf,
    pub encoding: Encoding,
    pub max_file_size_mb: u64,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from("CGProperties.json"),
            encoding: Encoding::Utf8,
            max_file_size_mb: 500,
        }
    }
}

impl InputSettings {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub base_directory: PathBuf,
    pub rag_directory: PathBuf,
    pub reports_directory: PathBuf,
    pub backup_directory: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("split_output"),
            rag_directory: PathBuf::from("rag_data"),
            reports_directory: PathBuf::from("reports"),
            backup_directory: PathBuf::from("backups"),
        }
    }
}

impl OutputSettings {
    /// Place every output directory under a common root
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            base_directory: root.join("split_output"),
            rag_directory: root.join("rag_data"),
            reports_directory: root.join("reports"),
            backup_directory: root.join("backups"),
        }
    }

    /// Directories whose contents are backed up before a run writes
    pub fn data_directories(&self) -> Vec<&Path> {
        vec![
            self.base_directory.as_path(),
            self.rag_directory.as_path(),
            self.reports_directory.as_path(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    pub records_per_file: usize,
    /// Stable sort by address before splitting
    pub sort_by_address: bool,
    /// Attribute splits written alongside the fixed-size chunks
    pub group_by: Vec<CanonicalField>,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            records_per_file: 50,
            sort_by_address: false,
            group_by: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmTrainingSettings {
    pub qa_pairs: QaPairSettings,
    pub rag_chunks: RagChunkSettings,
    pub property_stories: StorySettings,
    pub search_queries: SearchQuerySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPairSettings {
    pub enabled: bool,
    pub max_pairs_per_property: usize,
    pub include_geographic: bool,
    pub include_financial: bool,
    pub include_administrative: bool,
}

impl Default for QaPairSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_pairs_per_property: 5,
            include_geographic: true,
            include_financial: true,
            include_administrative: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagChunkSettings {
    pub enabled: bool,
    pub chunk_size: usize,
    pub overlap_size: usize,
    pub include_metadata: bool,
    pub include_community_context: bool,
}

impl Default for RagChunkSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            chunk_size: 1000,
            overlap_size: 100,
            include_metadata: true,
            include_community_context: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorySettings {
    pub enabled: bool,
    pub max_story_length: usize,
    pub include_coordinates: bool,
    pub include_neighborhood_context: bool,
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_story_length: 2000,
            include_coordinates: true,
            include_neighborhood_context: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuerySettings {
    pub enabled: bool,
    pub sample_properties: usize,
    pub patterns_per_property: usize,
}

impl Default for SearchQuerySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_properties: 100,
            patterns_per_property: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub generate_reports: bool,
    pub field_analysis: bool,
    pub statistics: StatisticsSettings,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            generate_reports: true,
            field_analysis: true,
            statistics: StatisticsSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsSettings {
    pub enabled: bool,
    pub ownership_analysis: bool,
    pub zoning_analysis: bool,
    pub value_analysis: bool,
    pub year_built_analysis: bool,
    pub neighborhood_analysis: bool,
    /// Length of ranked lists (top owners, top zonings by value)
    pub top_n: usize,
}

impl Default for StatisticsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ownership_analysis: true,
            zoning_analysis: true,
            value_analysis: true,
            year_built_analysis: true,
            neighborhood_analysis: true,
            top_n: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file_name: String,
    /// Explicit log file; defaults to `file_name` under the reports directory
    pub file_path: Option<PathBuf>,
    pub max_file_size_mb: u64,
    pub backup_count: usize,
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file_name: "processing.log".to_string(),
            file_path: None,
            max_file_size_mb: 10,
            backup_count: 5,
            console: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorHandlingSettings {
    pub continue_on_error: bool,
    pub max_errors_before_stop: usize,
    pub log_errors: bool,
    pub save_error_reports: bool,
}

impl Default for ErrorHandlingSettings {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            max_errors_before_stop: 100,
            log_errors: true,
            save_error_reports: true,
        }
    }
}

impl ErrorHandlingSettings {
    /// Error count at which a run aborts. Without `continue_on_error` the
    /// first error is fatal.
    pub fn effective_limit(&self) -> usize {
        if self.continue_on_error {
            self.max_errors_before_stop
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSettings {
    pub enable_parallel_processing: bool,
    pub max_workers: usize,
    pub memory_limit_mb: u64,
    pub batch_processing_size: usize,
    pub show_progress: bool,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            enable_parallel_processing: false,
            max_workers: 4,
            memory_limit_mb: 1024,
            batch_processing_size: 1000,
            show_progress: false,
        }
    }
}

impl PerformanceSettings {
    /// Records per in-flight batch, capped so that every worker's batch fits
    /// in the memory budget at the given average record footprint.
    pub fn effective_batch_size(&self, avg_record_bytes: u64) -> usize {
        let budget = self.memory_limit_mb.saturating_mul(1024 * 1024);
        let workers = if self.enable_parallel_processing {
            self.max_workers.max(1) as u64
        } else {
            1
        };
        let per_record = avg_record_bytes.max(1).saturating_mul(workers);
        let memory_cap = (budget / per_record).max(1);
        let memory_cap = usize::try_from(memory_cap).unwrap_or(usize::MAX);
        self.batch_processing_size.max(1).min(memory_cap)
    }
}

/// Optional bounding box applied on top of the global coordinate ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateBounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl CoordinateBounds {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && (self.min_longitude..=self.max_longitude).contains(&longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub validate_geojson: bool,
    pub check_required_fields: bool,
    pub validate_coordinates: bool,
    pub validate_data_types: bool,
    pub required_fields: Vec<CanonicalField>,
    pub coordinate_bounds: Option<CoordinateBounds>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            validate_geojson: true,
            check_required_fields: true,
            validate_coordinates: true,
            validate_data_types: true,
            required_fields: vec![CanonicalField::Address, CanonicalField::Owner],
            coordinate_bounds: None,
        }
    }
}

/// Source path for each canonical field; `null` unmaps a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMappingSettings {
    pub address: Option<String>,
    pub owner: Option<String>,
    pub zoning: Option<String>,
    pub year_built: Option<String>,
    pub building_value: Option<String>,
    pub neighborhood: Option<String>,
    pub municipality: Option<String>,
    pub trash_route: Option<String>,
    pub land_value: Option<String>,
    pub total_value: Option<String>,
    pub flood_zone: Option<String>,
    pub folio: Option<String>,
}

impl Default for FieldMappingSettings {
    fn default() -> Self {
        let path = |s: &str| Some(s.to_string());
        Self {
            address: path("AddressPoints.TRUE_SITE_"),
            owner: path("AddressPoints.TRUE_OWNER"),
            zoning: path("AddressPoints.PRIMARY_ZO"),
            year_built: path("AddressPoints.YEAR_BUILT"),
            building_value: path("AddressPoints.BUILDING_V"),
            neighborhood: path("AddressPoints.NEIGHBORHO"),
            municipality: path("AddressPoints.MUNICIPALI"),
            trash_route: path("AddressPoints_AddSpatialJoin_10.Route"),
            land_value: path("AddressPoints.LAND_VAL_2"),
            total_value: path("AddressPoints.TOTAL_VAL1"),
            flood_zone: path("AddressPoints.FLOOD_ZONE"),
            folio: path("AddressPoints.FOLIO"),
        }
    }
}

impl FieldMappingSettings {
    /// Configured source path for a canonical field
    pub fn source_for(&self, field: CanonicalField) -> Option<&str> {
        let path = match field {
            CanonicalField::Address => &self.address,
            CanonicalField::Owner => &self.owner,
            CanonicalField::Zoning => &self.zoning,
            CanonicalField::YearBuilt => &self.year_built,
            CanonicalField::BuildingValue => &self.building_value,
            CanonicalField::Neighborhood => &self.neighborhood,
            CanonicalField::Municipality => &self.municipality,
            CanonicalField::TrashRoute => &self.trash_route,
            CanonicalField::LandValue => &self.land_value,
            CanonicalField::TotalValue => &self.total_value,
            CanonicalField::FloodZone => &self.flood_zone,
            CanonicalField::Folio => &self.folio,
        };
        path.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Output format toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFormats {
    pub json: bool,
    pub jsonl: bool,
    pub csv: bool,
}

impl Default for OutputFormats {
    fn default() -> Self {
        Self {
            json: true,
            jsonl: true,
            csv: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Jsonl => "jsonl",
            Self::Csv => "csv",
        }
    }
}

impl OutputFormats {
    pub fn enabled(&self) -> Vec<OutputFormat> {
        let mut formats = Vec::new();
        if self.json {
            formats.push(OutputFormat::Json);
        }
        if self.jsonl {
            formats.push(OutputFormat::Jsonl);
        }
        if self.csv {
            formats.push(OutputFormat::Csv);
        }
        formats
    }
}

/// When backups are taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupFrequency {
    /// Snapshot existing outputs before the write stage
    #[default]
    BeforeProcessing,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    pub create_backups: bool,
    pub frequency: BackupFrequency,
    pub keep_backups: usize,
    pub compress: bool,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            create_backups: true,
            frequency: BackupFrequency::BeforeProcessing,
            keep_backups: 5,
            compress: false,
        }
    }
}

impl BackupSettings {
    pub fn backs_up_before_processing(&self) -> bool {
        self.create_backups && self.frequency == BackupFrequency::BeforeProcessing
    }
}

impl Settings {
    /// Create settings with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a YAML document
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse settings from YAML text; an empty document yields the defaults
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Check cross-field constraints. Run once at start.
    pub fn validate(&self) -> ConfigResult<()> {
        let rag = &self.llm_training.rag_chunks;
        if rag.chunk_size == 0 {
            return Err(ConfigError::invalid(
                "llm_training.rag_chunks.chunk_size",
                "must be greater than zero",
            ));
        }
        if rag.overlap_size >= rag.chunk_size {
            return Err(ConfigError::InvalidChunkConfig {
                chunk_size: rag.chunk_size,
                overlap_size: rag.overlap_size,
            });
        }
        if self.processing.records_per_file == 0 {
            return Err(ConfigError::invalid(
                "processing.records_per_file",
                "must be greater than zero",
            ));
        }
        if self.error_handling.max_errors_before_stop == 0 {
            return Err(ConfigError::invalid(
                "error_handling.max_errors_before_stop",
                "must be greater than zero",
            ));
        }
        if self.output_formats.enabled().is_empty() {
            return Err(ConfigError::invalid(
                "output_formats",
                "at least one of json, jsonl or csv must be enabled",
            ));
        }
        if self.backup.create_backups && self.backup.keep_backups == 0 {
            return Err(ConfigError::invalid(
                "backup.keep_backups",
                "must be at least 1 when backups are enabled",
            ));
        }
        if self.input.max_file_size_mb == 0 {
            return Err(ConfigError::invalid(
                "input.max_file_size_mb",
                "must be greater than zero",
            ));
        }
        if self.performance.enable_parallel_processing && self.performance.max_workers == 0 {
            return Err(ConfigError::invalid(
                "performance.max_workers",
                "must be at least 1 when parallel processing is enabled",
            ));
        }
        if self.logging.max_file_size_mb == 0 {
            return Err(ConfigError::invalid(
                "logging.max_file_size_mb",
                "must be greater than zero",
            ));
        }
        if let Some(bounds) = &self.validation.coordinate_bounds {
            if bounds.min_latitude > bounds.max_latitude
                || bounds.min_longitude > bounds.max_longitude
            {
                return Err(ConfigError::invalid(
                    "validation.coordinate_bounds",
                    "minimums must not exceed maximums",
                ));
            }
        }
        for field in &self.validation.required_fields {
            if self.field_mapping.source_for(*field).is_none() {
                return Err(ConfigError::invalid(
                    "validation.required_fields",
                    format!("required field '{field}' has no field_mapping entry"),
                ));
            }
        }
        Ok(())
    }

    /// SHA-256 fingerprint of the effective configuration
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        // Only non-UTF-8 paths fail to serialize
        let canonical = serde_json::to_string(self).unwrap_or_default();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Path of the processing log
    pub fn log_file_path(&self) -> PathBuf {
        match &self.logging.file_path {
            Some(path) => path.clone(),
            None => self.output.reports_directory.join(&self.logging.file_name),
        }
    }

    /// Set input file path
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input.file_path = path.into();
        self
    }

    /// Place all outputs under one root directory
    pub fn with_output_root(mut self, root: impl AsRef<Path>) -> Self {
        self.output = OutputSettings::under(root);
        self
    }

    pub fn with_records_per_file(mut self, records_per_file: usize) -> Self {
        self.processing.records_per_file = records_per_file;
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.performance.enable_parallel_processing = enabled;
        self
    }

    pub fn with_backups(mut self, enabled: bool) -> Self {
        self.backup.create_backups = enabled;
        self
    }
}
