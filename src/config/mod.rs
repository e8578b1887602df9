//! Configuration loading
//!
//! Settings are read from a YAML document with serde. Every group and key has
//! a default, so callers can start from [`Settings::default`] and override
//! only what they need:
//!
//! ```rust,ignore
//! use parcel_pipeline::config::Settings;
//!
//! let settings = Settings::load("config.yaml")?;
//! settings.validate()?;
//! ```

mod error;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{
    AnalysisSettings, BackupFrequency, BackupSettings, CoordinateBounds, Encoding,
    ErrorHandlingSettings, FieldMappingSettings, InputSettings, LlmTrainingSettings,
    LoggingSettings, OutputFormat, OutputFormats, OutputSettings, PerformanceSettings,
    ProcessingSettings, QaPairSettings, RagChunkSettings, SearchQuerySettings, Settings,
    StatisticsSettings, StorySettings, ValidationSettings,
};
