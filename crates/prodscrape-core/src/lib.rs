pub mod config;
pub mod error;
pub mod record;

pub use config::{
    load_config, AntiBotConfig, HeadersConfig, PaginationConfig, ScrapeConfig, ScrollConfig,
    SelectorsConfig,
};
pub use error::ConfigError;
pub use record::{CandidateRecord, DisplayDefault, FieldName, FieldValue};
