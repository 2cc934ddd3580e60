//! Configuration for sift.
//! One TOML file, every section optional; compiled defaults live in [`defaults`].

pub mod defaults;

mod auto_confirm_config;
mod extractor_config;
mod learning_config;
mod observability_config;
mod server_config;
mod sift_config;
mod storage_config;

pub use auto_confirm_config::AutoConfirmConfig;
pub use extractor_config::ExtractorConfig;
pub use learning_config::LearningConfig;
pub use observability_config::ObservabilityConfig;
pub use server_config::ServerConfig;
pub use sift_config::SiftConfig;
pub use storage_config::StorageConfig;
