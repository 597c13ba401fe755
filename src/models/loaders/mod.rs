pub mod toml_loader;

pub use toml_loader::{load_all_pipeline_configs, load_pipeline_config};
