use super::ui::{StyleType, style_text};
use crate::core::config::AppConfig;
use crate::store::Store;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");

#[derive(Debug)]
pub struct SetupReport {
    pub config_path: PathBuf,
    pub config_created: bool,
    pub store_path: PathBuf,
    pub schema_version: u32,
}

/// Writes the example configuration unless one exists, then prepares the
/// offline store at the configured data path.
///
/// Uses `config_path` when given, the platform config location otherwise.
pub fn setup(config_path: Option<&str>) -> Result<()> {
    let config_path = match config_path {
        Some(path) => PathBuf::from(path),
        None => AppConfig::default_config_path()?,
    };
    let report = setup_at_path(config_path)?;

    let verb = if report.config_created {
        "Created"
    } else {
        "Kept existing"
    };
    println!(
        "{} configuration at {}",
        verb,
        style_text(&report.config_path.display().to_string(), StyleType::Title)
    );
    println!(
        "Offline cache ready at {} (schema v{})",
        report.store_path.display(),
        report.schema_version
    );
    Ok(())
}

pub fn setup_at_path<P: AsRef<Path>>(config_path: P) -> Result<SetupReport> {
    let config_path = config_path.as_ref();

    let config_created = !config_path.exists();
    if config_created {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(config_path, EXAMPLE_CONFIG).with_context(|| {
            format!("Failed to write config file to {}", config_path.display())
        })?;
        info!(path = %config_path.display(), "Created default configuration");
    }

    let config = AppConfig::load_from_path(config_path)?;
    let data_path = config.default_data_path()?;
    let store = Store::open(&data_path)
        .with_context(|| format!("Failed to prepare offline cache in {}", data_path.display()))?;
    store.persist()?;

    Ok(SetupReport {
        config_path: config_path.to_path_buf(),
        config_created,
        store_path: data_path.join(crate::store::STORE_NAME),
        schema_version: store.schema_version(),
    })
}
