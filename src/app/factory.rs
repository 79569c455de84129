use crate::{
    app::service::AppService,
    config::Config,
    notes::BackendCsv,
    semantic::{shared_embedder, EmbedderOptions},
};
use anyhow::{Context, Result};
use homedir::my_home;
use std::path::PathBuf;

/// Environment variable overriding the archive directory
pub const BASE_PATH_ENV: &str = "ILA_BASE_PATH";

/// Application factory for creating and configuring application components
pub struct AppFactory;

impl AppFactory {
    /// Create an application service over the local archive.
    ///
    /// The embedding model is not loaded here; it is loaded on the first
    /// operation that needs a vector.
    pub fn create_app_service(paths: &AppPaths) -> Result<AppService> {
        let config = Self::create_config(paths)?;

        let store = BackendCsv::load(&paths.base_path)
            .with_context(|| format!("Failed to open archive at {}", paths.base_path.display()))?;

        let embedder = shared_embedder(Self::embedder_options(&config, paths));

        Ok(AppService::new(config, Box::new(store), embedder))
    }

    /// Embedding options for this archive; model files go to `paths.models_path`.
    pub fn embedder_options(config: &Config, paths: &AppPaths) -> EmbedderOptions {
        EmbedderOptions::from_config(&config.semantic, paths.models_path.clone())
    }

    /// Get application paths, creating the base directory if needed
    pub fn get_paths() -> Result<AppPaths> {
        let base_path = Self::get_base_path()?;

        std::fs::create_dir_all(&base_path)
            .context("Failed to create application base directory")?;

        Ok(AppPaths::new(base_path))
    }

    /// Load configuration, writing defaults on first run
    pub fn create_config(paths: &AppPaths) -> Result<Config> {
        Config::load_with(&paths.base_path).with_context(|| {
            format!(
                "Failed to load {}",
                paths.base_path.join(crate::config::CONFIG_FILE).display()
            )
        })
    }

    fn get_base_path() -> Result<PathBuf> {
        if let Ok(base_path) = std::env::var(BASE_PATH_ENV) {
            return Ok(PathBuf::from(base_path));
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;

        Ok(home.join(".local/share/ila"))
    }
}

/// Application paths structure
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub base_path: PathBuf,
    pub notes_path: PathBuf,
    pub models_path: PathBuf,
}

impl AppPaths {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            notes_path: base_path.join(crate::notes::NOTES_FILE),
            models_path: base_path.join("models"),
            base_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_paths() {
        let paths = AppPaths::new(PathBuf::from("/test/base"));

        assert_eq!(paths.base_path, PathBuf::from("/test/base"));
        assert_eq!(paths.notes_path, PathBuf::from("/test/base/notes.csv"));
        assert_eq!(paths.models_path, PathBuf::from("/test/base/models"));
    }

    #[test]
    fn test_model_cache_is_models_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(tmp.path().to_path_buf());
        let config = AppFactory::create_config(&paths).unwrap();

        let options = AppFactory::embedder_options(&config, &paths);
        assert_eq!(options.cache_dir, tmp.path().join("models"));
        assert_eq!(options.model, "all-MiniLM-L6-v2");
        assert!(options.normalize);
    }

    #[test]
    fn test_create_config_writes_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(tmp.path().to_path_buf());

        let config = AppFactory::create_config(&paths).unwrap();
        assert_eq!(config.top_k, 3);
        assert!(tmp.path().join(crate::config::CONFIG_FILE).exists());
    }
}
