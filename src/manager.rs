//! The explicit context object coordinating dictionaries and discovery.
//!
//! One [`TestDataManager`] is constructed by the caller and passed around;
//! there is no ambient process-wide instance. The manager registers the
//! default dictionary set, loads [`Settings`], and routes externally
//! discovered files into the dictionary registered for their extension.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::queue::SqlLibrary;
use crate::registry::{
    DictionaryRegistry, ItemFileType, JsonLibrary, TextLibrary, XmlLibrary,
};

/// Settings controlling library discovery.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the folder that signifies a test data library folder.
    pub library_folder_name: String,
    /// Comma-separated list of additional shared search paths.
    pub shared_paths: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library_folder_name: "_TestDataLibrary".to_owned(),
            shared_paths: String::new(),
        }
    }
}

impl Settings {
    /// Layered load: built-in defaults, then an optional `fixtura` config
    /// file in the working directory, then `FIXTURA_`-prefixed environment
    /// variables.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("library_folder_name", "_TestDataLibrary")?
            .set_default("shared_paths", "")?
            .add_source(config::File::with_name("fixtura").required(false))
            .add_source(config::Environment::with_prefix("FIXTURA"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Coordinates the setup and retrieval of item dictionaries.
pub struct TestDataManager {
    settings: Settings,
    registry: DictionaryRegistry,
    search_paths: Vec<PathBuf>,
}

impl TestDataManager {
    /// Registers the default dictionaries (SQL, XML, JSON, text) and parses
    /// the shared search paths from the settings, deduplicated in order.
    pub fn new(settings: Settings) -> Result<Self> {
        let mut registry = DictionaryRegistry::new();
        registry.register(Box::new(SqlLibrary::new()), false)?;
        registry.register(Box::new(XmlLibrary::new()), false)?;
        registry.register(Box::new(JsonLibrary::new()), false)?;
        registry.register(Box::new(TextLibrary::new()), false)?;

        let mut search_paths = Vec::new();
        for path in settings.shared_paths.split(',') {
            let path = path.trim();
            if path.is_empty() {
                continue;
            }
            let path = PathBuf::from(path);
            if !search_paths.contains(&path) {
                search_paths.push(path);
            }
        }

        Ok(Self {
            settings,
            registry,
            search_paths,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &DictionaryRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DictionaryRegistry {
        &mut self.registry
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }

    /// Routes externally discovered `(path, extension)` pairs into the
    /// dictionary registered for each extension. Files with an unregistered
    /// extension are skipped.
    pub fn add_discovered_files<I>(&mut self, files: I)
    where
        I: IntoIterator<Item = (PathBuf, String)>,
    {
        let root_folder = self.settings.library_folder_name.clone();
        for (path, extension) in files {
            match self.registry.get_mut(&extension) {
                Some(dictionary) => {
                    dictionary
                        .catalog_mut()
                        .register_file(&path, &root_folder, &extension);
                }
                None => {
                    debug!(path = %path.display(), %extension, "no dictionary registered for extension");
                }
            }
        }
    }

    /// Sql item dictionary helper.
    pub fn sql(&self) -> Option<&SqlLibrary> {
        self.registry
            .by_type(ItemFileType::Sql)?
            .as_any()
            .downcast_ref()
    }

    pub fn sql_mut(&mut self) -> Option<&mut SqlLibrary> {
        self.registry
            .by_type_mut(ItemFileType::Sql)?
            .as_any_mut()
            .downcast_mut()
    }

    /// Json item dictionary helper.
    pub fn json(&self) -> Option<&JsonLibrary> {
        self.registry
            .by_type(ItemFileType::Json)?
            .as_any()
            .downcast_ref()
    }

    pub fn json_mut(&mut self) -> Option<&mut JsonLibrary> {
        self.registry
            .by_type_mut(ItemFileType::Json)?
            .as_any_mut()
            .downcast_mut()
    }

    /// Xml item dictionary helper.
    pub fn xml(&self) -> Option<&XmlLibrary> {
        self.registry
            .by_type(ItemFileType::Xml)?
            .as_any()
            .downcast_ref()
    }

    pub fn xml_mut(&mut self) -> Option<&mut XmlLibrary> {
        self.registry
            .by_type_mut(ItemFileType::Xml)?
            .as_any_mut()
            .downcast_mut()
    }

    /// Text item dictionary helper.
    pub fn text(&self) -> Option<&TextLibrary> {
        self.registry
            .by_type(ItemFileType::Text)?
            .as_any()
            .downcast_ref()
    }

    pub fn text_mut(&mut self) -> Option<&mut TextLibrary> {
        self.registry
            .by_type_mut(ItemFileType::Text)?
            .as_any_mut()
            .downcast_mut()
    }
}
