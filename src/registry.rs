//! Dictionary registration: which catalog a discovered file belongs to.
//!
//! A dictionary owns the [`Catalog`] for one file-type family. The registry
//! maps file extensions to dictionaries and enforces the one real invariant
//! here: an extension may only be registered once, unless the caller
//! explicitly asks to override the existing registration.

use std::any::Any;
use std::collections::HashMap;

use crate::error::{FixturaError, Result};
use crate::library::Catalog;

/// Item file types that are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemFileType {
    Sql,
    Xml,
    Json,
    Text,
}

/// A keyed store of library items for one file-type family.
pub trait ItemDictionary: Any {
    /// The file extension, including the period.
    fn file_extension(&self) -> &'static str;
    fn file_type(&self) -> ItemFileType;
    fn catalog(&self) -> &Catalog;
    fn catalog_mut(&mut self) -> &mut Catalog;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Plain key → text fixtures stored as JSON files.
#[derive(Debug, Default)]
pub struct JsonLibrary {
    catalog: Catalog,
}

impl JsonLibrary {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemDictionary for JsonLibrary {
    fn file_extension(&self) -> &'static str {
        ".json"
    }
    fn file_type(&self) -> ItemFileType {
        ItemFileType::Json
    }
    fn catalog(&self) -> &Catalog {
        &self.catalog
    }
    fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Plain key → text fixtures stored as XML files.
#[derive(Debug, Default)]
pub struct XmlLibrary {
    catalog: Catalog,
}

impl XmlLibrary {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemDictionary for XmlLibrary {
    fn file_extension(&self) -> &'static str {
        ".xml"
    }
    fn file_type(&self) -> ItemFileType {
        ItemFileType::Xml
    }
    fn catalog(&self) -> &Catalog {
        &self.catalog
    }
    fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Plain key → text fixtures stored as text files.
#[derive(Debug, Default)]
pub struct TextLibrary {
    catalog: Catalog,
}

impl TextLibrary {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemDictionary for TextLibrary {
    fn file_extension(&self) -> &'static str {
        ".txt"
    }
    fn file_type(&self) -> ItemFileType {
        ItemFileType::Text
    }
    fn catalog(&self) -> &Catalog {
        &self.catalog
    }
    fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Extension → dictionary registry, plus the file-type → extension mapping
/// used to find a dictionary by its [`ItemFileType`].
#[derive(Default)]
pub struct DictionaryRegistry {
    dictionaries: HashMap<String, Box<dyn ItemDictionary>>,
    extension_for: HashMap<ItemFileType, String>,
}

impl DictionaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dictionary under its file extension.
    ///
    /// Registering an extension twice is an error unless
    /// `override_registration` is set, in which case the new dictionary
    /// replaces the old one under the same extension key. The file-type →
    /// extension mapping is only ever added for a fresh extension; the first
    /// mapping wins, even across an override.
    pub fn register(
        &mut self,
        dictionary: Box<dyn ItemDictionary>,
        override_registration: bool,
    ) -> Result<()> {
        let extension = dictionary.file_extension().to_owned();
        if self.dictionaries.contains_key(&extension) {
            if !override_registration {
                return Err(FixturaError::Registration { extension });
            }
            self.dictionaries.insert(extension, dictionary);
        } else {
            let file_type = dictionary.file_type();
            self.dictionaries.insert(extension.clone(), dictionary);
            self.extension_for.entry(file_type).or_insert(extension);
        }
        Ok(())
    }

    pub fn get(&self, extension: &str) -> Option<&dyn ItemDictionary> {
        self.dictionaries.get(extension).map(Box::as_ref)
    }

    pub fn get_mut(&mut self, extension: &str) -> Option<&mut dyn ItemDictionary> {
        self.dictionaries
            .get_mut(extension)
            .map(|dictionary| dictionary.as_mut())
    }

    pub fn contains_extension(&self, extension: &str) -> bool {
        self.dictionaries.contains_key(extension)
    }

    pub fn extension_for(&self, file_type: ItemFileType) -> Option<&str> {
        self.extension_for.get(&file_type).map(String::as_str)
    }

    pub fn by_type(&self, file_type: ItemFileType) -> Option<&dyn ItemDictionary> {
        self.get(self.extension_for.get(&file_type)?)
    }

    pub fn by_type_mut(&mut self, file_type: ItemFileType) -> Option<&mut dyn ItemDictionary> {
        let extension = self.extension_for.get(&file_type)?.clone();
        self.get_mut(&extension)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.dictionaries.keys().map(String::as_str)
    }
}
