//! JSON locator repository.
//!
//! Locator files map page names to element definitions:
//!
//! ```json
//! {
//!   "HomePage": {
//!     "searchBox": { "locator": "#textInput", "name": "Search box", "type": "TextBox" },
//!     "searchButton": { "locator": "//button[@data-selenium='searchButton']", "type": "Button" }
//!   }
//! }
//! ```
//!
//! `name` defaults to the element key and `type` to `Element`; an unknown
//! `type` falls back to `Element` with a warning. Files are parsed once and
//! kept in the repository's own cache.

use crate::config::Config;
use crate::element::{Element, ElementKind};
use crate::locator::Locator;
use crate::result::{PageError, PageResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// One element entry in a locator file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDefinition {
    /// Selector string
    pub locator: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Element type name, e.g. `TextBox`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    /// Wait timeout override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ElementDefinition {
    /// Kind named by `type`, `Element` when missing or unknown
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self.element_type.as_deref() {
            None => ElementKind::Element,
            Some(name) => ElementKind::from_type_name(name).unwrap_or_else(|| {
                warn!(
                    element_type = name,
                    locator = %self.locator,
                    "Unknown element type, using Element"
                );
                ElementKind::Element
            }),
        }
    }

    /// Build the element; `key` is the name when none is given
    #[must_use]
    pub fn to_element(&self, key: &str) -> Element {
        let mut locator = Locator::new(&self.locator);
        if let Some(ms) = self.timeout {
            locator = locator.with_timeout(Duration::from_millis(ms));
        }
        Element::from_locator(self.kind(), locator, self.name.as_deref().unwrap_or(key))
    }
}

/// Element definitions of one page, keyed by element name
pub type PageDefinition = BTreeMap<String, ElementDefinition>;

type LocatorFile = BTreeMap<String, PageDefinition>;

/// Locator files under one directory, parsed on first use
#[derive(Debug, Clone)]
pub struct LocatorRepository {
    root: PathBuf,
    files: HashMap<String, LocatorFile>,
}

impl LocatorRepository {
    /// Repository reading files relative to `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: HashMap::new(),
        }
    }

    /// Repository rooted at the configured `locatorDir`
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.locator_dir())
    }

    /// Directory files are read from
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of files parsed so far
    #[must_use]
    pub fn cached_files(&self) -> usize {
        self.files.len()
    }

    /// Forget every parsed file
    pub fn clear_cache(&mut self) {
        self.files.clear();
    }

    /// Register file content under `file` without touching the disk
    pub fn insert_json(&mut self, file: &str, json: &str) -> PageResult<()> {
        let parsed = parse(file, json)?;
        self.files.insert(file.to_string(), parsed);
        Ok(())
    }

    fn load(&mut self, file: &str) -> PageResult<&LocatorFile> {
        if !self.files.contains_key(file) {
            let path = self.root.join(file);
            let json = std::fs::read_to_string(&path).map_err(|e| PageError::LocatorFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let parsed = parse(&path.display().to_string(), &json)?;
            debug!(file = %path.display(), pages = parsed.len(), "Loaded locator file");
            self.files.insert(file.to_string(), parsed);
        }
        self.files.get(file).ok_or_else(|| PageError::LocatorFile {
            path: file.to_string(),
            message: "not loaded".to_string(),
        })
    }

    /// Page names defined in `file`
    pub fn pages(&mut self, file: &str) -> PageResult<Vec<String>> {
        Ok(self.load(file)?.keys().cloned().collect())
    }

    /// All definitions of `page`
    pub fn page(&mut self, file: &str, page: &str) -> PageResult<&PageDefinition> {
        self.load(file)?
            .get(page)
            .ok_or_else(|| PageError::UnknownPage {
                page: page.to_string(),
            })
    }

    /// Definition of one element
    pub fn definition(
        &mut self,
        file: &str,
        page: &str,
        element: &str,
    ) -> PageResult<&ElementDefinition> {
        self.page(file, page)?
            .get(element)
            .ok_or_else(|| PageError::UnknownElement {
                page: page.to_string(),
                element: element.to_string(),
            })
    }

    /// Selector string of one element
    pub fn locator(&mut self, file: &str, page: &str, element: &str) -> PageResult<String> {
        Ok(self.definition(file, page, element)?.locator.clone())
    }

    /// Built element
    pub fn element(&mut self, file: &str, page: &str, element: &str) -> PageResult<Element> {
        Ok(self.definition(file, page, element)?.to_element(element))
    }
}

fn parse(path: &str, json: &str) -> PageResult<LocatorFile> {
    serde_json::from_str(json).map_err(|e| PageError::LocatorFile {
        path: path.to_string(),
        message: e.to_string(),
    })
}
