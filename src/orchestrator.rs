//! Orchestrator
//!
//! Composes the engine's single public entry point: resolve the template
//! name via the index, fetch-or-compile the definition through an explicit
//! cache, run the state machine, return the records. No retries happen here;
//! retry policy belongs to the caller.
//!
//! The definition cache is keyed by a blake3 hash of the template source, so
//! an edited template file compiles fresh under a new key while identical
//! sources share one definition. Compilation is pure, so a race that
//! compiles the same source twice is wasted work but never unsound.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use thiserror::Error;

use crate::engine;
use crate::index::{IndexError, IndexStore};
use crate::record::Record;
use crate::template::{compile, TemplateDefinition};
use crate::EngineError;

/// Index or template sources missing or unreadable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read template {path}: {source}")]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Resolve, compile (cached), parse, project.
#[derive(Debug)]
pub struct Orchestrator {
    index: IndexStore,
    template_dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<TemplateDefinition>>>,
}

impl Orchestrator {
    /// Build from an already-loaded index table.
    pub fn new(index: IndexStore, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            index,
            template_dir: template_dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load the index from disk and build an orchestrator over a template
    /// directory.
    pub fn from_paths(
        index_file: impl AsRef<Path>,
        template_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let index = IndexStore::from_file(index_file)?;
        Ok(Self::new(index, template_dir))
    }

    /// The loaded index table.
    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    /// Parse raw command output for a platform/command pair.
    pub fn run(
        &self,
        platform: &str,
        command: &str,
        raw_text: &str,
    ) -> Result<Vec<Record>, EngineError> {
        let template_name = self.index.resolve(platform, command)?.to_string();
        debug!("running template {template_name} for ({platform}, {command})");
        let definition = self.definition(&template_name)?;
        let records = engine::run(&definition, raw_text)?;
        Ok(records)
    }

    /// Number of distinct compiled definitions currently cached.
    pub fn cached_definitions(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn definition(&self, name: &str) -> Result<Arc<TemplateDefinition>, EngineError> {
        let path = self.template_dir.join(name);
        let source = fs::read_to_string(&path).map_err(|source| ConfigError::TemplateIo {
            path: path.clone(),
            source,
        })?;
        let key = blake3::hash(source.as_bytes()).to_hex().to_string();

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(definition) = cache.get(&key) {
                debug!("template cache hit for {name}");
                return Ok(Arc::clone(definition));
            }
        }

        debug!("compiling template {name}");
        let definition = Arc::new(compile(&source)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(key).or_insert(definition)))
    }
}
