//! Collections: an ordered set of mods and the meta cache built from them.
//!
//! A [`ModCollection`] owns exactly one [`MetaCache`]. Whenever the mod list,
//! priorities or settings change, [`ModCollection::recompute`] rebuilds the
//! cache from scratch:
//!
//! 1. Reset the cache.
//! 2. Sort enabled mods by ascending priority, stable on collection order.
//! 3. Replay every mod's active manipulations in that order, so the
//!    highest-priority mod is applied last and wins.
//! 4. Synthesize every file group.

use crate::cache::{MetaCache, RecomputeSummary};
use crate::config::MetaCacheConfig;
use crate::error::Result;
use crate::files::DefaultFileProvider;
use crate::manipulation::{MetaIdentifier, MetaManipulation};
use crate::mods::{ModDefinition, ModId, ModPriority, Setting};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// On-disk description of a collection.
///
/// # JSON format
///
/// ```json
/// {
///   "name": "Default",
///   "mods": [
///     { "path": "mods/viera-hats.json", "enabled": true, "priority": 10, "settings": [1] }
///   ]
/// }
/// ```
///
/// Relative mod paths resolve against the manifest's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionManifest {
    pub name: String,
    #[serde(default)]
    pub mods: Vec<ManifestMod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMod {
    /// Path to the mod's definition JSON.
    pub path: Utf8PathBuf,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: ModPriority,
    /// One setting per option group; missing entries use the group default.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<Setting>,
}

fn default_enabled() -> bool {
    true
}

impl CollectionManifest {
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_std_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }
        std::fs::write(path.as_std_path(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// A mod as it participates in a collection.
#[derive(Debug, Clone)]
pub struct CollectionMod {
    pub definition: ModDefinition,
    pub enabled: bool,
    pub priority: ModPriority,
    pub settings: Vec<Setting>,
}

impl CollectionMod {
    pub fn id(&self) -> &ModId {
        &self.definition.id
    }
}

pub struct ModCollection {
    name: String,
    mods: Vec<CollectionMod>,
    cache: MetaCache,
}

impl ModCollection {
    pub fn new(name: impl Into<String>, provider: Arc<dyn DefaultFileProvider>) -> Self {
        Self {
            name: name.into(),
            mods: Vec::new(),
            cache: MetaCache::new(provider),
        }
    }

    /// Load a manifest and every mod definition it names.
    pub fn from_manifest(path: &Utf8Path, provider: Arc<dyn DefaultFileProvider>) -> Result<Self> {
        let manifest = CollectionManifest::load(path)?;
        let base = path.parent().unwrap_or(Utf8Path::new(""));

        let mut collection = Self::new(manifest.name, provider);
        for entry in manifest.mods {
            let mod_path = if entry.path.is_absolute() {
                entry.path
            } else {
                base.join(&entry.path)
            };
            tracing::debug!("Loading mod definition {}", mod_path);
            let definition = ModDefinition::load(&mod_path)?;
            collection.push(CollectionMod {
                definition,
                enabled: entry.enabled,
                priority: entry.priority,
                settings: entry.settings,
            });
        }

        tracing::info!(
            "Loaded collection '{}' with {} mods",
            collection.name,
            collection.mods.len()
        );
        Ok(collection)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mods(&self) -> &[CollectionMod] {
        &self.mods
    }

    /// Append a mod. Takes effect on the next recompute.
    pub fn push(&mut self, entry: CollectionMod) {
        if self.mods.iter().any(|m| m.id() == entry.id()) {
            tracing::warn!(
                "Collection '{}' already contains mod={}, both copies will be applied",
                self.name,
                entry.id()
            );
        }
        self.mods.push(entry);
    }

    pub fn cache(&self) -> &MetaCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut MetaCache {
        &mut self.cache
    }

    /// The manipulation stream a recompute replays, lowest priority first.
    pub fn ordered_manipulations(
        &self,
        config: &MetaCacheConfig,
    ) -> Vec<(ModId, MetaManipulation)> {
        let mut enabled = self.mods.iter().filter(|m| m.enabled).collect::<Vec<_>>();
        enabled.sort_by_key(|m| m.priority);

        let mut stream = Vec::new();
        for entry in enabled {
            for manipulation in entry.definition.active_manipulations(&entry.settings) {
                if !config.enable_global_rules
                    && matches!(manipulation.identifier, MetaIdentifier::GlobalEqp(_))
                {
                    continue;
                }
                stream.push((entry.id().clone(), manipulation.clone()));
            }
        }
        stream
    }

    /// Rebuild the cache from the current mod list.
    pub fn recompute(&mut self, config: &MetaCacheConfig) -> Result<RecomputeSummary> {
        let stream = self.ordered_manipulations(config);
        tracing::info!(
            "Recomputing collection '{}': {} manipulations from {} enabled mods",
            self.name,
            stream.len(),
            self.mods.iter().filter(|m| m.enabled).count()
        );

        let summary = self.cache.recompute(stream)?;
        if config.log_conflicts {
            for conflict in &summary.conflicts {
                tracing::info!(
                    "{}: mod={} overrides mod={}",
                    conflict.identifier,
                    conflict.winner,
                    conflict.superseded
                );
            }
        }
        Ok(summary)
    }
}
