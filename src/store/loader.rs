//! Template loader over an override root and built-in roots
//!
//! Every lookup goes back to the filesystem; nothing is cached, so edits to stored
//! templates are picked up by the next call.

use crate::store::definition::{Definition, GroupDefinition, PresetDefinition};
use crate::store::{StoreConfig, StoreError};
use crate::types::{TemplateKind, TemplateRef};
use crate::{Error, ErrorContext, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSIONS: &[&str] = &["yaml", "yml"];
const HINT_LIMIT: usize = 10;

/// Read-through store of preset and group definitions.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    config: StoreConfig,
}

impl TemplateStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Store configured from `AI_PRESET_DIR` / `AI_PRESET_BUILTIN`
    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load a definition of the given kind by name.
    pub fn resolve(&self, kind: TemplateKind, name: &str) -> Result<Definition> {
        match kind {
            TemplateKind::Preset => self.load_preset(name).map(Definition::Preset),
            TemplateKind::Group => self.load_group(name).map(Definition::Group),
        }
    }

    pub fn load_preset(&self, name: &str) -> Result<PresetDefinition> {
        let (path, value) = self.read_definition(TemplateKind::Preset, name)?;
        let definition = PresetDefinition::from_yaml(name, &value)?;
        debug!(
            preset = name,
            path = %path.display(),
            items = definition.items.len(),
            "loaded preset"
        );
        Ok(definition)
    }

    pub fn load_group(&self, name: &str) -> Result<GroupDefinition> {
        let (path, value) = self.read_definition(TemplateKind::Group, name)?;
        let definition = GroupDefinition::from_yaml(name, &value)?;
        debug!(
            group = name,
            path = %path.display(),
            entries = definition.entries.len(),
            "loaded preset group"
        );
        Ok(definition)
    }

    /// Locate the file backing `name` in the area of `kind`.
    ///
    /// Qualified names (`category/name`) are looked up directly, first hit wins.
    /// Unqualified names are searched in every category; the same relative id in
    /// several roots counts once (the override copy shadows the built-in one), while
    /// distinct ids are reported as ambiguous.
    pub fn locate(&self, kind: TemplateKind, name: &str) -> std::result::Result<PathBuf, StoreError> {
        self.find(kind, name).map(|(_, path)| path)
    }

    /// Canonical form of `reference`: the relative id of the file it names.
    ///
    /// `tutor` and `roles/tutor` yield the same reference when they name the same file.
    pub fn canonical_ref(&self, reference: &TemplateRef) -> Result<TemplateRef> {
        let (id, _) = self.find_checked(reference.kind(), reference.name())?;
        Ok(match reference.kind() {
            TemplateKind::Preset => TemplateRef::Preset(id),
            TemplateKind::Group => TemplateRef::Group(id),
        })
    }

    fn find(&self, kind: TemplateKind, name: &str) -> std::result::Result<(String, PathBuf), StoreError> {
        let name = normalize_name(name)?;

        if name.contains('/') {
            for root in self.config.search_roots() {
                let base = root.join(kind.area());
                for ext in EXTENSIONS {
                    let candidate = base.join(format!("{}.{}", name, ext));
                    if candidate.is_file() {
                        return Ok((name, candidate));
                    }
                }
            }
            return Err(self.not_found(kind, &name));
        }

        let mut matches: Vec<(String, PathBuf)> = Vec::new();
        for root in self.config.search_roots() {
            for (id, path) in scan_area(&root.join(kind.area())) {
                let stem = id.rsplit('/').next().unwrap_or(&id);
                if stem == name && !matches.iter().any(|(seen, _)| *seen == id) {
                    matches.push((id, path));
                }
            }
        }

        match matches.len() {
            0 => Err(self.not_found(kind, &name)),
            1 => Ok(matches.remove(0)),
            _ => Err(StoreError::Ambiguous {
                name,
                candidates: matches.into_iter().map(|(id, _)| id).collect(),
            }),
        }
    }

    /// [`Self::find`], reporting a name that only exists as the other kind as an
    /// invalid reference.
    fn find_checked(&self, kind: TemplateKind, name: &str) -> Result<(String, PathBuf)> {
        match self.find(kind, name) {
            Ok(found) => Ok(found),
            Err(StoreError::NotFound { .. }) if self.find(kind.other(), name).is_ok() => {
                Err(Error::invalid_reference(
                    format!("'{}' is a {}, not a {}", name, kind.other(), kind),
                    ErrorContext::new()
                        .with_field_path(format!("{}:{}", kind, name))
                        .with_source("template_store"),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All ids available for `kind`, deduplicated across roots and sorted.
    pub fn list(&self, kind: TemplateKind) -> Vec<String> {
        let mut ids: Vec<String> = self
            .config
            .search_roots()
            .flat_map(|root| scan_area(&root.join(kind.area())))
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    fn read_definition(
        &self,
        kind: TemplateKind,
        name: &str,
    ) -> Result<(PathBuf, serde_yaml::Value)> {
        let (_, path) = self.find_checked(kind, name)?;
        let value = read_yaml(&path)?;
        Ok((path, value))
    }

    fn not_found(&self, kind: TemplateKind, name: &str) -> StoreError {
        let available = self.list(kind);
        let hint = if available.is_empty() {
            format!(
                "no {} definitions found under '{}/' in the configured roots",
                kind,
                kind.area()
            )
        } else {
            let mut hint = format!(
                "available: {}",
                available
                    .iter()
                    .take(HINT_LIMIT)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            if available.len() > HINT_LIMIT {
                hint.push_str(&format!(" ({} more)", available.len() - HINT_LIMIT));
            }
            hint
        };
        StoreError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
            hint: None,
        }
        .with_hint(hint)
    }
}

fn normalize_name(raw: &str) -> std::result::Result<String, StoreError> {
    let name = raw.trim().replace('\\', "/");
    let invalid = |reason: &str| StoreError::InvalidName {
        name: raw.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.starts_with('/') || Path::new(&name).is_absolute() {
        return Err(invalid("absolute paths are not allowed"));
    }
    if name
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(invalid("name contains an empty, '.' or '..' segment"));
    }
    Ok(name)
}

/// Recursively list definition files under an area directory as `(id, path)`,
/// where the id is the relative path without extension. Entries are visited in
/// name order so results are stable across platforms.
fn scan_area(area: &Path) -> Vec<(String, PathBuf)> {
    let mut out = Vec::new();
    if area.is_dir() {
        walk(area, "", &mut out);
    }
    out
}

fn walk(dir: &Path, prefix: &str, out: &mut Vec<(String, PathBuf)>) {
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping unreadable template directory");
            return;
        }
    };
    entries.sort();

    for path in entries {
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if path.is_dir() {
            walk(&path, &format!("{}{}/", prefix, file_name), out);
            continue;
        }
        let is_definition = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if !is_definition {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            let id = format!("{}{}", prefix, stem);
            if !out.iter().any(|(seen, _)| *seen == id) {
                out.push((id, path.clone()));
            }
        }
    }
}

fn read_yaml(path: &Path) -> std::result::Result<serde_yaml::Value, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::LoadError {
        path: path.to_string_lossy().to_string(),
        reason: e.to_string(),
    })?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    serde_yaml::from_str(content).map_err(|e| StoreError::YamlError {
        path: path.to_string_lossy().to_string(),
        reason: e.to_string(),
    })
}
