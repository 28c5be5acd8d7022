//! Template store configuration

use std::path::{Path, PathBuf};

/// Environment variable naming the override root (checked before built-in roots)
pub const OVERRIDE_DIR_ENV: &str = "AI_PRESET_DIR";
/// Fallback spelling of [`OVERRIDE_DIR_ENV`]
pub const OVERRIDE_PATH_ENV: &str = "AI_PRESET_PATH";
/// Platform path list of built-in roots, replacing the defaults when set
pub const BUILTIN_ROOTS_ENV: &str = "AI_PRESET_BUILTIN";

const DEFAULT_BUILTIN_ROOTS: &[&str] = &["preset_module"];

/// Search roots for preset and group definitions.
///
/// Each root holds a `preset/` area and a `groups/` area. The override root, when set,
/// is always searched first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub override_root: Option<PathBuf>,
    pub builtin_roots: Vec<PathBuf>,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            override_root: None,
            builtin_roots: DEFAULT_BUILTIN_ROOTS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Build from `AI_PRESET_DIR` / `AI_PRESET_PATH` and `AI_PRESET_BUILTIN`.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(root) =
            std::env::var(OVERRIDE_DIR_ENV).or_else(|_| std::env::var(OVERRIDE_PATH_ENV))
        {
            if !root.trim().is_empty() {
                config.override_root = Some(PathBuf::from(root.trim()));
            }
        }
        if let Some(raw) = std::env::var_os(BUILTIN_ROOTS_ENV) {
            let roots: Vec<PathBuf> = std::env::split_paths(&raw)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if !roots.is_empty() {
                config.builtin_roots = roots;
            }
        }
        config
    }

    pub fn with_override_root(mut self, path: impl AsRef<Path>) -> Self {
        self.override_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replace the built-in roots
    pub fn with_builtin_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.builtin_roots = roots
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    pub fn add_builtin_root(mut self, path: impl AsRef<Path>) -> Self {
        self.builtin_roots.push(path.as_ref().to_path_buf());
        self
    }

    /// All roots in search order
    pub fn search_roots(&self) -> impl Iterator<Item = &Path> {
        self.override_root
            .iter()
            .chain(self.builtin_roots.iter())
            .map(PathBuf::as_path)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_order_puts_override_first() {
        let config = StoreConfig::new()
            .with_builtin_roots(["builtin-a", "builtin-b"])
            .with_override_root("local");
        let roots: Vec<&Path> = config.search_roots().collect();
        assert_eq!(
            roots,
            vec![
                Path::new("local"),
                Path::new("builtin-a"),
                Path::new("builtin-b")
            ]
        );
    }

    #[test]
    fn test_default_builtin_root() {
        let config = StoreConfig::default();
        assert!(config.override_root.is_none());
        assert_eq!(config.builtin_roots, vec![PathBuf::from("preset_module")]);
    }
}
