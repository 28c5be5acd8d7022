//! On-disk template roots built in a temporary directory

use ai_lib_preset::{StoreConfig, TemplateStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary store root with `preset/` and `groups/` areas.
pub struct StoreFixture {
    dir: TempDir,
}

#[allow(dead_code)]
impl StoreFixture {
    pub fn new() -> Self {
        init_tracing();
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn preset(&self, name: &str, body: &str) -> &Self {
        self.write(&format!("preset/{}.yaml", name), body);
        self
    }

    pub fn group(&self, name: &str, body: &str) -> &Self {
        self.write(&format!("groups/{}.yaml", name), body);
        self
    }

    pub fn write(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, body).expect("write");
        path
    }

    /// Store with this fixture as its only built-in root
    pub fn store(&self) -> TemplateStore {
        TemplateStore::new(StoreConfig::new().with_builtin_roots([self.root()]))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
