//! 预设解析模块：递归展开预设与预设组，并检测循环引用。
//!
//! # Preset Resolver
//!
//! Expands a [`TemplateRef`] into a flat, ordered list of [`MessageFragment`]s:
//!
//! - a preset yields its fragments in declared order, each body macro-expanded and
//!   tagged with the preset name as origin;
//! - a group expands its references in order and concatenates the results.
//!
//! Cycles are caught by [`ResolutionContext`] before the repeated name is loaded.

mod context;

pub use context::ResolutionContext;

use crate::macros::MacroEvaluator;
use crate::store::{PresetItem, TemplateStore};
use crate::types::{MessageFragment, MessageRole, TemplateRef};
use crate::Result;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

pub struct PresetResolver<'a, R = StdRng> {
    store: &'a TemplateStore,
    macros: &'a mut MacroEvaluator<R>,
}

impl<'a, R: Rng> PresetResolver<'a, R> {
    pub fn new(store: &'a TemplateStore, macros: &'a mut MacroEvaluator<R>) -> Self {
        Self { store, macros }
    }

    /// Expand `reference` into fragments, in declaration order.
    pub fn expand(
        &mut self,
        reference: &TemplateRef,
        ctx: &mut ResolutionContext,
    ) -> Result<Vec<MessageFragment>> {
        let mut out = Vec::new();
        self.expand_into(reference, ctx, &mut out)?;
        debug!(reference = %reference, fragments = out.len(), "resolved template reference");
        Ok(out)
    }

    /// Non-empty system bodies of a preset, joined with a blank line.
    pub fn system_text(&mut self, name: &str) -> Result<String> {
        let fragments = self.expand(&TemplateRef::preset(name), &mut ResolutionContext::new())?;
        Ok(fragments
            .iter()
            .filter(|f| f.role == MessageRole::System && !f.content.is_empty())
            .map(|f| f.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    fn expand_into(
        &mut self,
        reference: &TemplateRef,
        ctx: &mut ResolutionContext,
        out: &mut Vec<MessageFragment>,
    ) -> Result<()> {
        // the path is keyed on the located id, so `a` and `cat/a` collide
        let key = self.store.canonical_ref(reference)?;
        ctx.enter(&key)?;
        let result = match reference {
            TemplateRef::Preset(name) => self.expand_preset(key.name(), name, ctx, out),
            TemplateRef::Group(_) => self.expand_group(key.name(), ctx, out),
        };
        ctx.exit();
        result
    }

    fn expand_preset(
        &mut self,
        id: &str,
        origin: &str,
        ctx: &mut ResolutionContext,
        out: &mut Vec<MessageFragment>,
    ) -> Result<()> {
        let definition = self.store.load_preset(id)?;
        for item in &definition.items {
            match item {
                PresetItem::Template(template) => {
                    let content = self.macros.expand(&template.content);
                    out.push(MessageFragment::new(template.role, content, origin));
                }
                PresetItem::Reference(nested) => self.expand_into(nested, ctx, out)?,
            }
        }
        Ok(())
    }

    fn expand_group(
        &mut self,
        id: &str,
        ctx: &mut ResolutionContext,
        out: &mut Vec<MessageFragment>,
    ) -> Result<()> {
        let definition = self.store.load_group(id)?;
        for entry in &definition.entries {
            self.expand_into(entry, ctx, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use crate::Error;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn store(root: &Path) -> TemplateStore {
        TemplateStore::new(StoreConfig::new().with_builtin_roots([root]))
    }

    #[test]
    fn test_preset_fragments_tagged_with_origin() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "preset/tutorial.yaml",
            "- system: S\n- user: Q1\n- assistant: 'A{{roll:1d1}}'\n",
        );
        let store = store(dir.path());
        let mut macros = MacroEvaluator::seeded(1);
        let mut resolver = PresetResolver::new(&store, &mut macros);

        let fragments = resolver
            .expand(&TemplateRef::preset("tutorial"), &mut ResolutionContext::new())
            .unwrap();
        let shape: Vec<(MessageRole, &str, &str)> = fragments
            .iter()
            .map(|f| (f.role, f.content.as_str(), f.origin.as_str()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (MessageRole::System, "S", "tutorial"),
                (MessageRole::User, "Q1", "tutorial"),
                (MessageRole::Assistant, "A1", "tutorial"),
            ]
        );
    }

    #[test]
    fn test_nested_preset_keeps_own_origin() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "preset/outer.yaml", "- system: O\n- preset: inner\n- user: U\n");
        write(dir.path(), "preset/inner.yaml", "- system: I\n");
        let store = store(dir.path());
        let mut macros = MacroEvaluator::seeded(1);
        let mut resolver = PresetResolver::new(&store, &mut macros);

        let fragments = resolver
            .expand(&TemplateRef::preset("outer"), &mut ResolutionContext::new())
            .unwrap();
        let origins: Vec<&str> = fragments.iter().map(|f| f.origin.as_str()).collect();
        assert_eq!(origins, vec!["outer", "inner", "outer"]);
    }

    #[test]
    fn test_preset_self_reference_is_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "preset/loop.yaml", "- user: hi\n- preset: loop\n");
        let store = store(dir.path());
        let mut macros = MacroEvaluator::seeded(1);
        let mut resolver = PresetResolver::new(&store, &mut macros);

        let err = resolver
            .expand(&TemplateRef::preset("loop"), &mut ResolutionContext::new())
            .unwrap_err();
        assert!(matches!(err, Error::CycleDetected { .. }));
    }

    #[test]
    fn test_cycle_through_qualified_spelling() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "groups/cat/a.yaml", "- preset-group: b\n");
        write(dir.path(), "groups/b.yaml", "- preset-group: cat/a\n");
        let store = store(dir.path());
        let mut macros = MacroEvaluator::seeded(1);
        let mut resolver = PresetResolver::new(&store, &mut macros);

        let err = resolver
            .expand(&TemplateRef::group("a"), &mut ResolutionContext::new())
            .unwrap_err();
        match err {
            Error::CycleDetected { path } => {
                assert_eq!(path, vec!["group:cat/a", "group:b", "group:cat/a"]);
            }
            other => panic!("expected CycleDetected, got {:?}", other),
        }
    }

    #[test]
    fn test_origin_keeps_reference_spelling() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "preset/roles/tutor.yaml", "- system: T\n");
        let store = store(dir.path());
        let mut macros = MacroEvaluator::seeded(1);
        let mut resolver = PresetResolver::new(&store, &mut macros);

        let fragments = resolver
            .expand(&TemplateRef::preset("tutor"), &mut ResolutionContext::new())
            .unwrap();
        assert_eq!(fragments[0].origin, "tutor");
    }

    #[test]
    fn test_system_text_joins_non_empty() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "preset/persona.yaml",
            "- system: first\n- system: ''\n- user: q\n- system: second\n",
        );
        let store = store(dir.path());
        let mut macros = MacroEvaluator::seeded(1);
        let mut resolver = PresetResolver::new(&store, &mut macros);
        assert_eq!(resolver.system_text("persona").unwrap(), "first\n\nsecond");
    }
}
