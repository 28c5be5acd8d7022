//! Expansion path tracking for cycle detection

use crate::types::TemplateRef;
use crate::{Error, Result};

/// Names currently being expanded, outermost first.
///
/// A reference is pushed before its body is expanded and popped when it returns, so
/// the same name may appear again on a disjoint branch.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    path: Vec<TemplateRef>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `reference`, failing if it is already on the path.
    pub fn enter(&mut self, reference: &TemplateRef) -> Result<()> {
        if self.path.contains(reference) {
            let mut path: Vec<String> = self.path.iter().map(ToString::to_string).collect();
            path.push(reference.to_string());
            return Err(Error::CycleDetected { path });
        }
        self.path.push(reference.clone());
        Ok(())
    }

    pub fn exit(&mut self) {
        self.path.pop();
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn path(&self) -> &[TemplateRef] {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentry_is_a_cycle() {
        let mut ctx = ResolutionContext::new();
        ctx.enter(&TemplateRef::group("a")).unwrap();
        ctx.enter(&TemplateRef::group("b")).unwrap();
        let err = ctx.enter(&TemplateRef::group("a")).unwrap_err();
        match err {
            Error::CycleDetected { path } => {
                assert_eq!(path, vec!["group:a", "group:b", "group:a"]);
            }
            other => panic!("expected CycleDetected, got {:?}", other),
        }
    }

    #[test]
    fn test_disjoint_paths_may_repeat() {
        let mut ctx = ResolutionContext::new();
        ctx.enter(&TemplateRef::preset("p")).unwrap();
        ctx.exit();
        ctx.enter(&TemplateRef::preset("p")).unwrap();
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_kinds_are_distinct_keys() {
        let mut ctx = ResolutionContext::new();
        ctx.enter(&TemplateRef::group("tutorial")).unwrap();
        assert!(ctx.enter(&TemplateRef::preset("tutorial")).is_ok());
    }
}
