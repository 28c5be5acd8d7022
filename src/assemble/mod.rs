//! 消息组装模块：将条目列表展开、合并为规范的对话请求。
//!
//! # Message Assembler
//!
//! Walks the caller's entries in order, splices resolved preset/group fragments in at
//! their declared position, merges system text by origin and picks the final user
//! turn as the current message.
//!
//! ```rust,no_run
//! use ai_lib_preset::assemble::MessageAssembler;
//! use ai_lib_preset::store::TemplateStore;
//! use ai_lib_preset::types::Entry;
//!
//! # fn main() -> ai_lib_preset::Result<()> {
//! let store = TemplateStore::from_env();
//! let mut assembler = MessageAssembler::new(&store);
//! let request = assembler.assemble(&[Entry::preset("tutorial"), Entry::user("Q2")])?;
//! println!("{}", request.system_instructions.to_json_string());
//! # Ok(())
//! # }
//! ```

use crate::macros::{MacroEvaluator, MacroWarning};
use crate::resolve::{PresetResolver, ResolutionContext};
use crate::store::TemplateStore;
use crate::types::{
    ConversationRequest, Entry, LiteralMessage, MessageRole, SystemInstructions, Turn,
    CUSTOM_ORIGIN,
};
use crate::{Error, ErrorContext, Result};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

pub struct MessageAssembler<'s, R = StdRng> {
    store: &'s TemplateStore,
    macros: MacroEvaluator<R>,
}

impl<'s> MessageAssembler<'s, StdRng> {
    pub fn new(store: &'s TemplateStore) -> Self {
        Self::with_macros(store, MacroEvaluator::new())
    }
}

impl<'s, R: Rng> MessageAssembler<'s, R> {
    pub fn with_macros(store: &'s TemplateStore, macros: MacroEvaluator<R>) -> Self {
        Self { store, macros }
    }

    /// Resolve `entries` into a conversation request.
    ///
    /// Fails without partial output on any resolution or validation error.
    pub fn assemble(&mut self, entries: &[Entry]) -> Result<ConversationRequest> {
        if entries.is_empty() {
            return Err(Error::missing_current_turn("entry list is empty"));
        }

        let mut system = SystemInstructions::new();
        let mut turns: Vec<Turn> = Vec::new();
        let mut ctx = ResolutionContext::new();

        for (idx, entry) in entries.iter().enumerate() {
            match entry {
                Entry::Message(literal) => {
                    self.push_literal(idx, literal, &mut system, &mut turns)?;
                }
                Entry::Reference(reference) => {
                    let fragments =
                        PresetResolver::new(self.store, &mut self.macros).expand(reference, &mut ctx)?;
                    for fragment in fragments {
                        if !fragment.is_system() {
                            turns.push(fragment.into());
                            continue;
                        }
                        if fragment.origin == CUSTOM_ORIGIN {
                            return Err(Error::validation_with_context(
                                "origin 'custom' is reserved for literal system messages",
                                ErrorContext::new()
                                    .with_field_path(format!("entries[{}]", idx))
                                    .with_details(format!("while resolving {}", reference))
                                    .with_source("message_assembler"),
                            ));
                        }
                        if !fragment.content.is_empty() {
                            system.merge(&fragment.origin, &fragment.content);
                        }
                    }
                }
            }
        }

        let Some(last_user) = turns.iter().rposition(Turn::is_user) else {
            return Err(Error::missing_current_turn(
                "no user message to serve as the current turn",
            ));
        };
        let trailing = turns.len() - last_user - 1;
        if trailing > 0 {
            return Err(Error::missing_current_turn(format!(
                "{} message(s) follow the last user turn",
                trailing
            )));
        }
        let Some(current_message) = turns.pop() else {
            return Err(Error::missing_current_turn("entry list is empty"));
        };

        debug!(
            history = turns.len(),
            system_origins = system.len(),
            attachments = current_message.attachments.len(),
            "assembled conversation"
        );

        Ok(ConversationRequest {
            system_instructions: system,
            history: turns,
            current_message,
        })
    }

    fn push_literal(
        &mut self,
        idx: usize,
        literal: &LiteralMessage,
        system: &mut SystemInstructions,
        turns: &mut Vec<Turn>,
    ) -> Result<()> {
        let at = || {
            ErrorContext::new()
                .with_field_path(format!("entries[{}]", idx))
                .with_source("message_assembler")
        };
        if literal.role != MessageRole::User && !literal.attachments.is_empty() {
            return Err(Error::validation_with_context(
                format!("attachments are only allowed on user messages, not {}", literal.role),
                at(),
            ));
        }
        if literal.role != MessageRole::System
            && literal.content.trim().is_empty()
            && literal.attachments.is_empty()
        {
            return Err(Error::validation_with_context(
                format!("{} message must not be empty", literal.role),
                at(),
            ));
        }

        let content = self.macros.expand(&literal.content);
        match literal.role {
            MessageRole::System => {
                if !content.trim().is_empty() {
                    system.push_custom(content);
                }
            }
            role => turns.push(Turn {
                role,
                content,
                origin: CUSTOM_ORIGIN.to_string(),
                attachments: literal.attachments.clone(),
            }),
        }
        Ok(())
    }

    pub fn warnings(&self) -> &[MacroWarning] {
        self.macros.warnings()
    }

    pub fn take_warnings(&mut self) -> Vec<MacroWarning> {
        self.macros.take_warnings()
    }
}
