//! # ai-lib-preset
//!
//! 预设解析运行时：把声明式的预设、预设组与字面消息组装成规范的对话请求。
//!
//! Preset resolution runtime - turns a declarative list of presets, preset groups and
//! literal messages into one canonical conversation request for a provider adapter.
//!
//! ## Overview
//!
//! Reusable prompt material lives on disk as YAML: *presets* are ordered role-tagged
//! messages, *groups* bundle presets and other groups. A caller lists what it wants and
//! the library expands references depth-first, evaluates `{{random}}` / `{{roll}}`
//! macros, merges system text by origin and splits the result into history plus the
//! current user turn.
//!
//! ## Core Philosophy
//!
//! - **Declarative**: Prompt composition is data, not code
//! - **Fresh Reads**: Definitions are re-read on every resolution; edits apply immediately
//! - **Fail Whole**: Any resolution error aborts the request without partial output
//! - **Reproducible**: Macro randomness can be seeded for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_lib_preset::{Entry, MessageAssembler, TemplateStore};
//!
//! fn main() -> ai_lib_preset::Result<()> {
//!     let store = TemplateStore::from_env();
//!     let mut assembler = MessageAssembler::new(&store);
//!
//!     let request = assembler.assemble(&[
//!         Entry::group("onboarding"),
//!         Entry::system("Answer in {{random::English::French}}."),
//!         Entry::user("Roll for initiative: {{roll:1d20}}"),
//!     ])?;
//!
//!     println!("{}", request.system_instructions.to_json_string());
//!     println!("{} history turn(s)", request.history.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`store`] | Search roots and YAML definition loading |
//! | [`resolve`] | Depth-first expansion with cycle detection |
//! | [`macros`] | `{{random}}` / `{{roll}}` directive evaluation |
//! | [`assemble`] | System merge and history / current turn split |
//! | [`document`] | YAML request documents and prepared requests |
//! | [`types`] | Core type definitions (entries, fragments, requests) |

pub mod assemble;
pub mod document;
pub mod macros;
pub mod resolve;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use assemble::MessageAssembler;
pub use document::{FormatConfig, PreparedRequest, RequestDocument};
pub use macros::{MacroEvaluator, MacroWarning, MacroWarningKind};
pub use resolve::{PresetResolver, ResolutionContext};
pub use store::{StoreConfig, StoreError, TemplateStore};
pub use types::{
    conversation::{ConversationRequest, SystemBlock, SystemInstructions},
    entry::{Entry, TemplateKind, TemplateRef},
    message::{Attachment, MessageFragment, MessageRole, Turn},
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorKind};
