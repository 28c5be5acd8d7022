//! 类型系统模块：定义对话解析的核心数据类型。
//!
//! # Types Module
//!
//! Strongly-typed representations of everything that flows through resolution:
//! declarative entries in, role-tagged fragments in the middle, and the canonical
//! conversation request out.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Entry`] | Caller entry: literal message or template reference |
//! | [`TemplateRef`] | `preset` / `preset-group` reference by name |
//! | [`MessageFragment`] | Resolved role-tagged unit with origin |
//! | [`Turn`] | Non-system fragment in history or current position |
//! | [`SystemInstructions`] | Origin-keyed, ordered system text |
//! | [`ConversationRequest`] | Final output of assembly |
//!
//! ## Example
//!
//! ```rust
//! use ai_lib_preset::types::{Entry, MessageRole};
//!
//! let entries = vec![
//!     Entry::preset("tutorial"),
//!     Entry::system("Answer briefly."),
//!     Entry::user_with_images("What is in this picture?", ["shots/cat.png"]),
//! ];
//! assert_eq!(entries.len(), 3);
//! # let _ = MessageRole::User;
//! ```

pub mod conversation;
pub mod entry;
pub mod message;

pub use conversation::{ConversationRequest, SystemBlock, SystemInstructions};
pub use entry::{Entry, LiteralMessage, TemplateKind, TemplateRef};
pub use message::{Attachment, MessageFragment, MessageRole, Turn, CUSTOM_ORIGIN};
