//! 模板存储层：按名称从覆盖目录和内置目录加载预设与预设组。
//!
//! # Template Store
//!
//! Loads named preset and group definitions from one or more search roots. An optional
//! override root is searched first, then the built-in roots. Each root holds:
//!
//! ```text
//! <root>/
//! ├── preset/            # PresetDefinitions, optionally in category subdirectories
//! │   ├── tutorial.yaml
//! │   └── roles/tutor.yaml
//! └── groups/            # GroupDefinitions
//!     └── onboarding.yaml
//! ```
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`loader`] | Name lookup (qualified / unqualified) and YAML reading |
//! | [`definition`] | Preset and group definition parsing |
//! | [`config`] | Search root configuration |
//! | [`error`] | Store-specific error types |

pub mod config;
pub mod definition;
pub mod error;
pub mod loader;

pub use config::StoreConfig;
pub use definition::{Definition, FragmentTemplate, GroupDefinition, PresetDefinition, PresetItem};
pub use error::StoreError;
pub use loader::TemplateStore;
