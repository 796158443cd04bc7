//! # chat-page-export
//!
//! Exports a captured chat conversation page into downloadable artifacts.
//!
//! ## What it does
//!
//! A browser extension captures the rendered conversation (title, turns, code
//! blocks, page HTML) as JSON. This crate turns that capture into three files
//! sharing one run-scoped name:
//!
//! - `<app>__<project>__<conversation>_<stamp>_text.zip` with the page text and a
//!   Markdown rendering of the conversation,
//! - `<…>_code.zip` with every code block as its own file (only if there are any),
//! - `<…>_full.html`, the page snapshot as captured.
//!
//! Archives are plain store-only ZIP files written by [`archive::build`], no
//! archiving library involved.
//!
//! ## Code file names
//!
//! Each code block gets a name inferred from the text around it: a
//! `checkpoint: <name>` marker wins, then a lone `# name.ext` style comment,
//! otherwise a generic `@auto__<conversation>__block_generic_<NNN>` name. See
//! [`namer`] for the exact rules.
//!
//! ## Usage
//!
//! ```sh
//! # Write the artifacts for a capture into ~/Downloads/chats
//! chat-page-export capture.json ~/Downloads/chats
//!
//! # See what would be written, including the chosen code file names
//! chat-page-export capture.json --dry-run
//! ```
//!
//! Preferences can be persisted in `~/.config/chat-page-export/config.toml`.

pub mod archive;
pub mod artifact;
pub mod checksum;
pub mod config;
pub mod delivery;
pub mod error;
pub mod export;
pub mod namer;
pub mod renderer;
pub mod sanitize;
pub mod source;

pub use archive::Payload;
pub use error::{Error, Result};
pub use export::{ExportPlan, ExportReport};
pub use source::{CodeBlock, CodeBlockSource, ConversationSource, DocumentSource, PageCapture};
