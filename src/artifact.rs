//! Names of the files one export run produces.
//!
//! Every artifact of a run shares `<app>__<project>__<conversation>_<stamp>`, so
//! the text archive, code archive and page snapshot sort next to each other.

use crate::sanitize::sanitize;
use chrono::{DateTime, TimeZone};
use std::fmt;

pub const DEFAULT_APP: &str = "chatgpt";
pub const DEFAULT_PROJECT: &str = "project";
pub const DEFAULT_CONVERSATION: &str = "conversation";

const TITLE_SEPARATOR: &str = " - ";

/// What an artifact is, which also decides its suffix and MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    TextArchive,
    CodeArchive,
    Snapshot,
}

impl ArtifactKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::TextArchive | Self::CodeArchive => "application/zip",
            Self::Snapshot => "text/html;charset=utf-8",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Self::TextArchive => "_text.zip",
            Self::CodeArchive => "_code.zip",
            Self::Snapshot => "_full.html",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::TextArchive => "text archive",
            Self::CodeArchive => "code archive",
            Self::Snapshot => "page snapshot",
        };
        f.write_str(label)
    }
}

/// A finished file, ready to hand to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub name: String,
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }
}

/// Split a display title into `(project, conversation)` on the first `" - "`.
///
/// Without a separator the whole title is the conversation and the project is
/// a placeholder; an empty title yields both placeholders.
pub fn split_title(title: &str) -> (String, String) {
    match title.split_once(TITLE_SEPARATOR) {
        Some((project, rest)) => (project.trim().to_string(), rest.trim().to_string()),
        None => {
            let key = title.trim();
            let key = if key.is_empty() { DEFAULT_CONVERSATION } else { key };
            (DEFAULT_PROJECT.to_string(), key.to_string())
        }
    }
}

/// `YYYYMMDD_HHMMSS` in the timestamp's own zone.
pub fn format_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Identifier shared by all artifacts of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunId {
    pub app: String,
    pub project: String,
    pub conversation_key: String,
    pub stamp: String,
}

impl RunId {
    pub fn new(app: &str, title: &str, stamp: impl Into<String>) -> Self {
        let (project, conversation) = split_title(title);
        Self {
            app: sanitize(app),
            project: sanitize(&project),
            conversation_key: sanitize(&conversation),
            stamp: stamp.into(),
        }
    }

    fn base(&self) -> String {
        format!(
            "{}__{}__{}_{}",
            self.app, self.project, self.conversation_key, self.stamp
        )
    }

    /// Name of a delivered artifact.
    pub fn artifact_name(&self, kind: ArtifactKind) -> String {
        format!("{}{}", self.base(), kind.suffix())
    }

    /// Name of the plain-text entry inside the text archive.
    pub fn text_entry_name(&self) -> String {
        format!("{}.txt", self.base())
    }

    /// Name of the markdown entry inside the text archive.
    pub fn markdown_entry_name(&self) -> String {
        format!("{}.md", self.base())
    }
}
