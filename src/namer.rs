//! Picks a filename for each extracted code block from the text around it.
//!
//! Hints are tried in priority order, first match wins:
//!
//! 1. a `checkpoint: <name>` marker anywhere in the context,
//! 2. a comment line holding a single token with an extension (`# app.py`, `// main.rs`),
//! 3. a generic `@auto__<conversation>__block_generic_<NNN>` name, suffixed with
//!    whatever extension the context mentions.
//!
//! Names are unique within one [`UsedNameSet`], which lives for a single export run.

use crate::sanitize::{basename_like, extract_ext_from_token, sanitize};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::debug;

/// Per-block filenames are cut to this many characters, after disambiguation.
pub const MAX_NAME_CHARS: usize = 180;

/// Extensions that get a real `.ext` suffix on generic names.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "sh", "rb", "html", "css", "json", "yaml", "yml", "txt", "md", "cpp", "c",
    "h", "go", "rs", "java",
];

static RE_CHECKPOINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)checkpoint\s*:\s*(.+)$").unwrap());

static RE_COMMENT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:#|//|;|--)\s+(\S+)\s*$").unwrap());

/// Where a block's name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HintKind {
    Checkpoint,
    Comment,
    Generic,
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Checkpoint => "checkpoint",
            Self::Comment => "comment",
            Self::Generic => "generic",
        };
        f.pad(label)
    }
}

/// A naming hint found in one context line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCandidate {
    pub kind: HintKind,
    pub value: String,
}

/// Filenames already handed out during one export run.
#[derive(Debug, Default, Clone)]
pub struct UsedNameSet(HashSet<String>);

impl UsedNameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Returns false if the name was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Closed set of extensions treated as "recognized" on generic names.
///
/// Recognized extensions become `.ext`; anything else becomes `_ext` so an
/// unverified guess stays visible in the file listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionWhitelist(BTreeSet<String>);

impl ExtensionWhitelist {
    pub fn contains(&self, ext: &str) -> bool {
        self.0.contains(ext)
    }

    /// Suffix appended to a generic name for `ext`.
    pub fn suffix_for(&self, ext: &str) -> String {
        if ext.is_empty() {
            String::new()
        } else if self.contains(ext) {
            format!(".{ext}")
        } else {
            format!("_{ext}")
        }
    }
}

impl Default for ExtensionWhitelist {
    fn default() -> Self {
        DEFAULT_EXTENSIONS.iter().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ExtensionWhitelist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The name assigned to one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockName {
    pub file_name: String,
    pub kind: HintKind,
}

type Matcher = fn(&[String]) -> Option<NameCandidate>;

const MATCHERS: &[Matcher] = &[checkpoint_hint, comment_hint];

fn checkpoint_hint(lines: &[String]) -> Option<NameCandidate> {
    lines.iter().find_map(|line| {
        let captured = RE_CHECKPOINT.captures(line)?.get(1)?;
        Some(NameCandidate {
            kind: HintKind::Checkpoint,
            value: basename_like(captured.as_str()),
        })
    })
}

fn comment_hint(lines: &[String]) -> Option<NameCandidate> {
    lines.iter().find_map(|line| {
        let token = RE_COMMENT_TOKEN.captures(line)?.get(1)?;
        let value = basename_like(token.as_str());
        if extract_ext_from_token(&value).is_empty() {
            return None;
        }
        Some(NameCandidate {
            kind: HintKind::Comment,
            value,
        })
    })
}

/// Run the hint matchers in priority order over the whole context.
pub fn scan_lines_for_hint(lines: &[String]) -> Option<NameCandidate> {
    MATCHERS.iter().find_map(|matcher| matcher(lines))
}

/// First extension mentioned by any whitespace-separated token in the context.
fn first_mentioned_extension(lines: &[String]) -> String {
    lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .map(basename_like)
        .filter(|token| !token.is_empty())
        .map(|token| extract_ext_from_token(&token))
        .find(|ext| !ext.is_empty())
        .unwrap_or_default()
}

/// Generic name for a block without a usable hint. Embeds the block index,
/// so it is unique per run without consulting the used-name set.
pub fn generic_name(
    conversation_key: &str,
    index: usize,
    lines: &[String],
    whitelist: &ExtensionWhitelist,
) -> String {
    let ext = first_mentioned_extension(lines);
    format!(
        "@auto__{conversation_key}__block_generic_{index:03}{}",
        whitelist.suffix_for(&ext)
    )
}

/// Name the block at 1-based `index` and record the result in `used`.
pub fn name_block(
    index: usize,
    lines: &[String],
    conversation_key: &str,
    whitelist: &ExtensionWhitelist,
    used: &mut UsedNameSet,
) -> BlockName {
    let (name, kind) = match scan_lines_for_hint(lines) {
        Some(candidate) => {
            let mut name = sanitize(&candidate.value);
            if used.contains(&name) {
                let disambiguated = format!("{name}_{index:03}");
                debug!(block = index, %name, %disambiguated, "name already used");
                name = disambiguated;
            }
            (name, candidate.kind)
        }
        None => (
            generic_name(conversation_key, index, lines, whitelist),
            HintKind::Generic,
        ),
    };

    used.insert(name.clone());
    // Cutting after registration can, in principle, collide with another long name.
    let file_name: String = name.chars().take(MAX_NAME_CHARS).collect();
    debug!(block = index, kind = ?kind, %file_name, "named code block");

    BlockName { file_name, kind }
}

/// Names consecutive blocks of one export run.
#[derive(Debug)]
pub struct BlockNamer<'a> {
    conversation_key: &'a str,
    whitelist: &'a ExtensionWhitelist,
    used: UsedNameSet,
    next_index: usize,
}

impl<'a> BlockNamer<'a> {
    pub fn new(conversation_key: &'a str, whitelist: &'a ExtensionWhitelist) -> Self {
        Self {
            conversation_key,
            whitelist,
            used: UsedNameSet::new(),
            next_index: 1,
        }
    }

    /// Name the next block in discovery order.
    pub fn next_name(&mut self, lines: &[String]) -> BlockName {
        let index = self.next_index;
        self.next_index += 1;
        name_block(
            index,
            lines,
            self.conversation_key,
            self.whitelist,
            &mut self.used,
        )
    }

    pub fn used(&self) -> &UsedNameSet {
        &self.used
    }
}
