//! Input side of an export: what the page glue hands over.
//!
//! The browser-side glue decides which elements are code blocks and which are
//! conversation turns, then serializes the page as a [`PageCapture`]. The export
//! only talks to the three source traits, so other hosts can plug in directly.

use crate::error::{Error, Result};
use crate::renderer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

/// Trailing prose lines of the enclosing turn that count as block context.
pub const CONTEXT_PROSE_LINES: usize = 5;
/// Leading lines of the block itself that count as block context.
pub const CONTEXT_CODE_LINES: usize = 30;

/// One code block together with the text it was found next to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Raw block content, LF line endings.
    pub text: String,
    /// Nearby prose followed by the block's own leading lines.
    pub context_lines: Vec<String>,
}

/// Code blocks in stable discovery order.
pub trait CodeBlockSource {
    fn code_blocks(&self) -> Vec<CodeBlock>;
}

/// Conversation turns and the page title.
pub trait ConversationSource {
    fn title(&self) -> &str;
    fn turns(&self) -> &[Turn];
}

/// Whole-document representations.
pub trait DocumentSource {
    fn plain_text(&self) -> String;
    fn full_html(&self) -> &str;

    /// Address the document was captured from, when known.
    fn source_url(&self) -> Option<&Url> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    Text {
        text: String,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        code: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Turn {
    /// Prose lines of the turn with code blocks left out, trimmed, blanks dropped.
    pub fn prose_lines(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Text { text } => Some(text),
                Segment::Code { .. } => None,
            })
            .flat_map(|text| text.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Serialized snapshot of a chat page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCapture {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    /// `innerText` of the page body, if the glue recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
    pub html: String,
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl PageCapture {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::capture_read(path, e))?;
        Self::from_json(&bytes)
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

fn block_context(prose: &[String], code: &str) -> Vec<String> {
    let above = &prose[prose.len().saturating_sub(CONTEXT_PROSE_LINES)..];
    above
        .iter()
        .cloned()
        .chain(
            code.split('\n')
                .take(CONTEXT_CODE_LINES)
                .map(|line| line.trim().to_string()),
        )
        .collect()
}

impl CodeBlockSource for PageCapture {
    fn code_blocks(&self) -> Vec<CodeBlock> {
        let mut blocks = Vec::new();
        for turn in &self.turns {
            let prose = turn.prose_lines();
            for segment in &turn.segments {
                if let Segment::Code { code, .. } = segment {
                    let text = normalize_newlines(code);
                    blocks.push(CodeBlock {
                        context_lines: block_context(&prose, &text),
                        text,
                    });
                }
            }
        }
        blocks
    }
}

impl ConversationSource for PageCapture {
    fn title(&self) -> &str {
        &self.title
    }

    fn turns(&self) -> &[Turn] {
        &self.turns
    }
}

impl DocumentSource for PageCapture {
    fn plain_text(&self) -> String {
        match &self.body_text {
            Some(text) => text.clone(),
            None => renderer::render_plain_text(&self.turns),
        }
    }

    fn full_html(&self) -> &str {
        &self.html
    }

    fn source_url(&self) -> Option<&Url> {
        self.url.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(t: &str) -> Segment {
        Segment::Text { text: t.into() }
    }

    fn code(c: &str) -> Segment {
        Segment::Code {
            language: None,
            code: c.into(),
        }
    }

    fn capture(turns: Vec<Turn>) -> PageCapture {
        PageCapture {
            title: "t".into(),
            url: None,
            body_text: None,
            html: "<html></html>".into(),
            turns,
        }
    }

    #[test]
    fn parses_minimal_capture() {
        let json = br#"{"html": "<html></html>"}"#;
        let page = PageCapture::from_json(json).unwrap();
        assert_eq!(page.title, "");
        assert!(page.turns.is_empty());
        assert!(page.code_blocks().is_empty());
    }

    #[test]
    fn parses_tagged_segments() {
        let json = br#"{
            "title": "P - C",
            "url": "https://chat.example.com/c/1",
            "html": "<html></html>",
            "turns": [{"role": "assistant", "segments": [
                {"type": "text", "text": "Here:"},
                {"type": "code", "language": "python", "code": "print(1)"}
            ]}]
        }"#;
        let page = PageCapture::from_json(json).unwrap();
        assert_eq!(page.turns[0].role.as_deref(), Some("assistant"));
        assert_eq!(
            page.turns[0].segments[1],
            Segment::Code {
                language: Some("python".into()),
                code: "print(1)".into(),
            }
        );
        assert_eq!(page.url.unwrap().host_str(), Some("chat.example.com"));
    }

    #[test]
    fn rejects_capture_without_html() {
        assert!(matches!(
            PageCapture::from_json(br#"{"title": "x"}"#),
            Err(Error::CaptureParse(_))
        ));
    }

    #[test]
    fn context_is_last_prose_lines_then_code_head() {
        let prose = "one\n\n two \nthree\nfour\nfive\nsix";
        let page = capture(vec![Turn {
            role: Some("assistant".into()),
            segments: vec![text(prose), code("# app.py\r\n  x = 1\r\n")],
        }]);
        let blocks = page.code_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "# app.py\n  x = 1\n");
        assert_eq!(
            blocks[0].context_lines,
            vec!["two", "three", "four", "five", "six", "# app.py", "x = 1", ""]
        );
    }

    #[test]
    fn prose_after_a_block_still_counts() {
        let page = capture(vec![Turn {
            role: None,
            segments: vec![code("a"), text("checkpoint: late.py")],
        }]);
        let blocks = page.code_blocks();
        assert_eq!(blocks[0].context_lines, vec!["checkpoint: late.py", "a"]);
    }

    #[test]
    fn code_head_is_limited() {
        let body: Vec<String> = (0..50).map(|i| format!("line {i}")).collect();
        let page = capture(vec![Turn {
            role: None,
            segments: vec![code(&body.join("\n"))],
        }]);
        let ctx = &page.code_blocks()[0].context_lines;
        assert_eq!(ctx.len(), CONTEXT_CODE_LINES);
        assert_eq!(ctx.last().unwrap(), "line 29");
    }

    #[test]
    fn blocks_follow_discovery_order_across_turns() {
        let page = capture(vec![
            Turn {
                role: Some("user".into()),
                segments: vec![code("first")],
            },
            Turn {
                role: Some("assistant".into()),
                segments: vec![code("second"), code("third")],
            },
        ]);
        let texts: Vec<String> = page.code_blocks().into_iter().map(|b| b.text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn plain_text_prefers_body_text() {
        let mut page = capture(vec![]);
        page.body_text = Some("whole page".into());
        assert_eq!(page.plain_text(), "whole page");
    }
}
