use crate::source::{Segment, Turn};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use url::Url;

#[derive(Debug, Clone, Serialize)]
pub struct Frontmatter {
    pub title: String,
    pub project: String,
    pub conversation: String,
    pub exported_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Url>,
    pub turns: usize,
}

/// Section heading for a turn role.
pub fn role_title(role: Option<&str>) -> &str {
    match role {
        Some("user") => "User",
        Some("assistant") => "Assistant",
        Some("system") => "System",
        Some("tool") => "Tool",
        Some(other) if !other.is_empty() => other,
        _ => "message",
    }
}

fn fenced(language: Option<&str>, code: &str) -> Option<String> {
    let code = code.replace("\r\n", "\n");
    let code = code.trim_end_matches('\n');
    if code.is_empty() {
        return None;
    }
    Some(format!("```{}\n{}\n```", language.unwrap_or_default(), code))
}

fn render_turn(turn: &Turn) -> String {
    let pieces: Vec<String> = turn
        .segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Text { text } => Some(text.replace("\r\n", "\n")),
            Segment::Code { language, code } => fenced(language.as_deref(), code),
        })
        .collect();
    let body = pieces.join("\n");

    format!("## {}\n{}", role_title(turn.role.as_deref()), body.trim())
        .trim()
        .to_string()
}

pub fn write_conversation_markdown<W: Write>(
    writer: &mut W,
    turns: &[Turn],
    plain_text: &str,
    frontmatter: Option<&Frontmatter>,
) -> std::io::Result<()> {
    if let Some(fm) = frontmatter {
        writeln!(writer, "---")?;
        // serde_yaml 0.9 emits no leading "---" for a single document
        let yaml = serde_yaml::to_string(fm).map_err(std::io::Error::other)?;
        write!(writer, "{}", yaml)?;
        writeln!(writer, "---")?;
        writeln!(writer)?;
    }

    if turns.is_empty() {
        let body = plain_text.replace("\r\n", "\n");
        writeln!(writer, "# Conversation")?;
        writeln!(writer)?;
        writeln!(writer, "{}", body.trim())?;
        return Ok(());
    }

    let mut parts = vec!["# Conversation".to_string()];
    parts.extend(turns.iter().map(render_turn));
    writeln!(writer, "{}", parts.join("\n\n").trim())?;

    Ok(())
}

/// Text stand-in for a page's `innerText` when the capture has none.
pub fn render_plain_text(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| {
            let mut lines = vec![role_title(turn.role.as_deref()).to_string()];
            for segment in &turn.segments {
                match segment {
                    Segment::Text { text } => lines.push(text.clone()),
                    Segment::Code { code, .. } => lines.push(code.clone()),
                }
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
