//! Turns a captured page into the artifacts of one export run and delivers them.
//!
//! A run is split in two:
//!
//! - [`plan`] names every code block, renders the conversation and builds all
//!   archives in memory. Nothing leaves the process, so an oversized archive
//!   aborts the run before anything is delivered.
//! - [`deliver`] hands the artifacts over in a fixed order: text archive, code
//!   archive (only when the page has code blocks), page snapshot.

use crate::archive::{self, Payload};
use crate::artifact::{Artifact, ArtifactKind, RunId, format_stamp, split_title};
use crate::config::ExportOptions;
use crate::delivery::Delivery;
use crate::error::{Error, Result};
use crate::namer::{BlockName, BlockNamer, ExtensionWhitelist};
use crate::renderer::{self, Frontmatter};
use crate::source::{CodeBlockSource, ConversationSource, DocumentSource};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// Everything one run will deliver, already built.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub run_id: RunId,
    /// In delivery order.
    pub artifacts: Vec<Artifact>,
    pub code_files: Vec<BlockName>,
}

/// What a finished run did.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub delivered: Vec<String>,
    pub code_blocks: usize,
    pub code_files: Vec<BlockName>,
    pub code_archive_skipped: bool,
}

/// Name every code block in discovery order and pair it with its content.
pub fn code_payloads<S: CodeBlockSource + ?Sized>(
    source: &S,
    conversation_key: &str,
    whitelist: &ExtensionWhitelist,
) -> (Vec<Payload>, Vec<BlockName>) {
    let mut namer = BlockNamer::new(conversation_key, whitelist);
    source
        .code_blocks()
        .into_iter()
        .map(|block| {
            let name = namer.next_name(&block.context_lines);
            (
                Payload::new(name.file_name.clone(), block.text.into_bytes()),
                name,
            )
        })
        .unzip()
}

fn text_payloads<S>(
    source: &S,
    run_id: &RunId,
    options: &ExportOptions,
    at: &DateTime<FixedOffset>,
) -> Result<Vec<Payload>>
where
    S: ConversationSource + DocumentSource + ?Sized,
{
    let plain_text = source.plain_text();
    let frontmatter = options.frontmatter.then(|| {
        let (project, conversation) = split_title(source.title());
        Frontmatter {
            title: source.title().to_string(),
            project,
            conversation,
            exported_at: at.with_timezone(&Utc),
            source: source.source_url().cloned(),
            turns: source.turns().len(),
        }
    });

    let mut markdown = Vec::new();
    renderer::write_conversation_markdown(
        &mut markdown,
        source.turns(),
        &plain_text,
        frontmatter.as_ref(),
    )
    .map_err(Error::Render)?;

    Ok(vec![
        Payload::new(run_id.text_entry_name(), plain_text.into_bytes()),
        Payload::new(run_id.markdown_entry_name(), markdown),
    ])
}

/// Build every artifact of a run without delivering anything.
pub fn plan<S>(
    source: &S,
    options: &ExportOptions,
    at: DateTime<FixedOffset>,
) -> Result<ExportPlan>
where
    S: CodeBlockSource + ConversationSource + DocumentSource + ?Sized,
{
    let run_id = RunId::new(&options.app, source.title(), format_stamp(&at));
    debug!(?run_id, "planning export");

    let text_archive = archive::build(&text_payloads(source, &run_id, options, &at)?)?;
    let mut artifacts = vec![Artifact {
        kind: ArtifactKind::TextArchive,
        name: run_id.artifact_name(ArtifactKind::TextArchive),
        data: text_archive,
    }];

    let (code, code_files) =
        code_payloads(source, &run_id.conversation_key, &options.extensions);
    if code.is_empty() {
        info!("no code blocks found, skipping code archive");
    } else {
        artifacts.push(Artifact {
            kind: ArtifactKind::CodeArchive,
            name: run_id.artifact_name(ArtifactKind::CodeArchive),
            data: archive::build(&code)?,
        });
    }

    artifacts.push(Artifact {
        kind: ArtifactKind::Snapshot,
        name: run_id.artifact_name(ArtifactKind::Snapshot),
        data: source.full_html().as_bytes().to_vec(),
    });

    Ok(ExportPlan {
        run_id,
        artifacts,
        code_files,
    })
}

/// Deliver a plan's artifacts one after another.
///
/// Stops at the first failure; artifacts delivered before it are listed in the
/// error and stay where they are.
pub fn deliver<D>(plan: ExportPlan, delivery: &mut D) -> Result<ExportReport>
where
    D: Delivery + ?Sized,
{
    let mut delivered = Vec::with_capacity(plan.artifacts.len());
    for artifact in &plan.artifacts {
        if let Err(source) = delivery.deliver(artifact) {
            return Err(Error::Delivery {
                artifact: artifact.name.clone(),
                delivered,
                source,
            });
        }
        delivered.push(artifact.name.clone());
    }

    let code_archive_skipped = !plan
        .artifacts
        .iter()
        .any(|a| a.kind == ArtifactKind::CodeArchive);

    Ok(ExportReport {
        delivered,
        code_blocks: plan.code_files.len(),
        code_files: plan.code_files,
        code_archive_skipped,
    })
}

/// Plan and deliver in one go.
pub fn run<S, D>(
    source: &S,
    delivery: &mut D,
    options: &ExportOptions,
    at: DateTime<FixedOffset>,
) -> Result<ExportReport>
where
    S: CodeBlockSource + ConversationSource + DocumentSource + ?Sized,
    D: Delivery + ?Sized,
{
    deliver(plan(source, options, at)?, delivery)
}
