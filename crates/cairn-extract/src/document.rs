//! Text extraction for documents and source code.

use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, warn};

use cairn_core::models::{extension, CODE_EXTENSIONS};
use cairn_core::{defaults, ContentItem, Error, Result};

use crate::dispatcher::{Extraction, Extractor};

/// Extractor for [`FileCategory::Document`](cairn_core::FileCategory) and
/// `Code` items.
///
/// PDFs go through `pdftotext` (poppler-utils) behind a per-command
/// timeout; CSV/TSV rows are flattened to space-joined lines; recognized
/// text and source extensions are read verbatim. Unknown binary content
/// extracts to nothing, which is not an error.
pub struct DocumentExtractor;

/// Run a command with a timeout, returning stdout as a string.
async fn run_cmd_with_timeout(cmd: &mut Command, timeout_secs: u64) -> Result<String> {
    let output = tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| {
            Error::Extraction(format!("External command timed out after {}s", timeout_secs))
        })?
        .map_err(|e| Error::Extraction(format!("Failed to execute command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Extraction(format!(
            "Command failed (exit {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Extract PDF text via `pdftotext`, which reads from a file path.
async fn extract_pdf(data: &[u8], name: &str) -> Result<String> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::Extraction(format!(
            "File '{}' is not a valid PDF (missing %PDF header)",
            name
        )));
    }

    let mut tmpfile = NamedTempFile::new()
        .map_err(|e| Error::Extraction(format!("Failed to create temp file: {}", e)))?;
    tmpfile
        .write_all(data)
        .map_err(|e| Error::Extraction(format!("Failed to write temp file: {}", e)))?;
    let tmp_path = tmpfile.path().to_string_lossy().to_string();

    run_cmd_with_timeout(
        Command::new("pdftotext").arg(&tmp_path).arg("-"),
        defaults::EXTRACTION_CMD_TIMEOUT_SECS,
    )
    .await
}

/// Flatten delimited rows into space-joined lines.
fn flatten_rows(data: &[u8], delimiter: char) -> String {
    String::from_utf8_lossy(data)
        .lines()
        .map(|line| {
            line.split(delimiter)
                .map(|cell| cell.trim().trim_matches('"'))
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain-text extensions beyond the source-code set.
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "log", "csv", "tsv", "rst", "org", "ini", "cfg"];

fn is_textual(item: &ContentItem) -> bool {
    if item.mime_type.to_lowercase().starts_with("text/") {
        return true;
    }
    match extension(&item.name) {
        Some(ext) => CODE_EXTENSIONS.contains(&ext.as_str()) || TEXT_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

#[async_trait]
impl Extractor for DocumentExtractor {
    async fn extract(&self, item: &ContentItem, data: &[u8]) -> Result<Extraction> {
        if data.is_empty() {
            return Ok(Extraction::default());
        }

        let ext = extension(&item.name);

        // PDF by mime or extension.
        if item.mime_type.eq_ignore_ascii_case("application/pdf") || ext.as_deref() == Some("pdf")
        {
            let text = extract_pdf(data, &item.name).await?;
            return Ok(Extraction {
                text: Some(text),
                ..Default::default()
            });
        }

        // Delimited rows flatten to searchable lines.
        match ext.as_deref() {
            Some("csv") => {
                return Ok(Extraction {
                    text: Some(flatten_rows(data, ',')),
                    ..Default::default()
                })
            }
            Some("tsv") => {
                return Ok(Extraction {
                    text: Some(flatten_rows(data, '\t')),
                    ..Default::default()
                })
            }
            _ => {}
        }

        if is_textual(item) {
            return Ok(Extraction {
                text: Some(String::from_utf8_lossy(data).into_owned()),
                ..Default::default()
            });
        }

        // A recognized non-text signature means there is nothing to read
        // verbatim. Unknown content gets the UTF-8 benefit of the doubt.
        if let Some(kind) = infer::get(data) {
            if kind.matcher_type() != infer::MatcherType::Text {
                debug!(
                    file_id = %item.id,
                    mime = kind.mime_type(),
                    "Binary content, no text to extract"
                );
                return Ok(Extraction::default());
            }
        }

        match std::str::from_utf8(data) {
            Ok(text) => Ok(Extraction {
                text: Some(text.to_string()),
                ..Default::default()
            }),
            Err(_) => {
                warn!(file_id = %item.id, "Undetected non-UTF-8 content, skipping");
                Ok(Extraction::default())
            }
        }
    }

    fn name(&self) -> &str {
        "document"
    }
}
