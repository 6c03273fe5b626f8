//! The content processing orchestrator.
//!
//! Concurrency model: `try_claim` is the only synchronization point. The
//! claim winner runs every stage and always writes the outcome back; a
//! claim loser waits for the winner to finish and returns the item's
//! current row. Stage failures degrade to recorded diagnostics, never to
//! an aborted run.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use cairn_core::{
    defaults, ContentItem, ContentRepository, Error, ProcessingOutcome, ProcessingState, Result,
};
use cairn_extract::ExtractionDispatcher;
use cairn_inference::{EmbeddingChain, Summarizer};

/// Orchestrates extraction, embedding, and summarization for one item at
/// a time.
pub struct ContentProcessor {
    store: Arc<dyn ContentRepository>,
    dispatcher: ExtractionDispatcher,
    embeddings: EmbeddingChain,
    summarizer: Summarizer,
}

impl ContentProcessor {
    pub fn new(
        store: Arc<dyn ContentRepository>,
        dispatcher: ExtractionDispatcher,
        embeddings: EmbeddingChain,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            store,
            dispatcher,
            embeddings,
            summarizer,
        }
    }

    /// Process an item end to end.
    ///
    /// Returns the item's row after processing: the fresh outcome when
    /// this call won the claim, the winner's outcome when it lost, and
    /// the unchanged row when the item was already fully processed.
    pub async fn process(&self, id: Uuid) -> Result<ContentItem> {
        let item = self
            .store
            .fetch(id)
            .await?
            .ok_or(Error::FileNotFound(id))?;

        // Fully processed items are not re-done implicitly; reprocess is
        // the explicit path.
        if item.processing_state == ProcessingState::Processed
            && item.extracted_text.is_some()
            && item.embedding.is_some()
        {
            debug!(
                subsystem = "pipeline",
                file_id = %id,
                "Item already processed, skipping"
            );
            return Ok(item);
        }

        match self.store.try_claim(id).await? {
            Some(claimed) => {
                let start = Instant::now();
                let outcome = self.run_stages(&claimed).await;
                let updated = self.store.complete_processing(id, outcome).await?;
                info!(
                    subsystem = "pipeline",
                    file_id = %id,
                    category = %updated.category,
                    has_text = updated.extracted_text.is_some(),
                    has_embedding = updated.embedding.is_some(),
                    degraded = updated.text_extraction_error.is_some()
                        || updated.embedding_error.is_some(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Processing complete"
                );
                Ok(updated)
            }
            None => self.wait_for_winner(id).await,
        }
    }

    /// Reset an item's derived state and process it again.
    pub async fn reprocess(&self, id: Uuid) -> Result<ContentItem> {
        info!(subsystem = "pipeline", file_id = %id, "Reprocessing item");
        self.store.reset_processing(id).await?;
        self.process(id).await
    }

    /// Poll until the claim winner leaves `Processing`, bounded so a
    /// crashed winner cannot hang the caller forever.
    async fn wait_for_winner(&self, id: Uuid) -> Result<ContentItem> {
        debug!(
            subsystem = "pipeline",
            file_id = %id,
            "Claim lost, waiting for concurrent processor"
        );

        for _ in 0..defaults::CLAIM_WAIT_MAX_POLLS {
            let current = self
                .store
                .fetch(id)
                .await?
                .ok_or(Error::FileNotFound(id))?;
            if current.processing_state != ProcessingState::Processing {
                return Ok(current);
            }
            sleep(Duration::from_millis(defaults::CLAIM_WAIT_POLL_MS)).await;
        }

        warn!(
            subsystem = "pipeline",
            file_id = %id,
            "Concurrent processor did not finish in time, returning current row"
        );
        self.store
            .fetch(id)
            .await?
            .ok_or(Error::FileNotFound(id))
    }

    /// Run every stage, converting stage failures into diagnostics.
    async fn run_stages(&self, item: &ContentItem) -> ProcessingOutcome {
        let mut outcome = ProcessingOutcome::default();

        match self.dispatcher.extract(item).await {
            Ok(extraction) => {
                outcome.extracted_text = extraction.text;
                outcome.image_analysis = extraction.image;
                outcome.audio_transcript = extraction.audio_transcript;
                outcome.video_analysis = extraction.video;
            }
            Err(e) => {
                warn!(
                    subsystem = "pipeline",
                    file_id = %item.id,
                    error = %e,
                    "Extraction failed"
                );
                outcome.text_extraction_error = Some(e.to_string());
            }
        }

        let search_text = build_search_text(item, &outcome);
        if search_text.trim().is_empty() {
            debug!(
                subsystem = "pipeline",
                file_id = %item.id,
                "No searchable text, skipping embedding"
            );
            outcome.embedding_error = Some("No searchable text to embed".to_string());
        } else {
            match self.embeddings.embed(&search_text).await {
                Ok(vector) => outcome.embedding = Some(vector),
                Err(e) => {
                    warn!(
                        subsystem = "pipeline",
                        file_id = %item.id,
                        error = %e,
                        "Embedding failed"
                    );
                    outcome.embedding_error = Some(e.to_string());
                }
            }
        }

        let summary_source = outcome
            .extracted_text
            .clone()
            .or_else(|| outcome_media_text(&outcome));
        if let Some(source) = summary_source.filter(|s| !s.trim().is_empty()) {
            outcome.summary = Some(self.summarizer.summarize(&source).await);
        }

        outcome
    }
}

/// Everything embeddable about an item: identity text plus whatever this
/// run extracted.
fn build_search_text(item: &ContentItem, outcome: &ProcessingOutcome) -> String {
    let mut parts = vec![item.name.clone()];
    if let Some(description) = &item.description {
        parts.push(description.clone());
    }
    parts.push(item.tags.join(" "));
    if let Some(text) = &outcome.extracted_text {
        parts.push(text.clone());
    }
    if let Some(media) = outcome_media_text(outcome) {
        parts.push(media);
    }
    parts.retain(|p| !p.trim().is_empty());
    parts.join(" ")
}

fn outcome_media_text(outcome: &ProcessingOutcome) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(analysis) = &outcome.image_analysis {
        parts.push(analysis.search_text());
    }
    if let Some(transcript) = &outcome.audio_transcript {
        parts.push(transcript.clone());
    }
    if let Some(video) = &outcome.video_analysis {
        if let Some(t) = &video.transcript {
            parts.push(t.clone());
        }
        if let Some(d) = &video.description {
            parts.push(d.clone());
        }
        parts.extend(video.scenes.iter().cloned());
    }
    parts.retain(|p| !p.trim().is_empty());
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Fire-and-forget processing. Upload-side callers use this so a slow
/// provider never blocks the upload response.
pub fn spawn_process(
    processor: Arc<ContentProcessor>,
    id: Uuid,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = processor.process(id).await {
            error!(
                subsystem = "pipeline",
                file_id = %id,
                error = %e,
                "Background processing failed"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::{ImageAnalysis, VideoAnalysis};

    fn base_item() -> ContentItem {
        ContentItem::new(
            Uuid::new_v4(),
            "invoice.pdf",
            "/data/invoice.pdf",
            "application/pdf",
            cairn_core::FileCategory::Document,
        )
    }

    #[test]
    fn search_text_includes_identity_and_extraction() {
        let mut item = base_item();
        item.description = Some("Q3 supplier invoice".to_string());
        item.tags = vec!["finance".to_string()];

        let outcome = ProcessingOutcome {
            extracted_text: Some("Total due 42 EUR".to_string()),
            ..Default::default()
        };

        let text = build_search_text(&item, &outcome);
        assert!(text.contains("invoice.pdf"));
        assert!(text.contains("Q3 supplier invoice"));
        assert!(text.contains("finance"));
        assert!(text.contains("Total due 42 EUR"));
    }

    #[test]
    fn search_text_includes_media_signals() {
        let item = base_item();
        let outcome = ProcessingOutcome {
            image_analysis: Some(ImageAnalysis {
                description: "a mountain lake".to_string(),
                ..Default::default()
            }),
            audio_transcript: Some("team standup recording".to_string()),
            video_analysis: Some(VideoAnalysis {
                transcript: Some("product demo walkthrough".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let text = build_search_text(&item, &outcome);
        assert!(text.contains("a mountain lake"));
        assert!(text.contains("team standup recording"));
        assert!(text.contains("product demo walkthrough"));
    }

    #[test]
    fn empty_outcome_search_text_is_identity_only() {
        let item = base_item();
        let text = build_search_text(&item, &ProcessingOutcome::default());
        assert_eq!(text, "invoice.pdf");
    }
}
