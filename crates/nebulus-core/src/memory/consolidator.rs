//! Memory consolidator ("sleep cycle").
//!
//! Fetches unarchived episodic memories, asks the LLM provider to extract
//! structured facts, merges them into the knowledge graph, and archives the
//! processed items. A cycle never fails: per-item and per-fact problems are
//! logged and skipped, and the caller always gets a count summary back.
//!
//! Fetch-then-archive spans two independently consistent stores with no
//! cross-store transaction. Two cycles running concurrently can process the
//! same batch twice; callers that need exclusivity must serialize cycle
//! invocations externally.

use nebulus_types::config::MemoryConfig;
use nebulus_types::llm::{LlmError, Message};
use nebulus_types::memory::{ArchivePolicy, ConsolidationReport};

use crate::llm::provider::LlmProvider;
use crate::memory::episodic::EpisodicStore;
use crate::memory::extractor::{self, FactSet, ParseOutcome};
use crate::memory::graph::KnowledgeGraph;
use crate::memory::similarity::SimilarityStore;

/// Orchestrates one extract-merge-archive cycle.
///
/// Generic over the store, graph, and provider ports so tests can inject
/// fakes -- nebulus-core never depends on nebulus-infra.
pub struct Consolidator<S: SimilarityStore, G: KnowledgeGraph, L: LlmProvider> {
    episodic: EpisodicStore<S>,
    graph: G,
    provider: L,
    model: String,
    batch_size: usize,
    archive_policy: ArchivePolicy,
}

impl<S: SimilarityStore, G: KnowledgeGraph, L: LlmProvider> Consolidator<S, G, L> {
    /// Wire up a consolidator from its collaborators and configuration.
    ///
    /// `batch_size` is clamped to at least 1.
    pub fn new(episodic: EpisodicStore<S>, graph: G, provider: L, config: &MemoryConfig) -> Self {
        Self {
            episodic,
            graph,
            provider,
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
            archive_policy: config.archive_policy,
        }
    }

    /// Run one consolidation cycle.
    ///
    /// Items are processed strictly sequentially; each extraction call
    /// completes before the next item starts. Never returns an error --
    /// every failure class degrades per item or per fact and shows up in
    /// the report counters and the logs.
    pub async fn consolidate(&self) -> ConsolidationReport {
        tracing::info!("Starting memory consolidation cycle");

        let memories = self.episodic.get_unarchived(self.batch_size).await;
        if memories.is_empty() {
            tracing::info!("No new memories to consolidate");
            return ConsolidationReport::default();
        }

        tracing::info!(count = memories.len(), "Processing memory items");

        let mut report = ConsolidationReport::default();
        let mut processed_ids: Vec<String> = Vec::new();

        for memory in &memories {
            match self.extract_facts(&memory.content).await {
                Ok(outcome) => {
                    let facts = match outcome {
                        ParseOutcome::Facts(facts) => facts,
                        ParseOutcome::Malformed(reason) => {
                            tracing::warn!(
                                item_id = %memory.id,
                                reason,
                                "Malformed extraction response; using empty fact set"
                            );
                            report.malformed_responses += 1;
                            FactSet::default()
                        }
                    };

                    let (entities, relations) = self.merge_facts(facts).await;
                    report.entities_added += entities;
                    report.relations_added += relations;
                    // Zero facts still counts as consolidated.
                    processed_ids.push(memory.id.clone());
                }
                Err(e) => {
                    tracing::error!(item_id = %memory.id, error = %e, "Extraction call failed");
                    report.failed_items += 1;
                    if self.archive_policy == ArchivePolicy::Always {
                        processed_ids.push(memory.id.clone());
                    }
                }
            }
        }

        report.processed = processed_ids.len();
        if !processed_ids.is_empty() {
            self.episodic.mark_archived(&processed_ids).await;
            tracing::info!(count = processed_ids.len(), "Archived memory items");
        }

        report
    }

    /// One chat call: a single user-role message with the extraction
    /// instruction and the item's content.
    async fn extract_facts(&self, content: &str) -> Result<ParseOutcome, LlmError> {
        let messages = [Message::user(extractor::extraction_prompt(content))];
        let response = self.provider.chat(&messages, &self.model).await?;
        Ok(extractor::parse_extraction(&response))
    }

    /// Apply one fact set to the graph, skipping invalid records.
    ///
    /// Returns `(entities_added, relations_added)`. A record missing
    /// required fields, or a graph write that fails, skips that single
    /// fact -- sibling facts from the same response are still applied.
    async fn merge_facts(&self, facts: FactSet) -> (usize, usize) {
        let mut entity_count = 0;
        let mut relation_count = 0;

        for raw in facts.entities {
            let Some(entity) = raw.clone().into_entity() else {
                tracing::warn!(record = ?raw, "Skipping entity record missing an id");
                continue;
            };
            match self.graph.add_entity(&entity).await {
                Ok(()) => entity_count += 1,
                Err(e) => {
                    tracing::warn!(entity_id = %entity.id, error = %e, "Skipping entity; graph write failed");
                }
            }
        }

        for raw in facts.relations {
            let Some(relation) = raw.clone().into_relation() else {
                tracing::warn!(record = ?raw, "Skipping relation record missing required fields");
                continue;
            };
            match self.graph.add_relation(&relation).await {
                Ok(()) => relation_count += 1,
                Err(e) => {
                    tracing::warn!(
                        source = %relation.source,
                        target = %relation.target,
                        error = %e,
                        "Skipping relation; graph write failed"
                    );
                }
            }
        }

        (entity_count, relation_count)
    }
}
