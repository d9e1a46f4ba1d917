use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::dataset::DatasetCandidate;
use crate::domain::table::ParsedTable;
use crate::services::llm_gateway::{extract, CandidateSummary, Extraction, LlmGateway};

const DIGEST_SAMPLE_VALUES: usize = 3;

#[derive(Debug, Deserialize)]
struct IntentVerdict {
    is_market_analysis: bool,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct CandidateVerdict {
    relevant_positions: Vec<usize>,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct ContentVerdict {
    relevant: bool,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Clone)]
pub struct IntentDecision {
    pub is_market_analysis: bool,
    pub explanation: String,
}

#[derive(Debug, Clone)]
pub struct ContentDecision {
    pub relevant: bool,
    pub explanation: String,
}

// Every gate fails open: a broken classifier degrades to "let it through",
// never to an empty answer.
pub struct RelevanceGate {
    llm: Arc<dyn LlmGateway>,
}

impl RelevanceGate {
    pub fn new(llm: Arc<dyn LlmGateway>) -> Self {
        RelevanceGate { llm }
    }

    pub async fn classify_intent(&self, message: &str) -> IntentDecision {
        match self.llm.intent_judgement(message).await {
            Ok(raw) => match extract::<IntentVerdict>(&raw) {
                Extraction::Parsed(verdict) => IntentDecision {
                    is_market_analysis: verdict.is_market_analysis,
                    explanation: verdict.explanation,
                },
                Extraction::Fallback { reason } => {
                    log::error!("Intent verdict unusable, letting the message through: {}", reason);
                    IntentDecision {
                        is_market_analysis: true,
                        explanation: String::new(),
                    }
                }
            },
            Err(e) => {
                log::error!("Intent judgement failed, letting the message through: {:?}", e);
                IntentDecision {
                    is_market_analysis: true,
                    explanation: String::new(),
                }
            }
        }
    }

    pub async fn validate_candidates(
        &self,
        query: &str,
        candidates: Vec<DatasetCandidate>,
    ) -> (Vec<DatasetCandidate>, String) {
        if candidates.is_empty() {
            return (candidates, String::new());
        }

        let summaries: Vec<CandidateSummary> = candidates
            .iter()
            .map(|c| CandidateSummary {
                title: c.title.clone(),
                url: c.url.clone(),
            })
            .collect();

        match self.llm.candidate_judgement(query, &summaries).await {
            Ok(raw) => match extract::<CandidateVerdict>(&raw) {
                Extraction::Parsed(verdict) => {
                    let kept = keep_positions(candidates, &verdict.relevant_positions);
                    (kept, verdict.explanation)
                }
                Extraction::Fallback { reason } => {
                    log::error!("Candidate verdict unusable, keeping all: {}", reason);
                    (candidates, String::new())
                }
            },
            Err(e) => {
                log::error!("Candidate judgement failed, keeping all: {:?}", e);
                (candidates, String::new())
            }
        }
    }

    pub async fn validate_content(&self, query: &str, table: &ParsedTable) -> ContentDecision {
        let digest = table_digest(table);

        match self.llm.content_judgement(query, &digest).await {
            Ok(raw) => match extract::<ContentVerdict>(&raw) {
                Extraction::Parsed(verdict) => ContentDecision {
                    relevant: verdict.relevant,
                    explanation: verdict.explanation,
                },
                Extraction::Fallback { reason } => {
                    log::error!("Content verdict unusable, accepting the table: {}", reason);
                    ContentDecision {
                        relevant: true,
                        explanation: String::new(),
                    }
                }
            },
            Err(e) => {
                log::error!("Content judgement failed, accepting the table: {:?}", e);
                ContentDecision {
                    relevant: true,
                    explanation: String::new(),
                }
            }
        }
    }
}

// Positions are 1-indexed. Out-of-range and duplicate entries are ignored
// and the original order is preserved.
fn keep_positions(
    candidates: Vec<DatasetCandidate>,
    positions: &[usize],
) -> Vec<DatasetCandidate> {
    let wanted: HashSet<usize> = positions.iter().copied().collect();

    candidates
        .into_iter()
        .enumerate()
        .filter(|(i, _)| wanted.contains(&(i + 1)))
        .map(|(_, candidate)| candidate)
        .collect()
}

// Column names plus a few non-null samples per column, compact enough for a
// prompt.
pub fn table_digest(table: &ParsedTable) -> String {
    let mut digest = format!("Colonnes : {}\n", table.columns.join(", "));

    for column in &table.columns {
        let samples: Vec<String> = table
            .rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|v| !v.is_null())
            .take(DIGEST_SAMPLE_VALUES)
            .map(compact_value)
            .collect();
        if !samples.is_empty() {
            digest.push_str(&format!("Exemples {} : {}\n", column, samples.join(", ")));
        }
    }

    digest
}

fn compact_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
