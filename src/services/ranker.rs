use std::cmp::Ordering;
use std::sync::Arc;

use crate::domain::dataset::DatasetFormat;
use crate::domain::ranking::{cosine_similarity, embedding_text, score_candidate, RankingSignals};
use crate::services::catalog::CatalogDataset;
use crate::services::embedder::Embedder;

pub struct SemanticRanker {
    embedder: Arc<dyn Embedder>,
    authority_orgs: Vec<String>,
}

impl SemanticRanker {
    pub fn new(embedder: Arc<dyn Embedder>, authority_orgs: Vec<String>) -> Self {
        SemanticRanker {
            embedder,
            authority_orgs,
        }
    }

    // Returns (pool index, score) pairs, best first.
    pub async fn rank(&self, query: &str, pool: &[CatalogDataset]) -> Vec<(usize, f64)> {
        if pool.is_empty() {
            return vec![];
        }

        // One batched call: the query first, then one text per candidate.
        let mut texts = Vec::with_capacity(pool.len() + 1);
        texts.push(query.to_string());
        for dataset in pool {
            texts.push(embedding_text(&dataset.title, dataset.description()));
        }

        let similarities: Vec<f32> = match self.embedder.embed(&texts).await {
            Ok(vectors) if vectors.len() == pool.len() + 1 => {
                let query_vector = &vectors[0];
                vectors[1..]
                    .iter()
                    .map(|v| cosine_similarity(query_vector, v))
                    .collect()
            }
            Ok(vectors) => {
                log::error!(
                    "Embedder returned {} vectors for {} inputs, ranking without similarity",
                    vectors.len(),
                    texts.len()
                );
                vec![0.0; pool.len()]
            }
            Err(e) => {
                log::error!("Embedding failed, ranking without similarity: {:?}", e);
                vec![0.0; pool.len()]
            }
        };

        let mut scored: Vec<(usize, f64)> = pool
            .iter()
            .enumerate()
            .map(|(i, dataset)| {
                let signals = ranking_signals(dataset);
                let score = score_candidate(similarities[i], &signals, &self.authority_orgs);
                (i, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored
    }
}

pub fn ranking_signals(dataset: &CatalogDataset) -> RankingSignals {
    let tabular_resources = dataset
        .resources
        .iter()
        .filter(|r| DatasetFormat::from_resource(r.format.as_deref(), &r.url).is_tabular())
        .count();

    RankingSignals {
        tabular_resources,
        followers: dataset.metrics.followers,
        description_chars: dataset.description().chars().count(),
        organization: dataset.organization_name().to_string(),
    }
}
