use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::dataset::{DatasetCandidate, DatasetFormat};
use crate::domain::query::catalog_keywords;
use crate::domain::table::{
    parse, validate_table, ParsedTable, QualityThresholds, TableFormat, PREVIEW_ROWS,
};
use crate::services::catalog::{CatalogClient, CatalogDataset};
use crate::services::ranker::SemanticRanker;

pub struct DiscoveryPipeline {
    catalog: CatalogClient,
    ranker: Arc<SemanticRanker>,
    thresholds: QualityThresholds,
    max_candidates: usize,
}

impl DiscoveryPipeline {
    pub fn new(
        catalog: CatalogClient,
        ranker: Arc<SemanticRanker>,
        thresholds: QualityThresholds,
        max_candidates: usize,
    ) -> Self {
        DiscoveryPipeline {
            catalog,
            ranker,
            thresholds,
            max_candidates,
        }
    }

    pub async fn discover(&self, query: &str) -> Vec<DatasetCandidate> {
        let keywords = catalog_keywords(query);
        log::info!("Searching the catalog for: {}", keywords);

        let pool = self.catalog.search(&keywords).await;
        if pool.is_empty() {
            log::info!("The catalog returned no dataset for: {}", keywords);
            return vec![];
        }

        let ranked = self.ranker.rank(query, &pool).await;

        // Previews are fetched concurrently, one task per candidate.
        let mut handles = Vec::new();
        for (index, score) in ranked.into_iter().take(self.max_candidates) {
            let dataset = pool[index].clone();
            let catalog = self.catalog.clone();
            let thresholds = self.thresholds;
            handles.push(tokio::spawn(async move {
                build_candidate(catalog, thresholds, dataset, score).await
            }));
        }

        let mut candidates = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => log::error!("Preview task panicked: {:?}", e),
            }
        }

        dedup_by_url(candidates)
    }
}

async fn build_candidate(
    catalog: CatalogClient,
    thresholds: QualityThresholds,
    dataset: CatalogDataset,
    score: f64,
) -> DatasetCandidate {
    let (url, format) = select_resource(&dataset);

    let table = match format.table_format() {
        Some(table_format) => fetch_preview(&catalog, &thresholds, &url, table_format).await,
        None => None,
    };

    let (preview, preview_columns, total_rows) = match table {
        Some(table) => (
            Some(table.preview(PREVIEW_ROWS)),
            table.columns.clone(),
            table.total_rows,
        ),
        None => (None, vec![], 0),
    };

    DatasetCandidate {
        title: dataset.title.clone(),
        url,
        format,
        description: dataset.description().to_string(),
        organization: dataset.organization_name().to_string(),
        source: catalog.source_name().to_string(),
        relevance_score: score,
        preview,
        preview_columns,
        total_rows,
    }
}

// First tabular resource wins. Datasets without one keep their landing page
// so the caller can still surface them.
fn select_resource(dataset: &CatalogDataset) -> (String, DatasetFormat) {
    for resource in &dataset.resources {
        if resource.url.is_empty() {
            continue;
        }
        let format = DatasetFormat::from_resource(resource.format.as_deref(), &resource.url);
        if format.is_tabular() {
            return (resource.url.clone(), format);
        }
    }

    let url = dataset
        .resources
        .iter()
        .find(|r| !r.url.is_empty())
        .map(|r| r.url.clone())
        .unwrap_or_else(|| dataset.page.clone());
    (url, DatasetFormat::Unknown)
}

// Any failure along download, parse or the quality gate suppresses the
// preview without failing discovery.
async fn fetch_preview(
    catalog: &CatalogClient,
    thresholds: &QualityThresholds,
    url: &str,
    format: TableFormat,
) -> Option<ParsedTable> {
    let bytes = match catalog.download(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("Couldn't download {}: {:?}", url, e);
            return None;
        }
    };

    let table = match parse(&bytes, format, url) {
        Ok(table) => table,
        Err(e) => {
            log::error!("Couldn't parse {}: {:?}", url, e);
            return None;
        }
    };

    match validate_table(&table, thresholds) {
        true => Some(table),
        false => {
            log::info!("Preview of {} rejected by the quality gate", url);
            None
        }
    }
}

// Keeps the first occurrence, which is the highest ranked one.
fn dedup_by_url(candidates: Vec<DatasetCandidate>) -> Vec<DatasetCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}
