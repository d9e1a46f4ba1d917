use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::search_result::{
    classify_source, filter_by_reliability, SearchResult, TrustedDomains,
};

const POOL_FACTOR: usize = 2;
const SNIPPET_CHARS: usize = 300;
const DATA_QUERY_SUFFIX: &str = "statistiques chiffres données marché";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    General,
    Data,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published_date: Option<String>,
}

#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        search_depth: &str,
        include_domains: &[String],
    ) -> anyhow::Result<Vec<RawSearchItem>>;
}

pub struct TavilySearcher {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    include_domains: &'a [String],
}

#[derive(Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<RawSearchItem>,
}

impl TavilySearcher {
    pub fn new(api_key: String, base_url: String) -> Self {
        TavilySearcher {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        search_depth: &str,
        include_domains: &[String],
    ) -> anyhow::Result<Vec<RawSearchItem>> {
        let body = TavilySearchRequest {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth,
            include_domains,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .timeout(SEARCH_TIMEOUT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let payload: TavilySearchResponse = response.json().await?;
        Ok(payload.results)
    }
}

// Canned results covering every source tier, so the whole classification and
// filtering chain runs without an API key.
pub struct MockSearcher;

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        _search_depth: &str,
        _include_domains: &[String],
    ) -> anyhow::Result<Vec<RawSearchItem>> {
        let results = vec![
            RawSearchItem {
                title: "Baromètre économique national".to_string(),
                url: "https://www.economie.gouv.fr/barometre-economique".to_string(),
                content: format!(
                    "Données simulées pour « {} » : le marché français est estimé à 4,2 \
                     milliards d'euros en 2025, en croissance de 12 % sur un an selon les \
                     chiffres officiels.",
                    query
                ),
                published_date: Some("2025-11-18".to_string()),
            },
            RawSearchItem {
                title: "Étude de marché sectorielle 2025".to_string(),
                url: "https://www.statista.com/outlook/etude-marche-france".to_string(),
                content: "Le segment premium représente 28 % des volumes et les cinq \
                          premiers acteurs concentrent 61 % du chiffre d'affaires du \
                          secteur."
                    .to_string(),
                published_date: Some("2025-09-02T08:30:00Z".to_string()),
            },
            RawSearchItem {
                title: "La filière accélère ses investissements".to_string(),
                url: "https://www.lesechos.fr/industrie-services/la-filiere-accelere".to_string(),
                content: "Les industriels annoncent 800 millions d'euros d'investissements \
                          sur trois ans pour répondre à la demande intérieure."
                    .to_string(),
                published_date: None,
            },
            RawSearchItem {
                title: "Analyse indépendante du secteur".to_string(),
                url: "https://www.exemple-media.fr/analyse-secteur".to_string(),
                content: "Un blog spécialisé revient sur les tendances de consommation \
                          observées depuis le début de l'année."
                    .to_string(),
                published_date: None,
            },
        ];

        Ok(results.into_iter().take(max_results).collect())
    }
}

pub struct WebSearchService {
    searcher: Arc<dyn WebSearcher>,
    trusted: TrustedDomains,
    general_min_score: u8,
    data_min_score: u8,
}

impl WebSearchService {
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        trusted: TrustedDomains,
        general_min_score: u8,
        data_min_score: u8,
    ) -> Self {
        WebSearchService {
            searcher,
            trusted,
            general_min_score,
            data_min_score,
        }
    }

    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        mode: SearchMode,
    ) -> anyhow::Result<Vec<SearchResult>> {
        let search_query = build_search_query(query, mode);
        let include_domains = self.preferred_domains(mode);
        let search_depth = match mode {
            SearchMode::General => "basic",
            SearchMode::Data => "advanced",
        };

        // Over-fetch so the reliability filter still leaves enough results.
        let raw = self
            .searcher
            .search(
                &search_query,
                max_results * POOL_FACTOR,
                search_depth,
                &include_domains,
            )
            .await?;

        let classified = self.classify_results(raw);
        let min_score = match mode {
            SearchMode::General => self.general_min_score,
            SearchMode::Data => self.data_min_score,
        };

        let mut kept = filter_by_reliability(&classified, min_score);
        if kept.is_empty() && !classified.is_empty() {
            log::warn!(
                "No search result reached reliability {}, keeping the unfiltered set",
                min_score
            );
            kept = classified;
        }
        kept.truncate(max_results);

        Ok(kept)
    }

    fn preferred_domains(&self, mode: SearchMode) -> Vec<String> {
        match mode {
            SearchMode::General => Vec::new(),
            SearchMode::Data => self
                .trusted
                .gov
                .iter()
                .chain(self.trusted.market_report.iter())
                .cloned()
                .collect(),
        }
    }

    fn classify_results(&self, raw: Vec<RawSearchItem>) -> Vec<SearchResult> {
        raw.into_iter()
            .filter(|item| !item.url.is_empty())
            .unique_by(|item| item.url.clone())
            .map(|item| {
                let (source_type, reliability_score) = classify_source(&item.url, &self.trusted);
                SearchResult {
                    title: item.title,
                    url: item.url,
                    snippet: truncate_snippet(&item.content),
                    published_at: parse_published_date(item.published_date.as_deref()),
                    source_type,
                    reliability_score,
                }
            })
            .collect()
    }
}

pub fn build_search_query(query: &str, mode: SearchMode) -> String {
    match mode {
        SearchMode::General => query.to_string(),
        SearchMode::Data => format!("{} {}", query, DATA_QUERY_SUFFIX),
    }
}

fn truncate_snippet(content: &str) -> String {
    content.chars().take(SNIPPET_CHARS).collect()
}

fn parse_published_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        Utc,
    ))
}

pub fn format_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "Aucun résultat de recherche web disponible.".to_string();
    }

    let mut context = String::from("Contexte de recherche web (sources récentes et fiables) :\n\n");
    for (i, result) in results.iter().enumerate() {
        context.push_str(&format!("{}. {}\n", i + 1, result.title));
        context.push_str(&format!(
            "   Source : {} (fiabilité {}/100)\n",
            result.url, result.reliability_score
        ));
        context.push_str(&format!("   {}\n\n", result.snippet));
    }
    context
}
