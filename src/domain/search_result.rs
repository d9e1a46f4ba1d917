use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

const GOV_DATA_SCORE: u8 = 95;
const MARKET_REPORT_SCORE: u8 = 90;
const NEWS_SCORE: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    MarketReport,
    News,
    GovData,
    Other,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source_type: SourceType,
    pub reliability_score: u8,
}

#[derive(Debug, Clone)]
pub struct TrustedDomains {
    pub gov: Vec<String>,
    pub market_report: Vec<String>,
    pub news: Vec<String>,
    pub unclassified_score: u8,
}

// Substring match on the hostname, priority order: government sources beat
// market-research firms beat news outlets.
pub fn classify_source(url: &str, trusted: &TrustedDomains) -> (SourceType, u8) {
    let host = match Url::parse(url) {
        Ok(parsed) => parsed.host_str().unwrap_or("").to_lowercase(),
        Err(_) => url.to_lowercase(),
    };

    if matches_any(&host, &trusted.gov) {
        return (SourceType::GovData, GOV_DATA_SCORE);
    }
    if matches_any(&host, &trusted.market_report) {
        return (SourceType::MarketReport, MARKET_REPORT_SCORE);
    }
    if matches_any(&host, &trusted.news) {
        return (SourceType::News, NEWS_SCORE);
    }

    (SourceType::Other, trusted.unclassified_score)
}

fn matches_any(host: &str, domains: &[String]) -> bool {
    domains.iter().any(|d| host.contains(&d.to_lowercase()))
}

pub fn filter_by_reliability(results: &[SearchResult], min_score: u8) -> Vec<SearchResult> {
    results
        .iter()
        .filter(|r| r.reliability_score >= min_score)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trusted() -> TrustedDomains {
        TrustedDomains {
            gov: vec![".gov".into(), ".gouv".into(), ".europa.eu".into()],
            market_report: vec!["statista.com".into(), "kpmg.com".into()],
            news: vec!["lesechos.fr".into(), "reuters.com".into()],
            unclassified_score: 70,
        }
    }

    fn result(url: &str, score: u8) -> SearchResult {
        SearchResult {
            title: "t".to_string(),
            url: url.to_string(),
            snippet: "s".to_string(),
            published_at: None,
            source_type: SourceType::Other,
            reliability_score: score,
        }
    }

    #[test]
    fn classifies_government_sources() {
        let (source_type, score) =
            classify_source("https://www.data.gouv.fr/fr/datasets/x", &trusted());

        assert_eq!(source_type, SourceType::GovData);
        assert_eq!(score, 95);
    }

    #[test]
    fn classifies_market_report_sources() {
        let (source_type, score) =
            classify_source("https://www.statista.com/statistics/ev-market", &trusted());

        assert_eq!(source_type, SourceType::MarketReport);
        assert_eq!(score, 90);
    }

    #[test]
    fn classifies_news_sources() {
        let (source_type, score) =
            classify_source("https://www.lesechos.fr/industrie", &trusted());

        assert_eq!(source_type, SourceType::News);
        assert_eq!(score, 85);
    }

    #[test]
    fn unknown_hosts_fall_back_to_other() {
        let (source_type, score) = classify_source("https://example.org/blog", &trusted());

        assert_eq!(source_type, SourceType::Other);
        assert_eq!(score, 70);
    }

    #[test]
    fn hostname_match_is_case_insensitive() {
        let (source_type, _) = classify_source("https://WWW.STATISTA.COM/page", &trusted());

        assert_eq!(source_type, SourceType::MarketReport);
    }

    #[test]
    fn unparseable_url_still_classifies_by_substring() {
        let (source_type, _) = classify_source("statista.com/page", &trusted());

        assert_eq!(source_type, SourceType::MarketReport);
    }

    #[test]
    fn filters_below_threshold() {
        let results = vec![
            result("https://a.example", 95),
            result("https://b.example", 70),
            result("https://c.example", 60),
        ];

        let kept = filter_by_reliability(&results, 75);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://a.example");
    }
}
