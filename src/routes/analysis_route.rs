use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::services::{format_context, AnalysisService, SearchMode, WebSearchService};

const ANALYSIS_SEARCH_RESULTS: usize = 5;

#[derive(Deserialize)]
pub struct AnalysisRequest {
    query: String,
    #[serde(default = "default_include_web_search")]
    include_web_search: bool,
}

fn default_include_web_search() -> bool {
    true
}

#[post("/analysis")]
pub async fn generate_analysis(
    web_search: web::Data<WebSearchService>,
    analysis: web::Data<AnalysisService>,
    body: web::Json<AnalysisRequest>,
) -> HttpResponse {
    let mut sources = vec![];
    let mut web_context = String::new();

    if body.include_web_search {
        match web_search
            .search(&body.query, ANALYSIS_SEARCH_RESULTS, SearchMode::General)
            .await
        {
            Ok(results) => {
                web_context = format_context(&results);
                sources = results;
            }
            Err(e) => {
                log::error!("Analysis web search failed: {:?}", e);
                return HttpResponse::InternalServerError()
                    .json(json!({ "detail": e.to_string() }));
            }
        }
    }

    let source_urls: Vec<String> = sources.iter().map(|r| r.url.clone()).collect();
    let document = analysis
        .generate(&body.query, &web_context, &source_urls)
        .await;

    HttpResponse::Ok().json(json!({
        "success": true,
        "analysis": {
            "qualitative": document,
            "sources": sources,
            "generated_at": Utc::now(),
        },
    }))
}
