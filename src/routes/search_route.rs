use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::services::{SearchMode, WebSearchService};

const DEFAULT_MAX_RESULTS: usize = 10;

#[derive(Deserialize)]
pub struct SearchRequest {
    query: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

#[post("/search/general")]
pub async fn search_general(
    web_search: web::Data<WebSearchService>,
    body: web::Json<SearchRequest>,
) -> HttpResponse {
    run_search(web_search, body, SearchMode::General).await
}

#[post("/search/data")]
pub async fn search_data(
    web_search: web::Data<WebSearchService>,
    body: web::Json<SearchRequest>,
) -> HttpResponse {
    run_search(web_search, body, SearchMode::Data).await
}

async fn run_search(
    web_search: web::Data<WebSearchService>,
    body: web::Json<SearchRequest>,
    mode: SearchMode,
) -> HttpResponse {
    match web_search.search(&body.query, body.max_results, mode).await {
        Ok(results) => {
            let count = results.len();
            HttpResponse::Ok().json(json!({
                "success": true,
                "results": results,
                "count": count,
            }))
        }
        Err(e) => {
            log::error!("Web search failed: {:?}", e);
            HttpResponse::InternalServerError().json(json!({ "detail": e.to_string() }))
        }
    }
}
