use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::domain::analysis::rejection_message;
use crate::services::{
    format_context, AnalysisService, DiscoveryPipeline, RelevanceGate, SearchMode,
    WebSearchService,
};

const CHAT_SEARCH_RESULTS: usize = 5;

#[derive(Deserialize)]
pub struct ChatRequest {
    message: String,
}

#[post("/chat")]
pub async fn chat(
    web_search: web::Data<WebSearchService>,
    discovery: web::Data<DiscoveryPipeline>,
    relevance_gate: web::Data<RelevanceGate>,
    analysis: web::Data<AnalysisService>,
    body: web::Json<ChatRequest>,
) -> HttpResponse {
    let message = body.message.trim();

    let intent = relevance_gate.classify_intent(message).await;
    if !intent.is_market_analysis {
        log::info!("Rejected off-topic message: {}", intent.explanation);
        return HttpResponse::Ok().json(json!({
            "success": true,
            "response": rejection_message(),
            "sources": [],
            "datasets": [],
            "generated_at": Utc::now(),
        }));
    }

    // The qualitative answer and the dataset discovery run concurrently and
    // join before assembly.
    let qualitative = async {
        let results = match web_search
            .search(message, CHAT_SEARCH_RESULTS, SearchMode::General)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                log::error!("Chat web search failed, answering without context: {:?}", e);
                vec![]
            }
        };
        let context = format_context(&results);
        let response = analysis.answer(message, &context).await;
        (response, results)
    };
    let quantitative = discovery.discover(message);

    let ((response, sources), candidates) = tokio::join!(qualitative, quantitative);

    let (datasets, _) = relevance_gate.validate_candidates(message, candidates).await;

    HttpResponse::Ok().json(json!({
        "success": true,
        "response": response,
        "sources": sources,
        "datasets": datasets,
        "generated_at": Utc::now(),
    }))
}
