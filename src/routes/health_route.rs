use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

// Reports which collaborators run against their live backend rather than
// the deterministic mock.
#[derive(Debug, Clone)]
pub struct BackendStatus {
    pub web_search_live: bool,
    pub llm_live: bool,
}

#[get("/")]
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "online",
        "service": "Atlas Market Analysis API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[get("/health")]
pub async fn health(status: web::Data<BackendStatus>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "services": {
            "web_search": status.web_search_live,
            "llm": status.llm_live,
        },
    }))
}
