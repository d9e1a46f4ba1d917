use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::domain::dataset::DatasetFormat;
use crate::domain::table::{parse, validate_table, QualityThresholds, PREVIEW_ROWS};
use crate::services::{CatalogClient, DiscoveryPipeline, RelevanceGate};

#[derive(Deserialize)]
pub struct DatasetSearchRequest {
    query: String,
}

#[post("/datasets/search")]
pub async fn search_datasets(
    discovery: web::Data<DiscoveryPipeline>,
    relevance_gate: web::Data<RelevanceGate>,
    body: web::Json<DatasetSearchRequest>,
) -> HttpResponse {
    let candidates = discovery.discover(&body.query).await;
    let (datasets, explanation) = relevance_gate
        .validate_candidates(&body.query, candidates)
        .await;

    HttpResponse::Ok().json(json!({
        "success": true,
        "datasets": datasets,
        "explanation": explanation,
    }))
}

#[derive(Deserialize)]
pub struct DatasetDownloadRequest {
    url: String,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    query: Option<String>,
}

#[post("/datasets/download")]
pub async fn download_dataset(
    catalog: web::Data<CatalogClient>,
    relevance_gate: web::Data<RelevanceGate>,
    thresholds: web::Data<QualityThresholds>,
    body: web::Json<DatasetDownloadRequest>,
) -> HttpResponse {
    let format = DatasetFormat::from_resource(body.format.as_deref(), &body.url);
    let table_format = match format.table_format() {
        Some(table_format) => table_format,
        None => {
            return HttpResponse::UnprocessableEntity().json(json!({
                "detail": "Format non pris en charge : seuls les fichiers CSV et Excel sont acceptés.",
            }))
        }
    };

    let bytes = match catalog.download(&body.url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("Couldn't download {}: {:?}", body.url, e);
            return HttpResponse::InternalServerError().json(json!({ "detail": e.to_string() }));
        }
    };

    let table = match parse(&bytes, table_format, &body.url) {
        Ok(table) => table,
        Err(e) => {
            return HttpResponse::UnprocessableEntity().json(json!({
                "detail": format!("Le fichier n'a pas pu être interprété : {}", e),
            }))
        }
    };

    if !validate_table(&table, &thresholds) {
        return HttpResponse::UnprocessableEntity().json(json!({
            "detail": "Le fichier ne contient pas assez de données exploitables.",
        }));
    }

    let mut response = json!({
        "success": true,
        "table": {
            "format": table.format,
            "url": &table.url,
            "columns": &table.columns,
            "preview": table.preview(PREVIEW_ROWS),
            "total_rows": table.total_rows,
        },
    });

    if let Some(query) = body.query.as_deref().filter(|q| !q.trim().is_empty()) {
        let decision = relevance_gate.validate_content(query, &table).await;
        response["relevance"] = json!({
            "relevant": decision.relevant,
            "explanation": decision.explanation,
        });
    }

    HttpResponse::Ok().json(response)
}
