use std::net::TcpListener;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    domain::table::QualityThresholds,
    routes::{
        analysis_route, chat_route, dataset_route,
        health_route::{self, BackendStatus},
        search_route,
    },
    services::{
        AnalysisService, CatalogClient, DiscoveryPipeline, RelevanceGate, WebSearchService,
    },
};

pub fn run(
    listener: TcpListener,
    web_search: WebSearchService,
    discovery: DiscoveryPipeline,
    relevance_gate: RelevanceGate,
    analysis: AnalysisService,
    catalog: CatalogClient,
    thresholds: QualityThresholds,
    status: BackendStatus,
    frontend_origin: String,
) -> Result<Server, std::io::Error> {
    let web_search = web::Data::new(web_search);
    let discovery = web::Data::new(discovery);
    let relevance_gate = web::Data::new(relevance_gate);
    let analysis = web::Data::new(analysis);
    let catalog = web::Data::new(catalog);
    let thresholds = web::Data::new(thresholds);
    let status = web::Data::new(status);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_origin("http://localhost:3000")
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .service(health_route::root)
            .service(health_route::health)
            .service(
                web::scope("/api")
                    .service(search_route::search_general)
                    .service(search_route::search_data)
                    .service(chat_route::chat)
                    .service(dataset_route::search_datasets)
                    .service(dataset_route::download_dataset)
                    .service(analysis_route::generate_analysis),
            )
            .app_data(web_search.clone())
            .app_data(discovery.clone())
            .app_data(relevance_gate.clone())
            .app_data(analysis.clone())
            .app_data(catalog.clone())
            .app_data(thresholds.clone())
            .app_data(status.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
