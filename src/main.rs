use std::net::TcpListener;
use std::sync::Arc;

use atlas::{
    configuration::get_configuration,
    routes::health_route::BackendStatus,
    services::{
        AnalysisService, CatalogClient, DiscoveryPipeline, Embedder, HashingEmbedder, LlmGateway,
        MockGateway, MockSearcher, OpenAiEmbedder, OpenAiGateway, RelevanceGate, SemanticRanker,
        TavilySearcher, WebSearchService, WebSearcher,
    },
    startup::run,
};
use env_logger::Env;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let searcher: Arc<dyn WebSearcher> = match configuration.api_keys.tavily() {
        Some(key) => {
            log::info!("Web search runs against the live backend");
            Arc::new(TavilySearcher::new(
                key.to_string(),
                configuration.web_search.base_url.clone(),
            ))
        }
        None => {
            log::warn!("No web search API key configured, using mock results");
            Arc::new(MockSearcher)
        }
    };
    let web_search_live = configuration.api_keys.tavily().is_some();

    let (llm, embedder): (Arc<dyn LlmGateway>, Arc<dyn Embedder>) =
        match configuration.api_keys.openai() {
            Some(key) => {
                log::info!("LLM and embeddings run against the live backend");
                (
                    Arc::new(OpenAiGateway::new(
                        key.to_string(),
                        configuration.llm.chat_model.clone(),
                    )),
                    Arc::new(OpenAiEmbedder::new(
                        key.to_string(),
                        configuration.llm.embedding_model.clone(),
                    )),
                )
            }
            None => {
                log::warn!("No LLM API key configured, using mock responses");
                (Arc::new(MockGateway), Arc::new(HashingEmbedder::default()))
            }
        };
    let llm_live = configuration.api_keys.openai().is_some();

    let web_search = WebSearchService::new(
        searcher,
        configuration.web_search.trusted_domains(),
        configuration.web_search.general_min_score,
        configuration.web_search.data_min_score,
    );
    let catalog = CatalogClient::new(
        configuration.catalog.base_url.clone(),
        configuration.catalog.source_name.clone(),
        configuration.catalog.page_size,
    );
    let ranker = Arc::new(SemanticRanker::new(
        embedder,
        configuration.catalog.authority_organizations.clone(),
    ));
    let thresholds = configuration.quality.thresholds();
    let discovery = DiscoveryPipeline::new(
        catalog.clone(),
        ranker,
        thresholds,
        configuration.catalog.max_candidates,
    );
    let relevance_gate = RelevanceGate::new(llm.clone());
    let analysis = AnalysisService::new(llm);
    let status = BackendStatus {
        web_search_live,
        llm_live,
    };

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;
    log::info!(
        "Starting the server on {}:{}",
        configuration.application.host,
        configuration.application.port
    );

    run(
        listener,
        web_search,
        discovery,
        relevance_gate,
        analysis,
        catalog,
        thresholds,
        status,
        configuration.application.frontend_origin,
    )?
    .await
}
