pub mod analysis_route;
pub mod chat_route;
pub mod dataset_route;
pub mod health_route;
pub mod search_route;
