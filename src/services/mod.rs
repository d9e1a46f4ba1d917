pub mod analysis;
pub mod catalog;
pub mod discovery;
pub mod embedder;
pub mod llm_gateway;
pub mod ranker;
pub mod relevance_gate;
pub mod web_search;

pub use analysis::*;
pub use catalog::*;
pub use discovery::*;
pub use embedder::*;
pub use llm_gateway::*;
pub use ranker::*;
pub use relevance_gate::*;
pub use web_search::*;
