pub mod analysis;
pub mod dataset;
pub mod query;
pub mod ranking;
pub mod search_result;
pub mod table;
