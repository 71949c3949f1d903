//! Embedding gateways
//!
//! [`EmbeddingGateway`] is the only seam the engine consumes. Backends:
//! Model2Vec static embeddings, a static lookup table, and an opt-in LRU cache
//! wrapper.

mod cache;
mod discovery;
mod gateway;
mod lookup;
mod model2vec;

pub use cache::CachedGateway;
pub use discovery::find_model2vec_path;
pub use gateway::EmbeddingGateway;
pub use lookup::LookupGateway;
pub use model2vec::{Model2VecConfig, Model2VecGateway};
