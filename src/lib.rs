//! Semantic search over local documents.
//!
//! VecMind splits `.txt` and `.md` files into paragraph chunks, embeds each
//! chunk, and stores the vectors next to the text in SQLite. Queries are
//! embedded the same way and ranked by cosine similarity.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   evaluating `vec_distance_cosine` over vectors stored as text literals
//! - **Embeddings**: an OpenAI-compatible `/embeddings` endpoint, with a
//!   deterministic SHA-256 fallback when no key is set or the call fails
//! - **Search**: native SQL ranking first, then an in-process cosine scan over
//!   every stored chunk when the native query returns nothing
//! - **Transport**: JSON over HTTP (axum) plus a small CLI
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, metadata, and health checks
//! - [`embedding`]: text-to-vector embedding with remote and hashed providers
//! - [`ingest`]: paragraph chunking and document indexing
//! - [`search`]: vector codec, cosine ranking, and the query orchestrator
//! - [`server`]: HTTP routes
//! - [`store`]: the chunk store trait and its SQLite implementation

pub mod config;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod search;
pub mod server;
pub mod store;
