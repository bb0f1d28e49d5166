pub mod config;
pub mod corpus_loader;
pub mod embedding_storage;
pub mod lead_storage;
pub mod openai_client;
pub mod search;
