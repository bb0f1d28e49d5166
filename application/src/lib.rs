pub mod embedding_cache;
pub mod lead_service;
pub mod rag_service;
