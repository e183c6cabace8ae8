pub mod batch;
pub mod config;
pub mod entities;
pub mod extractor;
pub mod fetcher;
pub mod listings;
pub mod llm;
pub mod pipeline;
pub mod table;
pub mod transform;
pub mod uploader;
