//! Collector side of the survey pipeline: the sheet-like store, the
//! row matcher and merger behind the upsert, and the HTTP endpoint.

pub mod http;
pub mod matcher;
pub mod merge;
pub mod service;
pub mod store;

pub use http::CollectorServer;
pub use matcher::Identifier;
pub use service::CollectorService;
pub use store::SheetStore;
pub use store::StoreError;
pub use store::StoredRow;
