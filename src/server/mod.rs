//! HTTP server layer for RiskLens.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │      POST /model_page/    GET /{clean,dirty}_dataset_page/      │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │          routes             │  │
//! │  │ (upload, datasets, home) │  │ (router config, CORS, limit)│  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    clean_dataset_handler, dirty_dataset_handler, health_handler, home_handler,
    model_page_handler, AppState, ErrorResponse, HealthResponse, ModelPageError,
    ValidationErrorResponse, HOME_PAGE_HTML,
};
pub use routes::{create_router, RouterConfig};
