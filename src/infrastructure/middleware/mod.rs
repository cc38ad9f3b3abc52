// Request-scoped viewer resolution: middleware builds it, extractor hands it to handlers

pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use viewer_context_extractor::Vc;
pub use viewer_context_middleware::{create_viewer_context, viewer_context_middleware};
