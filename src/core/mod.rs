// Core types and pure helpers shared by the store and the API layer

pub mod pagination;
pub mod period;
pub mod segmenter;
pub mod strong_types;
pub mod validation;

// Re-export commonly used types
pub use pagination::{split_page, Page, PageRequest, PaginationInfo};
pub use period::RankingPeriod;
pub use strong_types::{TankaId, Timestamp, UserId};
