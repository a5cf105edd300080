use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("pagination limit reached for {start_url}: exceeded {max_pages} pages")]
    PaginationLimit { start_url: String, max_pages: usize },
}
