pub mod controller;
pub mod crawl;
pub mod derive;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod fields;
pub mod gate;
pub mod loader;
pub mod normalize;
pub mod page;
pub mod probe;

pub use controller::{process_page, PageOutcome};
pub use crawl::{crawl_site, CrawlSummary};
pub use error::EngineError;
pub use fetch::PageFetcher;
pub use page::FetchedPage;
pub use probe::{HttpProber, UrlProber};
