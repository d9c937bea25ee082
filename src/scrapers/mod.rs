pub mod extract;
pub mod fetcher;
pub mod headers;
pub mod snapshot;
pub mod traits;
pub mod types;

pub use fetcher::ListingFetcher;
pub use snapshot::SnapshotCache;
pub use traits::PageSource;
pub use types::MapBounds;
