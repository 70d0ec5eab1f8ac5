use crate::errors::RepoError;
use crate::models::{Bid, CaptionPair, Meme};
use async_trait::async_trait;
use uuid::Uuid;

/// Trait defining operations for storing and retrieving memes.
#[async_trait]
pub trait MemeRepository: Send + Sync + 'static {
    // Send+Sync+'static required for Arc<dyn>
    /// Persists a newly created meme.
    async fn create(&self, meme: &Meme) -> Result<(), RepoError>;

    /// Retrieves a meme by its unique ID.
    /// Returns Ok(None) if the meme is not found.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Meme>, RepoError>;

    /// Persists an in-place mutation (votes, bids) of an existing meme.
    async fn update(&self, meme: &Meme) -> Result<(), RepoError>;

    /// Lists all memes, in no particular order.
    /// WARNING: This can be inefficient on large datasets. Consider pagination.
    async fn list_all(&self) -> Result<Vec<Meme>, RepoError>;
}

/// Append-only record of accepted bids. Entries are never mutated or
/// deleted.
#[async_trait]
pub trait BidLedger: Send + Sync + 'static {
    async fn append(&self, bid: &Bid) -> Result<(), RepoError>;
}

/// Produces the caption/vibe pair for a new meme. Implementations must not
/// fail: any upstream problem resolves to a fallback pair.
#[async_trait]
pub trait CaptionSource: Send + Sync + 'static {
    async fn generate(&self, title: &str, tags: &[String]) -> CaptionPair;
}
