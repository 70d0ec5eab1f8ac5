use crate::broadcast::{ChannelEvent, EventBroadcaster};
use crate::domain::{BidLedger, CaptionSource, MemeRepository};
use crate::errors::ServiceError;
use crate::models::{Bid, Meme, STARTING_BID};
use chrono::Utc;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Fixed pool of fake owners; there is no real authentication.
const USER_POOL: [&str; 3] = ["CyberPunk420", "NeoSynth", "GlitchQueen"];

/// Fallback images for memes created without one.
const IMAGE_POOL: [&str; 2] = [
    "https://i.imgflip.com/1bij.jpg",
    "https://i.imgflip.com/26am.jpg",
];

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Result of an applied vote; doubles as the REST response body and the
/// `voteUpdate` broadcast payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub meme_id: Uuid,
    pub vote_count: i64,
}

/// The single authoritative mutation entry point. REST handlers and the
/// realtime intent handler both call into this; every successful mutation
/// broadcasts exactly one event, after persistence.
///
/// Vote and bid are read-modify-write with no lock or transaction across
/// the read-check-write, so concurrent mutations of the same meme can lose
/// updates. Preserved from the original design; see DESIGN.md for the
/// optimistic-concurrency upgrade path.
pub struct MemeService {
    memes: Arc<dyn MemeRepository>,
    bids: Arc<dyn BidLedger>,
    captions: Arc<dyn CaptionSource>,
    broadcaster: Arc<EventBroadcaster>,
}

impl MemeService {
    pub fn new(
        memes: Arc<dyn MemeRepository>,
        bids: Arc<dyn BidLedger>,
        captions: Arc<dyn CaptionSource>,
        broadcaster: Arc<EventBroadcaster>,
    ) -> Self {
        Self {
            memes,
            bids,
            captions,
            broadcaster,
        }
    }

    /// Creates a meme: validates the title, fills owner and image from the
    /// fixed pools, generates the caption pair (blocking, with fallback),
    /// persists, then broadcasts `newMeme`.
    pub async fn create_meme(
        &self,
        title: &str,
        image_url: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<Meme, ServiceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Title is required and must be a non-empty string".to_string(),
            ));
        }

        let tags = tags.unwrap_or_default();
        let image_url = image_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(random_image);
        let owner_id = random_owner();

        // Creation waits on the caption pair; the generator never fails,
        // worst case it answers with its fallback after the client timeout.
        let pair = self.captions.generate(title, &tags).await;

        let now = Utc::now();
        let meme = Meme {
            id: Uuid::new_v4(),
            title: title.to_string(),
            image_url,
            tags,
            ai_caption: pair.ai_caption,
            ai_vibe: pair.ai_vibe,
            upvotes: 0,
            current_bid: STARTING_BID,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        self.memes.create(&meme).await?;

        tracing::info!(meme_id = %meme.id, owner_id = %meme.owner_id, "Meme created");
        self.broadcaster
            .broadcast(ChannelEvent::NewMeme(meme.clone()))
            .await;
        Ok(meme)
    }

    /// All memes, newest first.
    pub async fn list_memes(&self) -> Result<Vec<Meme>, ServiceError> {
        let mut memes = self.memes.list_all().await?;
        memes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(memes)
    }

    /// Applies an up/down vote. The count is floored at zero, never
    /// negative.
    pub async fn apply_vote(
        &self,
        meme_id: Uuid,
        vote_type: &str,
    ) -> Result<VoteOutcome, ServiceError> {
        let delta = match vote_type {
            "up" => 1,
            "down" => -1,
            _ => {
                return Err(ServiceError::InvalidInput(
                    "Invalid vote type".to_string(),
                ));
            }
        };

        let mut meme = self
            .memes
            .get_by_id(meme_id)
            .await?
            .ok_or(ServiceError::MemeNotFound(meme_id))?;

        meme.upvotes = (meme.upvotes + delta).max(0);
        meme.updated_at = Utc::now();
        self.memes.update(&meme).await?;

        let outcome = VoteOutcome {
            meme_id,
            vote_count: meme.upvotes,
        };
        tracing::debug!(%meme_id, vote_type, vote_count = outcome.vote_count, "Vote applied");
        self.broadcaster
            .broadcast(ChannelEvent::VoteUpdate(outcome.clone()))
            .await;
        Ok(outcome)
    }

    /// Applies a bid. Accepted bids must strictly exceed the meme's current
    /// bid; the bid record is appended to the ledger before the meme is
    /// updated, and the broadcast follows both writes.
    pub async fn apply_bid(
        &self,
        meme_id: Uuid,
        user_id: &str,
        credits: i64,
    ) -> Result<Bid, ServiceError> {
        if user_id.trim().is_empty() || credits <= 0 {
            return Err(ServiceError::InvalidInput(
                "Invalid userId or credits".to_string(),
            ));
        }

        let mut meme = self
            .memes
            .get_by_id(meme_id)
            .await?
            .ok_or(ServiceError::MemeNotFound(meme_id))?;

        if credits <= meme.current_bid {
            return Err(ServiceError::BidTooLow {
                offered: credits,
                current: meme.current_bid,
            });
        }

        let bid = Bid {
            id: Uuid::new_v4(),
            meme_id,
            user_id: user_id.to_string(),
            amount: credits,
            created_at: Utc::now(),
        };
        self.bids.append(&bid).await?;

        meme.current_bid = credits;
        meme.updated_at = bid.created_at;
        self.memes.update(&meme).await?;

        tracing::info!(%meme_id, user_id, credits, "Bid accepted");
        self.broadcaster
            .broadcast(ChannelEvent::BidUpdate {
                meme_id,
                user_id: bid.user_id.clone(),
                credits,
            })
            .await;
        Ok(bid)
    }

    /// Top memes by upvotes, descending, ties broken by creation time
    /// ascending. Read-only.
    pub async fn top_memes(&self, limit: usize) -> Result<Vec<Meme>, ServiceError> {
        let mut memes = self.memes.list_all().await?;
        memes.sort_by(|a, b| {
            b.upvotes
                .cmp(&a.upvotes)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        memes.truncate(limit);
        Ok(memes)
    }
}

fn random_owner() -> String {
    let mut rng = rand::rng();
    USER_POOL
        .choose(&mut rng)
        .map(|s| s.to_string())
        .unwrap_or_else(|| USER_POOL[0].to_string())
}

fn random_image() -> String {
    let mut rng = rand::rng();
    IMAGE_POOL
        .choose(&mut rng)
        .map(|s| s.to_string())
        .unwrap_or_else(|| IMAGE_POOL[0].to_string())
}
