use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opening bid every meme starts at; accepted bids must strictly exceed the
/// current value.
pub const STARTING_BID: i64 = 100;

/// The primary content record. Mutated in place by votes and bids, never
/// deleted. `ai_caption`/`ai_vibe` are set once at creation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Meme {
    pub id: Uuid,
    pub title: String,
    pub image_url: String,
    pub tags: Vec<String>,
    pub ai_caption: String,
    pub ai_vibe: String,
    pub upvotes: i64,
    pub current_bid: i64,
    pub owner_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Append-only record of an accepted bid. `meme_id` is a weak reference;
/// the ledger never owns or cascades to the meme.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Bid {
    pub id: Uuid,
    pub meme_id: Uuid,
    pub user_id: String,
    pub amount: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Caption/vibe pair produced by the caption generator (or its fallback).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CaptionPair {
    pub ai_caption: String,
    pub ai_vibe: String,
}
