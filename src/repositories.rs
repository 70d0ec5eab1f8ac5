use crate::{
    domain::{BidLedger, MemeRepository},
    errors::RepoError,
    models::{Bid, Meme},
};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_dynamodb::{Client as DynamoDbClient, types::AttributeValue};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DynamoMemeRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoMemeRepository {
    /// Creates a new repository instance configured for a specific table.
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        info!(%table_name, "Initializing DynamoMemeRepository");
        Self { client, table_name }
    }

    /// PutItem writes the whole record, so create and update share this.
    /// The in-place vote/bid mutations are read-modify-write with no
    /// condition expression; concurrent writers to the same meme can lose
    /// updates (see DESIGN.md).
    async fn put(&self, meme: &Meme) -> Result<(), RepoError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(meme_to_item(meme)))
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to put meme (id: {})",
                self.table_name, meme.id
            ))
            .map_err(RepoError::BackendError)?;
        Ok(())
    }
}

#[async_trait]
impl MemeRepository for DynamoMemeRepository {
    async fn create(&self, meme: &Meme) -> Result<(), RepoError> {
        self.put(meme).await
    }

    /// Retrieves a meme using GetItem.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Meme>, RepoError> {
        let id_str = id.to_string();
        let resp = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("meme_id", AttributeValue::S(id_str.clone()))
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to get meme (id: {})",
                self.table_name, id_str
            ))
            .map_err(RepoError::BackendError)?;

        match resp.item {
            Some(item) => match item_to_meme(&item) {
                Some(meme) => Ok(Some(meme)),
                None => {
                    tracing::error!(meme_id = %id_str, table_name = %self.table_name, "DynamoDB: Retrieved item but failed to parse into Meme");
                    Err(RepoError::DataCorruption(format!(
                        "Failed to parse meme data retrieved from DynamoDB table '{}' for id {}",
                        self.table_name, id_str
                    )))
                }
            },
            None => Ok(None), // Item not found is not an error
        }
    }

    async fn update(&self, meme: &Meme) -> Result<(), RepoError> {
        self.put(meme).await
    }

    /// Lists all memes using Scan. Handles pagination.
    async fn list_all(&self) -> Result<Vec<Meme>, RepoError> {
        tracing::debug!("DynamoDB: Scanning table '{}' for all memes", self.table_name);
        let mut memes: Vec<Meme> = Vec::new();
        let mut last_evaluated_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request_builder = self.client.scan().table_name(&self.table_name);

            // Apply ExclusiveStartKey if paginating from previous response
            if let Some(lek) = last_evaluated_key {
                request_builder = request_builder.set_exclusive_start_key(Some(lek));
            }

            let resp = request_builder
                .send()
                .await
                .context(format!(
                    "DynamoDB: Failed to scan table '{}'",
                    self.table_name
                ))
                .map_err(RepoError::BackendError)?;

            if let Some(items) = resp.items {
                for item in items {
                    match item_to_meme(&item) {
                        Some(meme) => memes.push(meme),
                        None => {
                            let item_id = item.get("meme_id").and_then(|v| v.as_s().ok());
                            tracing::error!(item.id = ?item_id, table_name = %self.table_name, "DynamoDB: Failed to parse item from scan into Meme");
                            // Fail fast if data in the table is corrupt
                            return Err(RepoError::DataCorruption(format!(
                                "DynamoDB: Failed to parse item {:?} during scan of table '{}'",
                                item_id, self.table_name
                            )));
                        }
                    }
                }
            }

            // Check for next page
            last_evaluated_key = resp.last_evaluated_key;
            if last_evaluated_key.is_none() {
                break;
            }
            tracing::debug!(
                "DynamoDB Scan (table: {}): Continuing with LastEvaluatedKey...",
                self.table_name
            );
        }

        tracing::debug!(
            "DynamoDB (table: {}): Listed {} memes",
            self.table_name,
            memes.len()
        );
        Ok(memes)
    }
}

#[derive(Debug, Clone)]
pub struct DynamoBidLedger {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoBidLedger {
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        info!(%table_name, "Initializing DynamoBidLedger");
        Self { client, table_name }
    }
}

#[async_trait]
impl BidLedger for DynamoBidLedger {
    /// Appends an accepted bid. Entries are keyed by their own id and never
    /// overwritten.
    async fn append(&self, bid: &Bid) -> Result<(), RepoError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(bid_to_item(bid)))
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to append bid (id: {})",
                self.table_name, bid.id
            ))
            .map_err(RepoError::BackendError)?;
        Ok(())
    }
}

// --- Attribute map conversion helpers ---

fn meme_to_item(meme: &Meme) -> HashMap<String, AttributeValue> {
    let tags = meme
        .tags
        .iter()
        .map(|t| AttributeValue::S(t.clone()))
        .collect();
    HashMap::from([
        ("meme_id".to_string(), AttributeValue::S(meme.id.to_string())),
        ("title".to_string(), AttributeValue::S(meme.title.clone())),
        (
            "image_url".to_string(),
            AttributeValue::S(meme.image_url.clone()),
        ),
        ("tags".to_string(), AttributeValue::L(tags)),
        (
            "ai_caption".to_string(),
            AttributeValue::S(meme.ai_caption.clone()),
        ),
        (
            "ai_vibe".to_string(),
            AttributeValue::S(meme.ai_vibe.clone()),
        ),
        (
            "upvotes".to_string(),
            AttributeValue::N(meme.upvotes.to_string()),
        ),
        (
            "current_bid".to_string(),
            AttributeValue::N(meme.current_bid.to_string()),
        ),
        (
            "owner_id".to_string(),
            AttributeValue::S(meme.owner_id.clone()),
        ),
        (
            "created_at".to_string(),
            AttributeValue::S(meme.created_at.to_rfc3339()),
        ),
        (
            "updated_at".to_string(),
            AttributeValue::S(meme.updated_at.to_rfc3339()),
        ),
    ])
}

fn bid_to_item(bid: &Bid) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("bid_id".to_string(), AttributeValue::S(bid.id.to_string())),
        (
            "meme_id".to_string(),
            AttributeValue::S(bid.meme_id.to_string()),
        ),
        (
            "user_id".to_string(),
            AttributeValue::S(bid.user_id.clone()),
        ),
        (
            "amount".to_string(),
            AttributeValue::N(bid.amount.to_string()),
        ),
        (
            "created_at".to_string(),
            AttributeValue::S(bid.created_at.to_rfc3339()),
        ),
    ])
}

// Helper function to convert a DynamoDB item map back into a Meme.
fn item_to_meme(item: &HashMap<String, AttributeValue>) -> Option<Meme> {
    let id = item
        .get("meme_id")?
        .as_s()
        .ok()
        .and_then(|s| Uuid::parse_str(s).ok())?;
    let title = item.get("title")?.as_s().ok()?.to_string();
    let image_url = item.get("image_url")?.as_s().ok()?.to_string();
    let tags = item
        .get("tags")?
        .as_l()
        .ok()?
        .iter()
        .map(|v| v.as_s().ok().map(|s| s.to_string()))
        .collect::<Option<Vec<String>>>()?;
    let ai_caption = item.get("ai_caption")?.as_s().ok()?.to_string();
    let ai_vibe = item.get("ai_vibe")?.as_s().ok()?.to_string();
    let upvotes = parse_number(item.get("upvotes")?)?;
    let current_bid = parse_number(item.get("current_bid")?)?;
    let owner_id = item.get("owner_id")?.as_s().ok()?.to_string();
    let created_at = parse_timestamp(item.get("created_at")?)?;
    let updated_at = parse_timestamp(item.get("updated_at")?)?;

    Some(Meme {
        id,
        title,
        image_url,
        tags,
        ai_caption,
        ai_vibe,
        upvotes,
        current_bid,
        owner_id,
        created_at,
        updated_at,
    })
}

fn parse_number(value: &AttributeValue) -> Option<i64> {
    value.as_n().ok().and_then(|n| n.parse::<i64>().ok())
}

fn parse_timestamp(value: &AttributeValue) -> Option<DateTime<Utc>> {
    value
        .as_s()
        .ok()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::STARTING_BID;

    fn sample_meme() -> Meme {
        let now = Utc::now();
        Meme {
            id: Uuid::new_v4(),
            title: "Doge2077".to_string(),
            image_url: "https://i.imgflip.com/1bij.jpg".to_string(),
            tags: vec!["doge".to_string(), "cyber".to_string()],
            ai_caption: "Such future".to_string(),
            ai_vibe: "Neon Shiba".to_string(),
            upvotes: 3,
            current_bid: STARTING_BID,
            owner_id: "NeoSynth".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn meme_survives_item_conversion() {
        let meme = sample_meme();
        let parsed = item_to_meme(&meme_to_item(&meme)).expect("item should parse back");
        assert_eq!(parsed.id, meme.id);
        assert_eq!(parsed.title, meme.title);
        assert_eq!(parsed.tags, meme.tags);
        assert_eq!(parsed.upvotes, meme.upvotes);
        assert_eq!(parsed.current_bid, meme.current_bid);
        assert_eq!(parsed.created_at, meme.created_at);
    }

    #[test]
    fn item_missing_field_is_rejected() {
        let meme = sample_meme();
        let mut item = meme_to_item(&meme);
        item.remove("upvotes");
        assert!(item_to_meme(&item).is_none());
    }

    #[test]
    fn item_with_bad_number_is_rejected() {
        let meme = sample_meme();
        let mut item = meme_to_item(&meme);
        item.insert(
            "current_bid".to_string(),
            AttributeValue::N("not-a-number".to_string()),
        );
        assert!(item_to_meme(&item).is_none());
    }

    #[test]
    fn bid_item_carries_ledger_key() {
        let bid = Bid {
            id: Uuid::new_v4(),
            meme_id: Uuid::new_v4(),
            user_id: "GlitchQueen".to_string(),
            amount: 150,
            created_at: Utc::now(),
        };
        let item = bid_to_item(&bid);
        assert_eq!(
            item.get("bid_id").and_then(|v| v.as_s().ok()),
            Some(&bid.id.to_string())
        );
        assert_eq!(item.get("amount").and_then(|v| v.as_n().ok()), Some(&"150".to_string()));
    }
}
