use crate::models::{Channel, FeedDocument, FeedItem};
use time::OffsetDateTime;

/// Orders items newest first and applies the item cap.
///
/// The sort is stable: items published at the same instant keep the order
/// the scan produced them in.
pub fn assemble(channel: Channel, mut items: Vec<FeedItem>, max_items: Option<usize>) -> FeedDocument {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    if let Some(max_items) = max_items {
        items.truncate(max_items);
    }
    FeedDocument {
        channel,
        items,
        generated_at: OffsetDateTime::now_utc(),
    }
}
