use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::Record;

/// Aggregate activity of one author
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuthorStats {
    #[serde(rename = "posts")]
    pub post_count: u64,
    #[serde(rename = "upvotes")]
    pub upvote_count: u64,
    #[serde(rename = "downvotes")]
    pub downvote_count: u64,
}

/// One leaderboard row, serialized as `[author, stats]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry(pub String, pub AuthorStats);

impl LeaderboardEntry {
    pub fn author(&self) -> &str {
        &self.0
    }

    pub fn stats(&self) -> &AuthorStats {
        &self.1
    }
}

/// Per-author statistics over posts and replies together.
///
/// Ordered by post count, highest first; authors with equal counts are ordered by name.
/// Records without an author are skipped.
pub fn compute_stats<'a>(
    posts: impl IntoIterator<Item = &'a Record>,
    replies: impl IntoIterator<Item = &'a Record>,
) -> Vec<LeaderboardEntry> {
    let mut stats: BTreeMap<&str, AuthorStats> = BTreeMap::new();

    for record in posts.into_iter().chain(replies) {
        if record.author.is_empty() {
            continue;
        }

        let tally = record.tally();
        let entry = stats.entry(record.author.as_str()).or_default();
        entry.post_count += 1;
        entry.upvote_count += u64::from(tally.upvotes);
        entry.downvote_count += u64::from(tally.downvotes);
    }

    let mut board: Vec<LeaderboardEntry> = stats
        .into_iter()
        .map(|(author, stats)| LeaderboardEntry(author.to_string(), stats))
        .collect();

    board.sort_by(|a, b| {
        b.1.post_count
            .cmp(&a.1.post_count)
            .then_with(|| a.0.cmp(&b.0))
    });

    board
}

/// Most and least prolific authors as `[author, count]` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingExtremes {
    pub most_posts: Option<(String, u64)>,
    pub least_posts: Option<(String, u64)>,
}

/// First and last rows of an ordered leaderboard
pub fn posting_extremes(board: &[LeaderboardEntry]) -> PostingExtremes {
    let pair = |entry: &LeaderboardEntry| (entry.0.clone(), entry.1.post_count);

    PostingExtremes {
        most_posts: board.first().map(pair),
        least_posts: board.last().map(pair),
    }
}
