use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

/// Points for adding a facility
pub const POINTS_ADD_OBJECT: u32 = 10;
/// Points for adding a comment
pub const POINTS_ADD_COMMENT: u32 = 3;
/// Points for a first rating of a facility
pub const POINTS_ADD_RATING: u32 = 2;

/// One leaderboard row
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1 + number of authors with strictly more points
    pub rank: u32,
    pub author_id: String,
    pub author_name: String,
    pub points: u32,
}

#[derive(Clone, Debug, Default)]
struct AuthorPoints {
    author_name: String,
    points: u32,
}

/// Per-author contribution points.
#[derive(Default)]
pub(super) struct PointsLedger {
    authors: DashMap<String, AuthorPoints>,
}

impl PointsLedger {
    /// Adds `points` to `author_id`. Anonymous contributions (blank id) earn nothing.
    pub(super) fn award(&self, author_id: &str, author_name: &str, points: u32) {
        if author_id.trim().is_empty() {
            return;
        }

        let mut entry = self.authors.entry(author_id.to_string()).or_default();
        entry.points = entry.points.saturating_add(points);
        if !author_name.is_empty() {
            entry.author_name = author_name.to_string();
        }

        debug!(
            author_id = %author_id,
            awarded = points,
            total = entry.points,
            "Points awarded"
        );
    }

    pub(super) fn points(&self, author_id: &str) -> u32 {
        self.authors.get(author_id).map(|a| a.points).unwrap_or(0)
    }

    pub(super) fn rank(&self, author_id: &str) -> Option<u32> {
        let points = self.authors.get(author_id)?.points;
        let ahead = self.authors.iter().filter(|a| a.points > points).count();
        Some(ahead as u32 + 1)
    }

    /// Top `limit` authors, most points first; ties ordered by author id.
    pub(super) fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut rows: Vec<(String, AuthorPoints)> = self
            .authors
            .iter()
            .map(|a| (a.key().clone(), a.value().clone()))
            .collect();
        rows.sort_by(|a, b| b.1.points.cmp(&a.1.points).then_with(|| a.0.cmp(&b.0)));

        let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(limit.min(rows.len()));
        for (author_id, author) in rows.into_iter().take(limit) {
            let rank = match entries.last() {
                Some(prev) if prev.points == author.points => prev.rank,
                _ => entries.len() as u32 + 1,
            };
            entries.push(LeaderboardEntry {
                rank,
                author_id,
                author_name: author.author_name,
                points: author.points,
            });
        }
        entries
    }
}
