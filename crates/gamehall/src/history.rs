//! Match history: the store finished games are saved to and queried from.
//!
//! Saving results is an external concern. The coordinator never calls a
//! [`MatchStore`]; a front end that wants a scoreboard records a match
//! once a game ends and asks for a page of results later.
//!
//! [`InMemoryMatchStore`] keeps everything in process memory and is what
//! the server uses when no durable store is wired in.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Identifier the store assigns to a saved match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match-{}", self.0)
    }
}

/// A finished game, as submitted for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch {
    /// Game variant, e.g. `"classic"`.
    pub mode: String,
    /// Everyone who played, in seat order.
    pub usernames: Vec<String>,
    /// `None` for a draw.
    pub winner_name: Option<String>,
    /// Final pick per username.
    #[serde(default)]
    pub picks: BTreeMap<String, String>,
    /// Whose history this entry belongs to.
    pub owner_name: String,
    pub played_at: DateTime<Utc>,
}

/// A saved match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    #[serde(flatten)]
    pub game: NewMatch,
}

/// Filter and window for [`MatchStore::query_matches`].
///
/// Unset filters match everything. Results are newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchQuery {
    pub owner_name: Option<String>,
    /// Only matches this user played in; also the subject of the tallies.
    pub username: Option<String>,
    pub mode: Option<String>,
    pub limit: usize,
    pub skip: usize,
}

impl Default for MatchQuery {
    fn default() -> Self {
        Self {
            owner_name: None,
            username: None,
            mode: None,
            limit: 20,
            skip: 0,
        }
    }
}

/// One page of results plus tallies over the whole filtered set.
///
/// `wins` and `losses` are counted from the point of view of
/// [`MatchQuery::username`], falling back to [`MatchQuery::owner_name`];
/// with neither set they stay zero. `draws` counts matches with no winner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPage {
    pub records: Vec<MatchRecord>,
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

/// Errors a match store can report.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The submitted match is malformed.
    #[error("invalid match: {0}")]
    InvalidMatch(String),
}

/// Persistence for finished matches.
pub trait MatchStore: Send + Sync + 'static {
    /// Validates and saves `game`, returning its new identifier.
    fn create_match(
        &self,
        game: NewMatch,
    ) -> impl Future<Output = Result<MatchId, HistoryError>> + Send;

    /// Returns the page of matches selected by `query`.
    fn query_matches(
        &self,
        query: &MatchQuery,
    ) -> impl Future<Output = Result<MatchPage, HistoryError>> + Send;
}

fn validate(game: &NewMatch) -> Result<(), HistoryError> {
    if game.usernames.is_empty() {
        return Err(HistoryError::InvalidMatch("no players".into()));
    }
    if game.owner_name.is_empty() {
        return Err(HistoryError::InvalidMatch("missing owner name".into()));
    }
    match &game.winner_name {
        Some(winner) if !game.usernames.contains(winner) => Err(
            HistoryError::InvalidMatch(format!("winner {winner} did not play")),
        ),
        _ => Ok(()),
    }
}

impl MatchQuery {
    fn matches(&self, game: &NewMatch) -> bool {
        self.owner_name.as_ref().is_none_or(|o| *o == game.owner_name)
            && self.mode.as_ref().is_none_or(|m| *m == game.mode)
            && self
                .username
                .as_ref()
                .is_none_or(|u| game.usernames.contains(u))
    }

    fn subject(&self) -> Option<&str> {
        self.username.as_deref().or(self.owner_name.as_deref())
    }
}

/// A [`MatchStore`] held in memory. Contents are lost on restart.
#[derive(Debug)]
pub struct InMemoryMatchStore {
    records: RwLock<Vec<MatchRecord>>,
    next_id: AtomicU64,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryMatchStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchStore for InMemoryMatchStore {
    async fn create_match(&self, game: NewMatch) -> Result<MatchId, HistoryError> {
        validate(&game)?;
        let id = MatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, mode = %game.mode, owner = %game.owner_name, "match saved");
        self.records.write().await.push(MatchRecord { id, game });
        Ok(id)
    }

    async fn query_matches(&self, query: &MatchQuery) -> Result<MatchPage, HistoryError> {
        let records = self.records.read().await;
        let mut selected: Vec<&MatchRecord> =
            records.iter().filter(|r| query.matches(&r.game)).collect();
        selected.sort_by(|a, b| {
            b.game
                .played_at
                .cmp(&a.game.played_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let mut page = MatchPage {
            total: selected.len(),
            ..MatchPage::default()
        };
        let subject = query.subject();
        for record in &selected {
            match (&record.game.winner_name, subject) {
                (None, _) => page.draws += 1,
                (Some(winner), Some(who)) if winner == who => page.wins += 1,
                (Some(_), Some(who)) if record.game.usernames.iter().any(|u| u == who) => {
                    page.losses += 1
                }
                _ => {}
            }
        }

        page.records = selected
            .into_iter()
            .skip(query.skip)
            .take(query.limit)
            .cloned()
            .collect();
        Ok(page)
    }
}
