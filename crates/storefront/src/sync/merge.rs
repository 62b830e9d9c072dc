//! Folding guest entries into a user's remote rows at login.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bazaar_core::UserName;
use serde::Serialize;
use tracing::instrument;

use super::kind::{CollectionKind, MergeAction};
use super::snapshot::{SnapshotStore, save_entries};
use crate::backend::{BackendError, RemoteRow, RemoteStore};

/// What happens to a guest entry whose remote write failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Clear the snapshot regardless; the failed entry is lost.
    #[default]
    DropFailed,
    /// Keep failed entries in the snapshot so the next load retries them.
    RetainFailed,
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::DropFailed),
            "retain" => Ok(Self::RetainFailed),
            other => Err(format!("expected 'drop' or 'retain', got '{other}'")),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DropFailed => "drop",
            Self::RetainFailed => "retain",
        })
    }
}

/// Counts from one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// New rows created.
    pub inserted: usize,
    /// Existing rows whose quantity grew.
    pub updated: usize,
    /// Entries already covered by a remote row.
    pub skipped: usize,
    /// Entries whose write failed.
    pub failed: usize,
    /// Failed entries kept in the snapshot for a retry.
    pub retained: usize,
}

impl MergeReport {
    /// Entries that were neither merged nor kept.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.failed - self.retained
    }
}

/// Result of one applied [`MergeAction`].
#[derive(Debug)]
pub(crate) enum Applied {
    Inserted(RemoteRow),
    Updated(RemoteRow),
    Skipped,
}

/// Runs merges against a remote store.
#[derive(Clone)]
pub struct MergeEngine {
    remote: Arc<dyn RemoteStore>,
    policy: MergePolicy,
}

impl MergeEngine {
    /// Create an engine.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>, policy: MergePolicy) -> Self {
        Self { remote, policy }
    }

    /// Fold `entries` into `user`'s rows, then clear the guest snapshot.
    ///
    /// Entries are written one at a time against a single fetch of the
    /// user's rows, which is kept current as writes succeed, so repeated
    /// guest entries for one product accumulate. No write is retried. The
    /// snapshot is cleared after every entry has been attempted; with
    /// [`MergePolicy::RetainFailed`] it is rewritten with the failed entries
    /// instead.
    #[instrument(skip_all, fields(table = %K::TABLE, user = %user, entries = entries.len()))]
    pub async fn merge_guest_into_remote<K: CollectionKind>(
        &self,
        user: &UserName,
        entries: Vec<K::Entry>,
        snapshots: &dyn SnapshotStore,
    ) -> MergeReport {
        let mut report = MergeReport::default();
        let mut failed = Vec::new();

        if !entries.is_empty() {
            match self.remote.get_rows(K::TABLE, user).await {
                Ok(mut rows) => {
                    for entry in entries {
                        let product_id = K::product_id(&entry);
                        let index = rows.iter().position(|r| r.product_id == product_id);

                        match self
                            .apply::<K>(user, index.and_then(|i| rows.get(i)), &entry)
                            .await
                        {
                            Ok(Applied::Inserted(row)) => {
                                report.inserted += 1;
                                rows.push(row);
                            }
                            Ok(Applied::Updated(row)) => {
                                report.updated += 1;
                                if let Some(slot) = index.and_then(|i| rows.get_mut(i)) {
                                    *slot = row;
                                }
                            }
                            Ok(Applied::Skipped) => report.skipped += 1,
                            Err(e) => {
                                tracing::warn!(%product_id, error = %e, "Merge write failed");
                                report.failed += 1;
                                failed.push(entry);
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not fetch remote rows, no guest entries merged");
                    report.failed = entries.len();
                    failed = entries;
                }
            }
        }

        let cleared = match self.policy {
            MergePolicy::RetainFailed if !failed.is_empty() => {
                report.retained = failed.len();
                save_entries(snapshots, K::SLOT, &failed).await
            }
            _ => snapshots.remove(K::SLOT).await,
        };
        if let Err(e) = cleared {
            tracing::warn!(slot = %K::SLOT, error = %e, "Failed to update guest snapshot after merge");
        }

        tracing::info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            retained = report.retained,
            "Merged guest entries"
        );

        report
    }

    /// Reconcile one entry against the row it shares a product with.
    pub(crate) async fn apply<K: CollectionKind>(
        &self,
        user: &UserName,
        existing: Option<&RemoteRow>,
        entry: &K::Entry,
    ) -> Result<Applied, BackendError> {
        match K::merge_action(user, existing, entry) {
            MergeAction::Insert(row) => self
                .remote
                .insert_row(K::TABLE, &row)
                .await
                .map(Applied::Inserted),
            MergeAction::Update(quantity) => self
                .remote
                .update_row_quantity(K::TABLE, user, K::product_id(entry), quantity)
                .await
                .map(Applied::Updated),
            MergeAction::Skip => Ok(Applied::Skipped),
        }
    }
}

impl fmt::Debug for MergeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeEngine")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
