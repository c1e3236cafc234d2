/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::activity::{ActivityRecord, NewActivity};
use crate::store::SocialStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ledger write plus optional fan-out into the target user's inbox.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn SocialStore>,
}

impl Notifier {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    /// Persists `activity` and, when `notify` is set and the target is not the
    /// actor, appends the new id to `target_owner_id`'s inbox.
    ///
    /// Returns `None` when the write itself failed. A failed inbox append is
    /// logged and otherwise ignored; the written record stands.
    pub async fn trigger(
        &self,
        activity: NewActivity,
        target_owner_id: &str,
        notify: bool,
    ) -> Option<ActivityRecord> {
        let kind = activity.kind;
        let record = match self.store.insert_activity(activity).await {
            Ok(r) => r,
            Err(e) => {
                warn!(%kind, target = target_owner_id, "activity write failed: {e:#}");
                return None;
            }
        };

        if notify && target_owner_id != record.actor_id {
            match self.store.append_notification(target_owner_id, &record.id).await {
                Ok(()) => debug!(activity_id = %record.id, user = target_owner_id, "notification appended"),
                Err(e) => warn!(
                    activity_id = %record.id,
                    user = target_owner_id,
                    "notification fan-out failed: {e:#}"
                ),
            }
        }
        Some(record)
    }
}
