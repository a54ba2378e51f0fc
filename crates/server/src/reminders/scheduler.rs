//! The recurring reminder pass.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use glamdesk_core::MonthDay;

use super::dispatcher::{NotificationDispatcher, render, resolve_template};
use super::{ReminderError, ReminderSettings, RepeatPolicy};
use crate::clock::Clock;
use crate::crypto::FieldCipher;
use crate::delivery::DeliveryChannel;
use crate::models::ReminderCandidate;
use crate::store::Store;

/// Outcome of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    /// Month-day that was scanned.
    pub target: MonthDay,
    /// Candidates returned by the store.
    pub matched: usize,
    pub sent: usize,
    /// Already notified for this occurrence, or no usable phone.
    pub skipped: usize,
    /// Template lookup or delivery failed.
    pub failed: usize,
}

enum Outcome {
    Sent,
    Skipped,
    Failed,
}

pub struct ReminderScheduler<S, C, K> {
    store: S,
    cipher: Arc<FieldCipher>,
    dispatcher: NotificationDispatcher<C>,
    clock: K,
    settings: ReminderSettings,
}

impl<S, C, K> std::fmt::Debug for ReminderScheduler<S, C, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderScheduler")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<S, C, K> ReminderScheduler<S, C, K>
where
    S: Store,
    C: DeliveryChannel,
    K: Clock,
{
    #[must_use]
    pub const fn new(
        store: S,
        cipher: Arc<FieldCipher>,
        dispatcher: NotificationDispatcher<C>,
        clock: K,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            store,
            cipher,
            dispatcher,
            clock,
            settings,
        }
    }

    /// Run one pass as if the current time were `now`.
    ///
    /// Per-customer failures are counted in the report and never abort the
    /// pass.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::Scan`] if the initial store query fails.
    pub async fn run_pass_at(&self, now: DateTime<Utc>) -> Result<PassReport, ReminderError> {
        let occurrence = now.date_naive() + TimeDelta::days(i64::from(self.settings.lookahead_days));
        let target = MonthDay::from_date(occurrence);

        let candidates = self.store.find_customers_matching_month_day(target).await?;

        let mut report = PassReport {
            target,
            matched: candidates.len(),
            sent: 0,
            skipped: 0,
            failed: 0,
        };

        for candidate in &candidates {
            match self.notify(candidate, target, occurrence).await {
                Outcome::Sent => report.sent += 1,
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        info!(
            target = %report.target,
            matched = report.matched,
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            "Reminder pass complete"
        );
        Ok(report)
    }

    async fn notify(
        &self,
        candidate: &ReminderCandidate,
        target: MonthDay,
        occurrence: NaiveDate,
    ) -> Outcome {
        let event_type = candidate.classify(target);
        let customer_id = candidate.customer_id;

        if self.settings.repeat_policy == RepeatPolicy::OncePerOccurrence {
            match self.store.last_notified(customer_id, event_type).await {
                Ok(Some(last)) if last == occurrence => {
                    debug!(%customer_id, %event_type, "Already notified for this occurrence");
                    return Outcome::Skipped;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(%customer_id, error = %e, "Ledger lookup failed");
                    return Outcome::Failed;
                }
            }
        }

        let phone = match self.cipher.decrypt(&candidate.phone) {
            Ok(phone) if !phone.trim().is_empty() => phone,
            Ok(_) => {
                debug!(%customer_id, "Customer has no phone number");
                return Outcome::Skipped;
            }
            Err(e) => {
                warn!(%customer_id, error = %e, "Could not decrypt customer phone");
                return Outcome::Skipped;
            }
        };

        let stored = match self
            .store
            .get_template(candidate.owner_id, event_type)
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                warn!(owner_id = %candidate.owner_id, %event_type, error = %e, "Template lookup failed");
                return Outcome::Failed;
            }
        };

        let message = render(
            resolve_template(stored.as_ref()),
            &candidate.customer_name,
            &candidate.salon_name,
            event_type.label(),
        );

        if self.dispatcher.dispatch(&phone, &message).await.is_err() {
            return Outcome::Failed;
        }

        if let Err(e) = self
            .store
            .record_notified(customer_id, event_type, occurrence)
            .await
        {
            // The message went out; a later pass may send it again.
            warn!(%customer_id, %event_type, error = %e, "Could not record notification");
        }
        Outcome::Sent
    }

    /// Run passes on the configured interval until `shutdown` turns `true`
    /// or its sender is dropped.
    ///
    /// A pass already running when the signal arrives is finished first.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.settings.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(
                interval_secs = self.settings.interval.as_secs(),
                lookahead_days = self.settings.lookahead_days,
                repeat_policy = %self.settings.repeat_policy,
                "Reminder scheduler started"
            );

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_pass_at(self.clock.now()).await {
                            error!(error = %e, "Reminder pass failed");
                        }
                    }
                }
            }

            info!("Reminder scheduler stopped");
        })
    }
}
