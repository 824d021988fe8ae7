use tokio::sync::watch;

use crate::db;
use crate::email::blocklist;
use crate::models::ScheduledEmail;
use crate::state::SharedState;

/// Outcome counts of one dispatch cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub blocked: usize,
    pub failed: usize,
}

/// Spawn the dispatcher loop on the current runtime. It runs one cycle per
/// configured interval until `shutdown` flips to true.
pub fn spawn(state: SharedState, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(state, shutdown))
}

async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(state.config.dispatch_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(
        "Email dispatcher started (every {}s)",
        state.config.dispatch_interval.as_secs()
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        if *shutdown.borrow() {
            break;
        }

        match dispatch_due(&state).await {
            Ok(report) if report != DispatchReport::default() => {
                tracing::info!(
                    sent = report.sent,
                    blocked = report.blocked,
                    failed = report.failed,
                    "Dispatch cycle finished"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Dispatch cycle failed: {e}"),
        }
    }

    tracing::info!("Email dispatcher stopped");
}

enum Outcome {
    Sent,
    Blocked,
    Failed,
}

/// Run a single cycle: deliver every due, unsent email once.
///
/// Blocked recipients are marked sent without delivery. A failed delivery
/// bumps the attempt counter and the row stays due for the next cycle until
/// it runs out of attempts. A database error on one row is logged, counted
/// as failed, and the cycle moves on.
pub async fn dispatch_due(state: &SharedState) -> Result<DispatchReport, sqlx::Error> {
    let due = db::scheduled_emails::list_due(&state.pool, state.config.dispatch_max_attempts).await?;
    let mut report = DispatchReport::default();

    for email in due {
        match dispatch_one(state, &email).await {
            Ok(Outcome::Sent) => report.sent += 1,
            Ok(Outcome::Blocked) => report.blocked += 1,
            Ok(Outcome::Failed) => report.failed += 1,
            Err(e) => {
                tracing::error!(id = %email.id, "Failed to record dispatch result: {e}");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

async fn dispatch_one(state: &SharedState, email: &ScheduledEmail) -> Result<Outcome, sqlx::Error> {
    if blocklist::is_blocked(&email.recipient) {
        tracing::warn!(id = %email.id, recipient = %email.recipient, "Recipient blocked, marking sent");
        db::scheduled_emails::mark_sent(&state.pool, email.id).await?;
        return Ok(Outcome::Blocked);
    }

    match state
        .mailer
        .send(&email.recipient, &email.subject, &email.body)
        .await
    {
        Ok(()) => {
            db::scheduled_emails::mark_sent(&state.pool, email.id).await?;
            Ok(Outcome::Sent)
        }
        Err(e) => {
            tracing::error!(
                id = %email.id,
                attempt = email.attempts + 1,
                "Scheduled email delivery failed: {e}"
            );
            db::scheduled_emails::record_failure(&state.pool, email.id, &e).await?;
            Ok(Outcome::Failed)
        }
    }
}
