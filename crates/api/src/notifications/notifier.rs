//! Post-commit side effects for submission writes.
//!
//! Nothing here is awaited by a request: every email and publish is a
//! detached job on the [`DispatcherHandle`], so a failure is logged and
//! dead-lettered but never reaches the caller.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use intake_core::realtime::SubmissionEvent;
use intake_core::submission::SubmissionStatus;
use intake_core::templating::{
    TEMPLATE_SUBMISSION_APPROVED, TEMPLATE_SUBMISSION_CONFIRMATION, TEMPLATE_SUBMISSION_REJECTED,
};
use intake_core::types::DbId;
use intake_db::models::submission::SubmissionDetail;
use intake_db::repositories::ReviewRepo;
use intake_db::DbPool;
use intake_events::{DispatcherHandle, EmailDelivery, EventPublisher};

/// Publishes submission events and sends artist emails after a write commits.
#[derive(Clone)]
pub struct SubmissionNotifier {
    pool: DbPool,
    publisher: Arc<dyn EventPublisher>,
    email: Option<Arc<EmailDelivery>>,
    dispatcher: DispatcherHandle,
}

impl SubmissionNotifier {
    pub fn new(
        pool: DbPool,
        publisher: Arc<dyn EventPublisher>,
        email: Option<Arc<EmailDelivery>>,
        dispatcher: DispatcherHandle,
    ) -> Self {
        Self {
            pool,
            publisher,
            email,
            dispatcher,
        }
    }

    /// A submission was accepted: confirm to the artist, tell the admins.
    pub fn submission_created(&self, submission: &SubmissionDetail) {
        let id = submission.id;

        if let Some(email) = self.email.clone() {
            let pool = self.pool.clone();
            let to = submission.artist.email.clone();
            let vars = HashMap::from([
                ("artist_name", submission.artist.name.clone()),
                ("submission_id", id.to_string()),
            ]);
            self.dispatcher
                .dispatch(format!("email:confirmation:{id}"), async move {
                    email
                        .send_template(&pool, TEMPLATE_SUBMISSION_CONFIRMATION, &to, &vars)
                        .await
                        .context("confirmation email")
                });
        } else {
            tracing::debug!(
                submission_id = id,
                "SMTP not configured, skipping confirmation email"
            );
        }

        self.publish(SubmissionEvent::new_submission(id));
    }

    /// A submission's status was changed by staff.
    ///
    /// Approvals and rejections also email the artist, using the latest
    /// review for grade and feedback.
    pub fn status_changed(&self, submission: &SubmissionDetail) {
        let id = submission.id;
        let status = submission.status;

        self.publish(SubmissionEvent::submission_updated(id, status));

        if !status.is_decision() {
            return;
        }
        let Some(email) = self.email.clone() else {
            tracing::debug!(
                submission_id = id,
                %status,
                "SMTP not configured, skipping decision email"
            );
            return;
        };

        let pool = self.pool.clone();
        let artist_name = submission.artist.name.clone();
        let to = submission.artist.email.clone();
        self.dispatcher
            .dispatch(format!("email:decision:{id}"), async move {
                let Some((name, vars)) = decision_template(&pool, id, status, artist_name).await?
                else {
                    return Ok(());
                };
                email
                    .send_template(&pool, name, &to, &vars)
                    .await
                    .context("decision email")
            });
    }

    fn publish(&self, event: SubmissionEvent) {
        let publisher = Arc::clone(&self.publisher);
        let label = format!("publish:{}:{}", event.name(), event.submission_id());
        self.dispatcher.dispatch(label, async move {
            publisher.publish(event).await.context("event publish")
        });
    }
}

type TemplateVars = HashMap<&'static str, String>;

/// Pick the template and variables for a decision email.
///
/// `None` means no email should go out: an approval needs a graded review.
async fn decision_template(
    pool: &DbPool,
    submission_id: DbId,
    status: SubmissionStatus,
    artist_name: String,
) -> anyhow::Result<Option<(&'static str, TemplateVars)>> {
    let review = ReviewRepo::latest_for_submission(pool, submission_id)
        .await
        .context("latest review lookup")?;
    let feedback = review
        .as_ref()
        .map(|r| r.feedback.clone())
        .unwrap_or_default();

    match status {
        SubmissionStatus::Approved => {
            let Some(grade) = review.as_ref().and_then(|r| r.grade) else {
                tracing::warn!(
                    submission_id,
                    "Approved without a graded review, skipping email"
                );
                return Ok(None);
            };
            Ok(Some((
                TEMPLATE_SUBMISSION_APPROVED,
                HashMap::from([
                    ("artist_name", artist_name),
                    ("grade", grade.to_string()),
                    ("feedback", feedback),
                ]),
            )))
        }
        SubmissionStatus::Rejected => Ok(Some((
            TEMPLATE_SUBMISSION_REJECTED,
            HashMap::from([("artist_name", artist_name), ("feedback", feedback)]),
        ))),
        SubmissionStatus::Pending | SubmissionStatus::InReview => Ok(None),
    }
}
