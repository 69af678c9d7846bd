//! Welcome email job handler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing;
use uuid::Uuid;

use filedock_core::result::AppResult;
use filedock_database::repositories::user::UserRepository;
use filedock_entity::job::{Job, QueueName};
use filedock_entity::user::User;
use filedock_mailer::SmtpMailer;

use crate::executor::{HandlerError, JobHandler};
use crate::jobs::require_field;

/// Fixed welcome message sent once per successful registration.
const WELCOME_SUBJECT: &str = "Welcome to Filedock";
const WELCOME_BODY: &str = "<div>\
<h3>Hello,</h3>\
Welcome to <strong>Filedock</strong>, a simple file management service. \
Your account is ready; upload a file to get started. \
We hope it meets your needs.\
</div>";

/// Trait for loading user records — decouples the handler from the
/// database crate so it can run against fakes.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// Load a user record by identifier.
    async fn find_user(&self, user_id: &str) -> AppResult<Option<User>>;
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_user(&self, user_id: &str) -> AppResult<Option<User>> {
        // Payload identifiers are opaque; one that does not parse cannot
        // match any stored record.
        let Ok(user_id) = Uuid::parse_str(user_id) else {
            return Ok(None);
        };
        self.find_by_id(user_id).await
    }
}

/// Trait for dispatching mail — decouples the handler from the mailer crate.
#[async_trait]
pub trait MailTransport: Send + Sync + std::fmt::Debug {
    /// Send an HTML message to a single recipient.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()>;
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
        SmtpMailer::send(self, to, subject, html_body).await
    }
}

/// Handles welcome email jobs.
#[derive(Debug)]
pub struct EmailJobHandler {
    /// User record store.
    users: Arc<dyn UserStore>,
    /// Mail transport.
    mailer: Arc<dyn MailTransport>,
}

impl EmailJobHandler {
    /// Create a new email job handler.
    pub fn new(users: Arc<dyn UserStore>, mailer: Arc<dyn MailTransport>) -> Self {
        Self { users, mailer }
    }
}

#[async_trait]
impl JobHandler for EmailJobHandler {
    fn queue(&self) -> QueueName {
        QueueName::Email
    }

    async fn execute(&self, job: &Job) -> Result<(), HandlerError> {
        let user_id = require_field(&job.payload, "user_id")?;

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(HandlerError::NotFound("user"))?;

        tracing::info!(user_id = %user.id, "Dispatching welcome email");

        self.mailer
            .send(&user.email, WELCOME_SUBJECT, WELCOME_BODY)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;
    use filedock_core::error::AppError;
    use filedock_entity::job::JobStatus;
    use serde_json::json;

    #[derive(Debug)]
    struct StaticUserStore {
        user: Option<User>,
    }

    #[async_trait]
    impl UserStore for StaticUserStore {
        async fn find_user(&self, _user_id: &str) -> AppResult<Option<User>> {
            Ok(self.user.clone())
        }
    }

    #[derive(Debug, Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl MailTransport for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
            if self.fail {
                return Err(AppError::external_service("relay rejected message"));
            }
            self.sent.lock().unwrap().push((
                to.to_string(),
                subject.to_string(),
                html_body.to_string(),
            ));
            Ok(())
        }
    }

    fn make_user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "$argon2id$test".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_job(payload: serde_json::Value) -> Job {
        Job {
            id: Uuid::new_v4(),
            queue: QueueName::Email,
            payload,
            status: JobStatus::Running,
            attempts: 1,
            max_attempts: 3,
            error_message: None,
            scheduled_at: None,
            started_at: Some(Utc::now()),
            completed_at: None,
            worker_id: Some("test-worker".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_handler(
        user: Option<User>,
        fail: bool,
    ) -> (Arc<RecordingMailer>, EmailJobHandler) {
        let mailer = Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
            fail,
        });
        let handler = EmailJobHandler::new(
            Arc::new(StaticUserStore { user }),
            Arc::clone(&mailer) as Arc<dyn MailTransport>,
        );
        (mailer, handler)
    }

    #[tokio::test]
    async fn test_missing_user_id_never_touches_transport() {
        let (mailer, handler) = make_handler(Some(make_user("a@b.com")), false);

        let err = handler.execute(&make_job(json!({}))).await.unwrap_err();

        assert!(matches!(err, HandlerError::MissingField("user_id")));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_absent_user_is_not_found() {
        let (mailer, handler) = make_handler(None, false);

        let err = handler
            .execute(&make_job(json!({ "user_id": "u1" })))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::NotFound("user")));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sends_fixed_welcome_message_exactly_once() {
        let (mailer, handler) = make_handler(Some(make_user("a@b.com")), false);

        handler
            .execute(&make_job(json!({ "user_id": "u1" })))
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (to, subject, body) = &sent[0];
        assert_eq!(to, "a@b.com");
        assert_eq!(subject, WELCOME_SUBJECT);
        assert_eq!(body, WELCOME_BODY);
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_as_processing_error() {
        let (_mailer, handler) = make_handler(Some(make_user("a@b.com")), true);

        let err = handler
            .execute(&make_job(json!({ "user_id": "u1" })))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::Processing(_)));
    }
}
