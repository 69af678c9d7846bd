//! User registration — the producer for the email queue.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use filedock_core::error::AppError;
use filedock_core::result::AppResult;
use filedock_database::repositories::user::UserRepository;
use filedock_entity::job::QueueName;
use filedock_entity::user::{CreateUser, User};

use crate::broker::JobBroker;
use crate::password::PasswordHasher;

/// Handles user account creation.
#[derive(Debug, Clone)]
pub struct UserService {
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Job broker for the welcome-email queue.
    broker: Arc<dyn JobBroker>,
}

/// Data for registering a new user.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegisterRequest {
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        user_repo: Arc<UserRepository>,
        hasher: Arc<PasswordHasher>,
        broker: Arc<dyn JobBroker>,
    ) -> Self {
        Self {
            user_repo,
            hasher,
            broker,
        }
    }

    /// Registers a new user and enqueues the welcome email.
    ///
    /// The enqueue is fire-and-forget relative to handler execution: the
    /// call returns as soon as the broker accepts the job, and an enqueue
    /// failure fails the registration request like any other error.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<User> {
        let email = req.email.trim();
        if email.is_empty() {
            return Err(AppError::validation("Email is required"));
        }
        if !email.contains('@') {
            return Err(AppError::validation("Invalid email format"));
        }
        if req.password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }

        if self.user_repo.find_by_email(email).await?.is_some() {
            return Err(AppError::conflict("Email is already registered"));
        }

        let password_hash = self.hasher.hash_password(&req.password)?;

        let user = self
            .user_repo
            .create(&CreateUser {
                email: email.to_string(),
                password_hash,
            })
            .await?;

        let job_id = self
            .broker
            .enqueue(QueueName::Email, json!({ "user_id": user.id.to_string() }))
            .await?;

        info!(user_id = %user.id, %job_id, "Registered user, welcome email enqueued");

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use uuid::Uuid;

    use async_trait::async_trait;

    #[derive(Debug, Default)]
    struct RecordingBroker {
        enqueued: Mutex<Vec<(QueueName, serde_json::Value)>>,
    }

    #[async_trait]
    impl JobBroker for RecordingBroker {
        async fn enqueue(
            &self,
            queue: QueueName,
            payload: serde_json::Value,
        ) -> AppResult<Uuid> {
            self.enqueued.lock().unwrap().push((queue, payload));
            Ok(Uuid::new_v4())
        }
    }

    fn make_service(broker: Arc<RecordingBroker>) -> UserService {
        // connect_lazy never opens a connection; validation failures must
        // return before any query is issued.
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        UserService::new(
            Arc::new(UserRepository::new(pool)),
            Arc::new(PasswordHasher::new()),
            broker,
        )
    }

    #[tokio::test]
    async fn test_register_rejects_empty_email_before_enqueue() {
        let broker = Arc::new(RecordingBroker::default());
        let service = make_service(Arc::clone(&broker));

        let err = service
            .register(RegisterRequest {
                email: "  ".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, filedock_core::error::ErrorKind::Validation);
        assert!(broker.enqueued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_email() {
        let broker = Arc::new(RecordingBroker::default());
        let service = make_service(Arc::clone(&broker));

        let err = service
            .register(RegisterRequest {
                email: "not-an-address".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, filedock_core::error::ErrorKind::Validation);
        assert!(broker.enqueued.lock().unwrap().is_empty());
    }
}
