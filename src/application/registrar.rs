use crate::identity::{EnrolledIdentity, Role, ADMIN_USER};
use crate::storage::IdentityRepository;

use super::LedgerError;

/// Enrolls users into the local wallet and resolves callers.
pub struct Registrar {
    repo: IdentityRepository,
    msp_id: String,
}

impl Registrar {
    pub fn new(repo: IdentityRepository, msp_id: impl Into<String>) -> Self {
        Self {
            repo,
            msp_id: msp_id.into(),
        }
    }

    /// Enroll the `admin` registrar. Returns the existing identity if it is
    /// already enrolled.
    pub async fn enroll_admin(&self) -> Result<EnrolledIdentity, LedgerError> {
        if let Some(admin) = self.repo.get_identity(ADMIN_USER).await? {
            return Ok(admin);
        }

        let admin = EnrolledIdentity::new(ADMIN_USER, Role::Admin, &self.msp_id);
        self.repo.save_identity(&admin).await?;
        tracing::info!(msp_id = %self.msp_id, "admin enrolled");
        Ok(admin)
    }

    /// Register and enroll a new user. Requires the admin to be enrolled.
    pub async fn register_user(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<EnrolledIdentity, LedgerError> {
        if user_id.trim().is_empty() {
            return Err(LedgerError::InvalidArgument(
                "username must not be empty".to_string(),
            ));
        }
        if role == Role::Admin {
            return Err(LedgerError::InvalidArgument(
                "role must be client or employee".to_string(),
            ));
        }

        if self.repo.get_identity(user_id).await?.is_some() {
            return Err(LedgerError::IdentityAlreadyExists(user_id.to_string()));
        }
        if self.repo.get_identity(ADMIN_USER).await?.is_none() {
            return Err(LedgerError::AdminNotEnrolled);
        }

        let identity = EnrolledIdentity::new(user_id, role, &self.msp_id);
        self.repo.save_identity(&identity).await?;
        tracing::info!(user_id, %role, "user enrolled");
        Ok(identity)
    }

    /// Look up the identity a command should run as.
    pub async fn resolve(&self, user_id: &str) -> Result<EnrolledIdentity, LedgerError> {
        self.repo
            .get_identity(user_id)
            .await?
            .ok_or_else(|| LedgerError::UnknownIdentity(user_id.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<EnrolledIdentity>, LedgerError> {
        Ok(self.repo.list_identities().await?)
    }
}
