//! Auth Handler
//!
//! Login doubles as signup: an unknown username is provisioned with the
//! starting balance, a known one must present the matching password.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{CredentialHasher, JwtSigner};
use crate::domain::{AuthError, Employee};
use crate::repository::{EmployeeRepository, Staged, Store, UnitOfWork};

/// Outcome of a successful `authorize`
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub employee_id: Uuid,
    /// `true` when this call created the employee
    pub provisioned: bool,
}

/// Handler for login / implicit signup
#[derive(Clone)]
pub struct AuthHandler<S> {
    uow: UnitOfWork<S>,
    hasher: Arc<dyn CredentialHasher>,
    signer: Arc<JwtSigner>,
}

impl<S: Store> AuthHandler<S> {
    pub fn new(
        uow: UnitOfWork<S>,
        hasher: Arc<dyn CredentialHasher>,
        signer: Arc<JwtSigner>,
    ) -> Self {
        Self {
            uow,
            hasher,
            signer,
        }
    }

    /// Authenticate `username`, creating the employee on first login, and
    /// mint a session token.
    pub async fn authorize(&self, username: &str, password: &str) -> Result<AuthResult, AuthError> {
        let (employee, provisioned) = self
            .uow
            .run(self.stage_authorize(username, password))
            .await?;

        // Only committed employees get a token.
        let token = self.signer.issue(&employee)?;

        if provisioned {
            tracing::info!(employee_id = %employee.id, username = %username, "Employee provisioned");
        } else {
            tracing::debug!(employee_id = %employee.id, "Employee authenticated");
        }

        Ok(AuthResult {
            token,
            employee_id: employee.id,
            provisioned,
        })
    }

    async fn stage_authorize(
        &self,
        username: &str,
        password: &str,
    ) -> Staged<S::Session, (Employee, bool), AuthError> {
        let mut session = self.uow.begin().await?;
        let outcome = Self::apply(&mut session, &self.hasher, username, password).await;
        Ok((session, outcome))
    }

    async fn apply(
        session: &mut S::Session,
        hasher: &Arc<dyn CredentialHasher>,
        username: &str,
        password: &str,
    ) -> Result<(Employee, bool), AuthError> {
        match session.find_employee_by_username(username).await? {
            Some(employee) => {
                let hasher = Arc::clone(hasher);
                let stored = employee.password_hash.clone();
                let candidate = password.to_string();
                let matches =
                    tokio::task::spawn_blocking(move || hasher.verify(&stored, &candidate))
                        .await
                        .map_err(|e| AuthError::Hashing(e.to_string()))?;

                if !matches {
                    tracing::info!(username = %username, "Rejected login: invalid credentials");
                    return Err(AuthError::InvalidCredentials);
                }
                Ok((employee, false))
            }
            None => {
                let hasher = Arc::clone(hasher);
                let plaintext = password.to_string();
                let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
                    .await
                    .map_err(|e| AuthError::Hashing(e.to_string()))??;

                let employee = Employee::new(username, password_hash);
                // A concurrent first login may have inserted the same
                // username since the lookup; that surfaces as EmployeeExists.
                session.save_employee(&employee).await?;
                Ok((employee, true))
            }
        }
    }
}
