//! Staff directory and credential checks.
//!
//! Credentials are compared in plaintext; accounts live only for the
//! lifetime of the process.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub display_name: String,
    pub role: Role,
}

impl StaffMember {
    pub fn new(username: &str, password: &str, display_name: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password: password.to_string(),
            display_name: display_name.to_string(),
            role,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("This account cannot {0}")]
    NotPermitted(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    members: Vec<StaffMember>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two accounts every fresh install starts with.
    pub fn with_defaults() -> Self {
        let mut directory = Self::new();
        directory.members.push(StaffMember {
            id: "1".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            display_name: "Administrator".to_string(),
            role: Role::Admin,
        });
        directory.members.push(StaffMember {
            id: "2".to_string(),
            username: "staff".to_string(),
            password: "staff".to_string(),
            display_name: "Alex Chen".to_string(),
            role: Role::Staff,
        });
        directory
    }

    pub fn login(&self, username: &str, password: &str) -> Result<StaffMember, AccountError> {
        match self
            .members
            .iter()
            .find(|m| m.username == username && m.password == password)
        {
            Some(member) => {
                info!("{} logged in as {}", member.display_name, member.role.as_str());
                Ok(member.clone())
            }
            None => {
                warn!("Rejected login for username '{}'", username);
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    /// Log in and require `role`. `action` names what was attempted, for the
    /// error message.
    pub fn authorize(
        &self,
        username: &str,
        password: &str,
        role: Role,
        action: &'static str,
    ) -> Result<StaffMember, AccountError> {
        let member = self.login(username, password)?;
        if member.role != role {
            warn!(
                "{} ({}) may not {}",
                member.username,
                member.role.as_str(),
                action
            );
            return Err(AccountError::NotPermitted(action));
        }
        Ok(member)
    }

    /// Self-registration always yields an administrator.
    pub fn register_admin(
        &mut self,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> Result<StaffMember, AccountError> {
        self.insert(username, password, display_name, Role::Admin)
    }

    pub fn add_staff(
        &mut self,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> Result<StaffMember, AccountError> {
        self.insert(username, password, display_name, Role::Staff)
    }

    fn insert(
        &mut self,
        username: &str,
        password: &str,
        display_name: &str,
        role: Role,
    ) -> Result<StaffMember, AccountError> {
        if username.is_empty() || password.is_empty() || display_name.is_empty() {
            return Err(AccountError::MissingFields);
        }
        if self.members.iter().any(|m| m.username == username) {
            return Err(AccountError::UsernameTaken);
        }

        let member = StaffMember::new(username, password, display_name, role);
        info!(
            "Registered {} '{}' ({})",
            role.as_str(),
            member.username,
            member.display_name
        );
        self.members.push(member.clone());
        Ok(member)
    }

    /// Staff-role members in registration order.
    pub fn staff(&self) -> Vec<StaffMember> {
        self.members
            .iter()
            .filter(|m| m.role == Role::Staff)
            .cloned()
            .collect()
    }
}
