//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Superadmin,
}

impl Role {
    /// Admin or superadmin.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

/// Preferred UI / chatbot language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Vi,
    En,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Never,
}

/// Per-user notification preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub budget_alerts: bool,
    pub loan_reminders: bool,
    pub monthly_reports: bool,
    pub email_frequency: EmailFrequency,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
            budget_alerts: true,
            loan_reminders: true,
            monthly_reports: false,
            email_frequency: EmailFrequency::default(),
        }
    }
}

/// User account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID
    pub id: String,
    /// Email address (unique, lowercase)
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_email_verified: bool,
    /// Deactivated accounts cannot log in.
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub settings: NotificationSettings,
    /// Tokens issued before this instant are rejected.
    #[serde(default)]
    pub password_changed_at: Option<DateTime<Utc>>,
    /// Keyed digest of the outstanding password reset token.
    #[serde(default)]
    pub password_reset_digest: Option<String>,
    #[serde(default)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Public view of a user (no credentials).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub is_email_verified: bool,
    pub active: bool,
    pub language: Language,
    pub settings: NotificationSettings,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            phone_number: user.phone_number.clone(),
            role: user.role,
            is_email_verified: user.is_email_verified,
            active: user.active,
            language: user.language,
            settings: user.settings.clone(),
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Superadmin).unwrap(), "\"superadmin\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert!(role.is_admin());
        assert!(!Role::User.is_admin());
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = serde_json::json!({
            "id": "u1",
            "email": "a@b.com",
            "password_hash": "x",
            "first_name": "An",
            "last_name": "Nguyen",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert!(user.active);
        assert_eq!(user.role, Role::User);
        assert_eq!(user.language, Language::Vi);
        assert!(user.settings.budget_alerts);
        assert_eq!(user.full_name(), "An Nguyen");
    }
}
