use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    AppAdmin,
    AppUser,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePreferences {
    #[serde(default)]
    pub app_role: Option<AppRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub sms: bool,
    pub push: bool,
    pub email: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            sms: false,
            push: true,
            email: true,
        }
    }
}

/// Row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub preferences: ProfilePreferences,
    #[serde(default)]
    pub loyalty_points: i64,
    #[serde(default)]
    pub total_orders: i64,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default)]
    pub notification_preferences: NotificationPreferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.preferences.app_role == Some(AppRole::AppAdmin)
    }
}

/// Fields a caller supplies when creating a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Insert payload: the caller's fields plus zeroed counters.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProfileInsert<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    pub loyalty_points: i64,
    pub total_orders: i64,
    pub total_spent: f64,
    pub notification_preferences: NotificationPreferences,
}

impl<'a> From<&'a NewProfile> for ProfileInsert<'a> {
    fn from(profile: &'a NewProfile) -> Self {
        Self {
            email: &profile.email,
            full_name: &profile.full_name,
            phone: profile.phone.as_deref(),
            loyalty_points: 0,
            total_orders: 0,
            total_spent: 0.0,
            notification_preferences: NotificationPreferences::default(),
        }
    }
}

/// Partial update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_preferences: Option<NotificationPreferences>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone.is_none()
            && self.avatar_url.is_none()
            && self.notification_preferences.is_none()
    }
}
