//! CRUD over the `profiles` table.

use crate::client::RestClient;
use crate::models::profile::ProfileInsert;
use crate::models::{NewProfile, Profile, ProfileUpdate, QueryResult};
use crate::query::OrderOptions;
use serde_json::Value;

pub const PROFILES_TABLE: &str = "profiles";

#[derive(Clone)]
pub struct ProfileRepository {
    client: RestClient,
}

impl ProfileRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    /// All profiles, newest first.
    pub async fn list(&self) -> QueryResult<Vec<Profile>> {
        self.client
            .from(PROFILES_TABLE)
            .select("*")
            .order("created_at", OrderOptions::descending())
            .execute_as()
            .await
    }

    pub async fn get(&self, id: &str) -> QueryResult<Profile> {
        self.client
            .from(PROFILES_TABLE)
            .select("*")
            .eq("id", id)
            .single()
            .execute_as()
            .await
    }

    pub async fn create(&self, profile: &NewProfile) -> QueryResult<Profile> {
        let rows = [ProfileInsert::from(profile)];
        let result: QueryResult<Profile> = self
            .client
            .from(PROFILES_TABLE)
            .insert(&rows)
            .select("*")
            .single()
            .execute_as()
            .await;

        if let Some(created) = &result.data {
            tracing::info!(profile_id = %created.id, "Profile created");
        }
        result
    }

    /// Apply `changes` to one profile. When the backend answers without a
    /// representation the row is read back.
    pub async fn update(&self, id: &str, changes: &ProfileUpdate) -> QueryResult<Profile> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        let result: QueryResult<Value> = self
            .client
            .from(PROFILES_TABLE)
            .update(changes)
            .eq("id", id)
            .select("*")
            .maybe_single()
            .execute()
            .await;

        if result.is_ok() && result.data.is_none() {
            tracing::debug!(profile_id = %id, "Update returned no row, reading it back");
            return self.get(id).await;
        }

        if result.is_ok() {
            tracing::info!(profile_id = %id, "Profile updated");
        }
        result.decode()
    }

    pub async fn delete(&self, id: &str) -> QueryResult<Value> {
        let result = self
            .client
            .from(PROFILES_TABLE)
            .delete()
            .eq("id", id)
            .execute()
            .await;

        if result.is_ok() {
            tracing::info!(profile_id = %id, "Profile deleted");
        }
        result
    }

    /// Admins may modify any profile; everyone else only their own.
    /// `profiles` is the caller's current view, used to find their role.
    pub fn can_modify(current_user_id: Option<&str>, profiles: &[Profile], target: &Profile) -> bool {
        let Some(user_id) = current_user_id else {
            return false;
        };

        let is_admin = profiles
            .iter()
            .find(|p| p.id == user_id)
            .is_some_and(Profile::is_admin);

        is_admin || target.id == user_id
    }
}
