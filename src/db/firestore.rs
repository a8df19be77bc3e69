// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and login credentials
//! - Trips and their linked activities
//! - Catalog activities, reviews and saves
//! - Stored recommendations

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    Activity, Credentials, Recommendation, Review, SavedActivity, Trip, TripActivity, User,
};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic document helpers ────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, doc_id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, doc_id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc_id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, doc_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(doc_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All documents in `collection` whose `field` equals `value`.
    async fn query_by_id_field<T>(
        &self,
        collection: &str,
        field: &'static str,
        value: u64,
    ) -> Result<Vec<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.for_all([q.field(field).eq(value)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, &user_id.to_string()).await
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.user_id.to_string(), user)
            .await
    }

    // ─── Credential Operations ───────────────────────────────────

    /// Look up credentials by (normalized) email.
    pub async fn get_credentials(&self, email: &str) -> Result<Option<Credentials>, AppError> {
        self.get_doc(collections::CREDENTIALS, email).await
    }

    /// Create credentials, failing with `Conflict` if the email is taken.
    pub async fn insert_credentials(&self, credentials: &Credentials) -> Result<(), AppError> {
        let result: Result<(), firestore::errors::FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::CREDENTIALS)
            .document_id(&credentials.email)
            .object(credentials)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Err(
                AppError::Conflict("A user with this email already exists".to_string()),
            ),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    pub async fn delete_credentials(&self, email: &str) -> Result<(), AppError> {
        self.delete_doc(collections::CREDENTIALS, email).await
    }

    /// Register a new user.
    ///
    /// The credentials insert reserves the email; if the profile write then
    /// fails, the reservation is released.
    pub async fn create_user(&self, user: &User, credentials: &Credentials) -> Result<(), AppError> {
        self.insert_credentials(credentials).await?;

        if let Err(e) = self.upsert_user(user).await {
            if let Err(cleanup) = self.delete_credentials(&credentials.email).await {
                tracing::error!(error = %cleanup, "Failed to release credentials after profile write error");
            }
            return Err(e);
        }

        tracing::info!(user_id = user.user_id, "User registered");
        Ok(())
    }

    /// Move a user's credentials to a new email and save the profile.
    pub async fn change_user_email(
        &self,
        user: &User,
        old_email: &str,
    ) -> Result<(), AppError> {
        let old = self
            .get_credentials(old_email)
            .await?
            .ok_or_else(|| AppError::NotFound("Credentials not found".to_string()))?;

        let moved = Credentials {
            user_id: user.user_id,
            email: user.email.clone(),
            password_hash: old.password_hash,
        };
        self.insert_credentials(&moved).await?;

        if let Err(e) = self.upsert_user(user).await {
            if let Err(cleanup) = self.delete_credentials(&moved.email).await {
                tracing::error!(error = %cleanup, "Failed to release new credentials after profile write error");
            }
            return Err(e);
        }

        self.delete_credentials(old_email).await?;

        tracing::info!(user_id = user.user_id, "User email changed");
        Ok(())
    }

    // ─── Trip Operations ─────────────────────────────────────────

    pub async fn get_trip(&self, trip_id: u64) -> Result<Option<Trip>, AppError> {
        self.get_doc(collections::TRIPS, &trip_id.to_string()).await
    }

    pub async fn upsert_trip(&self, trip: &Trip) -> Result<(), AppError> {
        self.set_doc(collections::TRIPS, &trip.trip_id.to_string(), trip)
            .await
    }

    /// All trips owned by a user.
    pub async fn get_trips_for_user(&self, user_id: u64) -> Result<Vec<Trip>, AppError> {
        self.query_by_id_field(collections::TRIPS, "user_id", user_id)
            .await
    }

    /// Delete a trip and its activity links.
    pub async fn delete_trip(&self, trip_id: u64) -> Result<(), AppError> {
        let links = self.get_trip_activities(trip_id).await?;
        self.batch_delete(&links, collections::TRIP_ACTIVITIES, |link: &TripActivity| {
            TripActivity::document_id(link.trip_id, link.activity_id)
        })
        .await?;

        self.delete_doc(collections::TRIPS, &trip_id.to_string())
            .await?;

        tracing::info!(trip_id, links = links.len(), "Trip deleted");
        Ok(())
    }

    pub async fn add_trip_activity(&self, link: &TripActivity) -> Result<(), AppError> {
        self.set_doc(
            collections::TRIP_ACTIVITIES,
            &TripActivity::document_id(link.trip_id, link.activity_id),
            link,
        )
        .await
    }

    pub async fn get_trip_activities(&self, trip_id: u64) -> Result<Vec<TripActivity>, AppError> {
        self.query_by_id_field(collections::TRIP_ACTIVITIES, "trip_id", trip_id)
            .await
    }

    // ─── Activity Operations ─────────────────────────────────────

    pub async fn get_activity(&self, activity_id: u64) -> Result<Option<Activity>, AppError> {
        self.get_doc(collections::ACTIVITIES, &activity_id.to_string())
            .await
    }

    /// The full catalog.
    pub async fn list_activities(&self) -> Result<Vec<Activity>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch several activities by ID, skipping missing ones.
    ///
    /// Results keep the order of `activity_ids`.
    pub async fn get_activities_by_ids(
        &self,
        activity_ids: &[u64],
    ) -> Result<Vec<Activity>, AppError> {
        let fetched: Vec<Option<Activity>> = stream::iter(activity_ids.iter().copied())
            .map(|id| async move { self.get_activity(id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Activity>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(fetched.into_iter().flatten().collect())
    }

    pub async fn upsert_activity(&self, activity: &Activity) -> Result<(), AppError> {
        self.set_doc(
            collections::ACTIVITIES,
            &activity.activity_id.to_string(),
            activity,
        )
        .await
    }

    /// Delete an activity with its reviews, saves, trip links and
    /// recommendations.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_activity(&self, activity_id: u64) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        let reviews = self.get_reviews_for_activity(activity_id).await?;
        self.batch_delete(&reviews, collections::REVIEWS, |r: &Review| {
            r.review_id.to_string()
        })
        .await?;
        deleted_count += reviews.len();

        let saves: Vec<SavedActivity> = self
            .query_by_id_field(collections::SAVED_ACTIVITIES, "activity_id", activity_id)
            .await?;
        self.batch_delete(&saves, collections::SAVED_ACTIVITIES, |s: &SavedActivity| {
            SavedActivity::document_id(s.user_id, s.activity_id)
        })
        .await?;
        deleted_count += saves.len();

        let links: Vec<TripActivity> = self
            .query_by_id_field(collections::TRIP_ACTIVITIES, "activity_id", activity_id)
            .await?;
        self.batch_delete(&links, collections::TRIP_ACTIVITIES, |l: &TripActivity| {
            TripActivity::document_id(l.trip_id, l.activity_id)
        })
        .await?;
        deleted_count += links.len();

        let recommendations: Vec<Recommendation> = self
            .query_by_id_field(collections::RECOMMENDATIONS, "activity_id", activity_id)
            .await?;
        self.batch_delete(
            &recommendations,
            collections::RECOMMENDATIONS,
            Recommendation::document_id,
        )
        .await?;
        deleted_count += recommendations.len();

        self.delete_doc(collections::ACTIVITIES, &activity_id.to_string())
            .await?;
        deleted_count += 1;

        tracing::info!(activity_id, deleted_count, "Activity deleted");
        Ok(deleted_count)
    }

    // ─── Review Operations ───────────────────────────────────────

    pub async fn add_review(&self, review: &Review) -> Result<(), AppError> {
        self.set_doc(collections::REVIEWS, &review.review_id.to_string(), review)
            .await
    }

    pub async fn get_reviews_for_activity(
        &self,
        activity_id: u64,
    ) -> Result<Vec<Review>, AppError> {
        self.query_by_id_field(collections::REVIEWS, "activity_id", activity_id)
            .await
    }

    pub async fn get_reviews_for_user(&self, user_id: u64) -> Result<Vec<Review>, AppError> {
        self.query_by_id_field(collections::REVIEWS, "user_id", user_id)
            .await
    }

    /// Reviews for each activity, keyed by activity ID.
    pub async fn get_reviews_by_activity(
        &self,
        activity_ids: &[u64],
    ) -> Result<HashMap<u64, Vec<Review>>, AppError> {
        stream::iter(activity_ids.iter().copied())
            .map(|id| async move {
                let reviews = self.get_reviews_for_activity(id).await?;
                Ok::<_, AppError>((id, reviews))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(u64, Vec<Review>), AppError>>>()
            .await
            .into_iter()
            .collect()
    }

    // ─── Saved Activity Operations ───────────────────────────────

    pub async fn get_saved_activity(
        &self,
        user_id: u64,
        activity_id: u64,
    ) -> Result<Option<SavedActivity>, AppError> {
        self.get_doc(
            collections::SAVED_ACTIVITIES,
            &SavedActivity::document_id(user_id, activity_id),
        )
        .await
    }

    /// Create a save, returning `false` if the user already saved the
    /// activity.
    pub async fn save_activity(&self, saved: &SavedActivity) -> Result<bool, AppError> {
        let result: Result<(), firestore::errors::FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::SAVED_ACTIVITIES)
            .document_id(SavedActivity::document_id(saved.user_id, saved.activity_id))
            .object(saved)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    pub async fn get_saved_for_user(&self, user_id: u64) -> Result<Vec<SavedActivity>, AppError> {
        self.query_by_id_field(collections::SAVED_ACTIVITIES, "user_id", user_id)
            .await
    }

    // ─── Recommendation Operations ───────────────────────────────

    pub async fn get_recommendations_for_user(
        &self,
        user_id: u64,
    ) -> Result<Vec<Recommendation>, AppError> {
        self.query_by_id_field(collections::RECOMMENDATIONS, "user_id", user_id)
            .await
    }

    /// Store generated recommendations.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn batch_set_recommendations(
        &self,
        records: &[Recommendation],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(records.to_vec())
            .map(|record: Recommendation| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::RECOMMENDATIONS)
                    .document_id(record.document_id())
                    .object(&record)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Delete documents in transactional batches.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        if items.is_empty() {
            return Ok(());
        }

        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}
