use std::sync::Arc;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::domain::account_service::require_user;
use crate::domain::clock::Clock;
use crate::domain::error::{require, require_positive, ServiceError, ServiceResult};
use crate::domain::models::metrics::{format_timestamp, parse_timestamp};
use crate::domain::models::{decode_document, GlucoseReading, MealEntry, PressureReading, Stored, TimeRange};
use crate::storage::{layout, CollectionPath, Direction, DocumentStore, Query};

/// How many meals `list_meals` returns at most
pub const RECENT_MEALS_LIMIT: u32 = 10;

const TIMESTAMP: &str = "timestamp";

/// Append-only blood pressure, glucose and meal logs
#[derive(Clone)]
pub struct MetricsService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl MetricsService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn add_pressure(
        &self,
        username: &str,
        systolic: f64,
        diastolic: f64,
        timestamp: Option<&str>,
    ) -> ServiceResult<String> {
        let username = require("username", username)?;
        let reading = PressureReading {
            systolic: require_positive("systolic", systolic)?,
            diastolic: require_positive("diastolic", diastolic)?,
            timestamp: self.resolve_timestamp(timestamp)?,
        };

        let id = self
            .append(username, layout::pressure_data(username)?, &reading)
            .await?;
        info!(
            "Recorded pressure {}/{} for {} at {}",
            reading.systolic, reading.diastolic, username, reading.timestamp
        );
        Ok(id)
    }

    /// Pressure readings inside `range`, oldest first
    pub async fn list_pressure(&self, username: &str, range: TimeRange) -> ServiceResult<Vec<Stored<PressureReading>>> {
        let username = require("username", username)?;
        let query = Self::range_query(range).order_by(TIMESTAMP, Direction::Ascending);
        self.fetch(layout::pressure_data(username)?, &query).await
    }

    pub async fn add_glucose(&self, username: &str, glucose_level: f64, timestamp: Option<&str>) -> ServiceResult<String> {
        let username = require("username", username)?;
        let reading = GlucoseReading {
            glucose_level: require_positive("glucose_level", glucose_level)?,
            timestamp: self.resolve_timestamp(timestamp)?,
        };

        let id = self
            .append(username, layout::glucose_data(username)?, &reading)
            .await?;
        info!(
            "Recorded glucose {} for {} at {}",
            reading.glucose_level, username, reading.timestamp
        );
        Ok(id)
    }

    /// Glucose readings inside `range`, oldest first
    pub async fn list_glucose(&self, username: &str, range: TimeRange) -> ServiceResult<Vec<Stored<GlucoseReading>>> {
        let username = require("username", username)?;
        let query = Self::range_query(range).order_by(TIMESTAMP, Direction::Ascending);
        self.fetch(layout::glucose_data(username)?, &query).await
    }

    pub async fn add_meal(
        &self,
        username: &str,
        meal: &str,
        carbohydrates: Option<f64>,
        calories: Option<f64>,
        timestamp: Option<&str>,
    ) -> ServiceResult<String> {
        let username = require("username", username)?;
        let entry = MealEntry {
            meal: require("meal", meal)?.to_string(),
            carbohydrates: carbohydrates
                .map(|v| require_non_negative("carbohydrates", v))
                .transpose()?,
            calories: calories
                .map(|v| require_non_negative("calories", v))
                .transpose()?,
            timestamp: self.resolve_timestamp(timestamp)?,
        };

        let id = self.append(username, layout::meals(username)?, &entry).await?;
        info!("Recorded meal '{}' for {} at {}", entry.meal, username, entry.timestamp);
        Ok(id)
    }

    /// The most recent meals inside `range`, newest first
    pub async fn list_meals(&self, username: &str, range: TimeRange) -> ServiceResult<Vec<Stored<MealEntry>>> {
        let username = require("username", username)?;
        let query = Self::range_query(range)
            .order_by(TIMESTAMP, Direction::Descending)
            .limit(RECENT_MEALS_LIMIT);
        self.fetch(layout::meals(username)?, &query).await
    }

    /// Normalise a client timestamp, or stamp with the current time
    fn resolve_timestamp(&self, raw: Option<&str>) -> ServiceResult<String> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Ok(format_timestamp(parse_timestamp(raw)?)),
            None => Ok(format_timestamp(self.clock.now().with_timezone(&Utc))),
        }
    }

    fn range_query(range: TimeRange) -> Query {
        let mut query = Query::new();
        if let Some(start) = range.start {
            query = query.where_gte(TIMESTAMP, format_timestamp(start));
        }
        if let Some(end) = range.end {
            query = query.where_lte(TIMESTAMP, format_timestamp(end));
        }
        query
    }

    async fn append<T: Serialize>(&self, username: &str, collection: CollectionPath, entry: &T) -> ServiceResult<String> {
        require_user(self.store.as_ref(), username).await?;
        Ok(self.store.add(&collection, serde_json::to_value(entry)?).await?)
    }

    async fn fetch<T: DeserializeOwned>(&self, collection: CollectionPath, query: &Query) -> ServiceResult<Vec<Stored<T>>> {
        let docs = self.store.query(&collection, query).await?;

        let mut entries = Vec::with_capacity(docs.len());
        for doc in docs {
            let value = decode_document(&format!("{collection}/{}", doc.id), doc.data)?;
            entries.push(Stored { id: doc.id, value });
        }

        info!("Found {} entries in {}", entries.len(), collection);
        Ok(entries)
    }
}

fn require_non_negative(field: &str, value: f64) -> ServiceResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServiceError::Validation(format!(
            "{field} must not be negative"
        )));
    }
    Ok(value)
}
