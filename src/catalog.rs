//! Demo data set served by the resources
//!
//! The catalog holds the weather table behind `weather://{city}` and the
//! fact list behind `facts://random` and `facts://all`. A copy is installed
//! into the environment as `catalog.yaml`; the server reads it at startup
//! and swaps in a new copy when reload is enabled and the file changes.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{DemoError, Result};

/// City used by the chat client when a weather question names no known city.
pub const DEFAULT_CITY: &str = "london";

/// Weather table and fact list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogData {
    /// Lower-case city name to forecast text
    #[serde(default)]
    pub weather: BTreeMap<String, String>,
    /// Facts in a stable order
    #[serde(default)]
    pub facts: Vec<String>,
}

impl Default for CatalogData {
    fn default() -> Self {
        let weather = [
            ("new york", "Sunny, 75°F"),
            ("london", "Rainy, 60°F"),
            ("tokyo", "Cloudy, 70°F"),
            ("sydney", "Clear, 80°F"),
            ("paris", "Partly cloudy, 65°F"),
        ]
        .into_iter()
        .map(|(city, forecast)| (city.to_string(), forecast.to_string()))
        .collect();

        let facts = vec![
            "The Great Wall of China is not visible from space with the naked eye.",
            "Honey never spoils. Archaeologists have found pots of honey in ancient Egyptian tombs that are over 3,000 years old and still perfectly good to eat.",
            "A day on Venus is longer than a year on Venus. Venus takes 243 Earth days to rotate once on its axis but only 225 Earth days to orbit the Sun.",
            "The shortest war in history was between Britain and Zanzibar on August 27, 1896. Zanzibar surrendered after 38 minutes.",
            "The average cloud weighs about 1.1 million pounds.",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self { weather, facts }
    }
}

impl CatalogData {
    /// Read and validate a catalog file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// fails [`CatalogData::validate`]
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut data: CatalogData = serde_yaml::from_str(&contents)?;
        data.normalize();
        data.validate()?;
        Ok(data)
    }

    /// Like [`CatalogData::load`], but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(
                "Catalog not found at {}, using built-in data",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// YAML form written into a fresh environment
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// A catalog must carry at least one fact so `facts://random` can answer.
    pub fn validate(&self) -> Result<()> {
        if self.facts.is_empty() {
            return Err(DemoError::Environment("catalog has no facts".to_string()).into());
        }
        if self.facts.iter().any(|f| f.trim().is_empty()) {
            return Err(DemoError::Environment("catalog contains an empty fact".to_string()).into());
        }
        Ok(())
    }

    fn normalize(&mut self) {
        self.weather = std::mem::take(&mut self.weather)
            .into_iter()
            .map(|(city, forecast)| (city.trim().to_lowercase(), forecast))
            .collect();
    }

    /// Case-insensitive forecast lookup
    ///
    /// # Examples
    ///
    /// ```
    /// use mcpdemo::catalog::CatalogData;
    ///
    /// let data = CatalogData::default();
    /// assert_eq!(data.weather_for("  LONDON "), Some("Rainy, 60°F"));
    /// assert_eq!(data.weather_for("atlantis"), None);
    /// ```
    pub fn weather_for(&self, city: &str) -> Option<&str> {
        self.weather
            .get(&city.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Uniformly chosen fact; `None` only for an unvalidated empty catalog
    pub fn random_fact(&self) -> Option<&str> {
        self.facts.choose(&mut rand::rng()).map(String::as_str)
    }
}

/// Shared, swappable catalog handle
///
/// Cloning is cheap; all clones observe [`Catalog::replace`].
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    inner: Arc<RwLock<CatalogData>>,
}

impl Catalog {
    /// Wrap an initial data set
    pub fn new(data: CatalogData) -> Self {
        Self {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    /// Forecast for `city`, if known
    pub async fn weather_for(&self, city: &str) -> Option<String> {
        self.inner.read().await.weather_for(city).map(String::from)
    }

    /// All facts in order
    pub async fn facts(&self) -> Vec<String> {
        self.inner.read().await.facts.clone()
    }

    /// One uniformly chosen fact
    pub async fn random_fact(&self) -> Option<String> {
        self.inner.read().await.random_fact().map(String::from)
    }

    /// Swap in new data after validating it
    ///
    /// # Errors
    ///
    /// Returns the validation error and leaves the current data in place
    pub async fn replace(&self, data: CatalogData) -> Result<()> {
        data.validate()?;
        *self.inner.write().await = data;
        Ok(())
    }
}
