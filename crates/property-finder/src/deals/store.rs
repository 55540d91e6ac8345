use std::sync::{Arc, Mutex, RwLock};

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::MetricObservation;
use super::scoring::DealScore;

/// Source of raw observations for every known ZIP code.
pub trait ObservationSource: Send + Sync {
    fn observations(&self) -> Result<Vec<MetricObservation>, StoreError>;
}

/// Destination for batch scores. Implementations must make `replace_generation` atomic:
/// a concurrent `current` sees either the complete previous generation or the complete
/// new one, never a mix.
pub trait ScoreStore: Send + Sync {
    fn replace_generation(
        &self,
        as_of: NaiveDate,
        scores: Vec<DealScore>,
    ) -> Result<Arc<ScoreGeneration>, StoreError>;
    fn current(&self) -> Result<Arc<ScoreGeneration>, StoreError>;
}

/// Every score written by one batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreGeneration {
    pub generation: u64,
    pub as_of: Option<NaiveDate>,
    pub scores: Vec<DealScore>,
}

impl ScoreGeneration {
    fn initial() -> Self {
        Self {
            generation: 0,
            as_of: None,
            scores: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Observation store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryObservationStore {
    observations: Mutex<Vec<MetricObservation>>,
}

impl InMemoryObservationStore {
    pub fn new(observations: Vec<MetricObservation>) -> Self {
        Self {
            observations: Mutex::new(observations),
        }
    }

    pub fn extend<I>(&self, observations: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = MetricObservation>,
    {
        let mut guard = self
            .observations
            .lock()
            .map_err(|_| StoreError::Unavailable("observation lock poisoned".to_string()))?;
        let before = guard.len();
        guard.extend(observations);
        Ok(guard.len() - before)
    }
}

impl ObservationSource for InMemoryObservationStore {
    fn observations(&self) -> Result<Vec<MetricObservation>, StoreError> {
        let guard = self
            .observations
            .lock()
            .map_err(|_| StoreError::Unavailable("observation lock poisoned".to_string()))?;
        Ok(guard.clone())
    }
}

/// Score store that publishes each generation as a single pointer swap.
#[derive(Debug)]
pub struct InMemoryScoreStore {
    current: RwLock<Arc<ScoreGeneration>>,
}

impl Default for InMemoryScoreStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(ScoreGeneration::initial())),
        }
    }
}

impl ScoreStore for InMemoryScoreStore {
    fn replace_generation(
        &self,
        as_of: NaiveDate,
        scores: Vec<DealScore>,
    ) -> Result<Arc<ScoreGeneration>, StoreError> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| StoreError::Unavailable("score lock poisoned".to_string()))?;
        let next = Arc::new(ScoreGeneration {
            generation: guard.generation + 1,
            as_of: Some(as_of),
            scores,
        });
        *guard = Arc::clone(&next);
        Ok(next)
    }

    fn current(&self) -> Result<Arc<ScoreGeneration>, StoreError> {
        let guard = self
            .current
            .read()
            .map_err(|_| StoreError::Unavailable("score lock poisoned".to_string()))?;
        Ok(Arc::clone(&guard))
    }
}
