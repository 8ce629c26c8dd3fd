use crate::storage::{Storage, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const WORKOUT_COMPLETED_KEY: &str = "workoutCompleted";
pub const CELEBRATION_WINDOW_MS: i64 = 10_000;
pub const DEFAULT_POINTS: u32 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Flexibility,
    Strength,
    Breathing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub bar_index: usize,
    pub percent: &'static str,
    pub time_left: &'static str,
}

impl WorkoutKind {
    pub fn title(self) -> &'static str {
        match self {
            WorkoutKind::Flexibility => "Flexibility - Core Power",
            WorkoutKind::Strength => "Strength - Kettlebell Basics",
            WorkoutKind::Breathing => "Breathing - Deep Focus",
        }
    }

    pub fn progress_update(self) -> ProgressUpdate {
        match self {
            WorkoutKind::Flexibility => ProgressUpdate {
                bar_index: 2,
                percent: "34%",
                time_left: "13m left",
            },
            WorkoutKind::Strength => ProgressUpdate {
                bar_index: 5,
                percent: "87%",
                time_left: "5m left",
            },
            WorkoutKind::Breathing => ProgressUpdate {
                bar_index: 1,
                percent: "20%",
                time_left: "32m left",
            },
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutKind::Flexibility => write!(f, "flexibility"),
            WorkoutKind::Strength => write!(f, "strength"),
            WorkoutKind::Breathing => write!(f, "breathing"),
        }
    }
}

impl FromStr for WorkoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flexibility" => Ok(WorkoutKind::Flexibility),
            "strength" => Ok(WorkoutKind::Strength),
            "breathing" => Ok(WorkoutKind::Breathing),
            _ => Err(format!(
                "invalid workout '{s}', expected flexibility, strength or breathing"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutCompletion {
    pub workout: WorkoutKind,
    pub timestamp: i64,
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Celebration {
    pub workout: WorkoutKind,
    pub title: &'static str,
    pub points: u32,
    pub progress: ProgressUpdate,
    pub feedback: Option<String>,
}

/// Records a finished workout, replacing any record not yet consumed.
pub async fn store_completion<S: Storage>(
    storage: &S,
    workout: WorkoutKind,
    points: Option<u32>,
    feedback: Option<String>,
    now_ms: i64,
) -> Result<(), StorageError> {
    let completion = WorkoutCompletion {
        workout,
        timestamp: now_ms,
        points: points.unwrap_or(DEFAULT_POINTS),
        feedback: feedback.filter(|text| !text.trim().is_empty()),
    };
    let payload = serde_json::to_string(&completion).map_err(StorageError::Encode)?;
    storage.set(WORKOUT_COMPLETED_KEY, payload).await
}

/// Consumes the pending record, yielding a celebration only when it is fresh.
pub async fn take_celebration<S: Storage>(storage: &S, now_ms: i64) -> Option<Celebration> {
    let raw = match storage.get(WORKOUT_COMPLETED_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!("failed to read workout completion: {err}");
            return None;
        }
    };

    if let Err(err) = storage.remove(WORKOUT_COMPLETED_KEY).await {
        warn!("failed to clear workout completion: {err}");
    }

    let completion: WorkoutCompletion = match serde_json::from_str(&raw) {
        Ok(completion) => completion,
        Err(err) => {
            warn!("discarding undecodable workout completion: {err}");
            return None;
        }
    };

    if now_ms.saturating_sub(completion.timestamp) > CELEBRATION_WINDOW_MS {
        return None;
    }

    Some(Celebration {
        workout: completion.workout,
        title: completion.workout.title(),
        points: completion.points,
        progress: completion.workout.progress_update(),
        feedback: completion.feedback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn unknown_workout_is_rejected() {
        assert_eq!(WorkoutKind::from_str("Strength").unwrap(), WorkoutKind::Strength);
        assert!(WorkoutKind::from_str("yoga").is_err());
        assert!(WorkoutKind::from_str("").is_err());
    }

    #[test]
    fn lookup_tables_cover_every_workout() {
        let strength = WorkoutKind::Strength.progress_update();
        assert_eq!(strength.bar_index, 5);
        assert_eq!(strength.percent, "87%");
        assert_eq!(WorkoutKind::Breathing.title(), "Breathing - Deep Focus");
        assert_eq!(WorkoutKind::Flexibility.progress_update().time_left, "13m left");
    }

    #[tokio::test]
    async fn fresh_completion_celebrates_once() {
        let storage = MemoryStorage::new();
        store_completion(&storage, WorkoutKind::Strength, None, None, 1_000)
            .await
            .unwrap();

        let celebration = take_celebration(&storage, 5_000).await.unwrap();
        assert_eq!(celebration.workout, WorkoutKind::Strength);
        assert_eq!(celebration.points, DEFAULT_POINTS);
        assert_eq!(celebration.title, "Strength - Kettlebell Basics");

        assert!(take_celebration(&storage, 5_001).await.is_none());
    }

    #[tokio::test]
    async fn stale_completion_is_cleared_without_celebrating() {
        let storage = MemoryStorage::new();
        store_completion(
            &storage,
            WorkoutKind::Breathing,
            Some(50),
            Some("calm".to_string()),
            1_000,
        )
        .await
        .unwrap();

        assert!(take_celebration(&storage, 1_000 + CELEBRATION_WINDOW_MS + 1).await.is_none());
        assert_eq!(storage.get(WORKOUT_COMPLETED_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn extreme_timestamps_do_not_overflow() {
        let storage = MemoryStorage::new();
        store_completion(&storage, WorkoutKind::Flexibility, None, None, i64::MIN)
            .await
            .unwrap();
        assert!(take_celebration(&storage, i64::MAX).await.is_none());

        store_completion(&storage, WorkoutKind::Flexibility, None, None, i64::MAX)
            .await
            .unwrap();
        assert!(take_celebration(&storage, i64::MIN).await.is_some());
    }

    #[tokio::test]
    async fn undecodable_completion_is_discarded() {
        let storage = MemoryStorage::new();
        storage
            .set(WORKOUT_COMPLETED_KEY, "{\"workout\":\"yoga\"}".to_string())
            .await
            .unwrap();

        assert!(take_celebration(&storage, 0).await.is_none());
        assert_eq!(storage.get(WORKOUT_COMPLETED_KEY).await.unwrap(), None);
    }
}
