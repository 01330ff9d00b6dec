//! Live exercise sessions and their history.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{clamp_unit, FrameEvaluation, StatusColor, Timestamp, UserId};

/// Records kept per user, newest first.
pub const HISTORY_LIMIT: usize = 200;

/// History bucket for sessions that recorded no movement scores.
pub const GENERAL_MOVEMENT_ID: &str = "session-general";

const COMPLETION_ACCURACY_WEIGHT: f64 = 0.6;
const COMPLETION_CONSISTENCY_WEIGHT: f64 = 0.4;

/// Contribution of one frame's status to session consistency.
pub fn status_weight(status: StatusColor) -> f64 {
    match status {
        StatusColor::Green => 1.0,
        StatusColor::Yellow => 0.65,
        StatusColor::Red => 0.2,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStart {
    pub session_id: Uuid,
    pub started_at: Timestamp,
    pub movement_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementScore {
    pub movement_id: String,
    pub average_accuracy: f64,
    /// Number of green frames.
    pub rep_count: u32,
}

/// Result of closing a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub duration_sec: u64,
    pub completion_rate: f64,
    pub consistency: f64,
    pub movement_scores: Vec<MovementScore>,
}

/// Stored summary of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub duration_sec: u64,
    pub average_accuracy: f64,
    pub completion_rate: f64,
    pub movement_scores: Vec<MovementScore>,
}

impl From<&SessionMetrics> for SessionRecord {
    fn from(metrics: &SessionMetrics) -> Self {
        Self {
            session_id: metrics.session_id,
            user_id: metrics.user_id.clone(),
            started_at: metrics.started_at,
            ended_at: metrics.ended_at,
            duration_sec: metrics.duration_sec,
            average_accuracy: mean_accuracy(&metrics.movement_scores),
            completion_rate: metrics.completion_rate,
            movement_scores: metrics.movement_scores.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementHistoryEntry {
    pub movement_id: String,
    pub sessions: u32,
    pub average_accuracy: f64,
}

/// Running accuracy total for one movement.
#[derive(Debug, Default)]
struct Tally {
    count: u32,
    accuracy_sum: f64,
    greens: u32,
}

impl Tally {
    fn add(&mut self, accuracy: f64) {
        self.count += 1;
        self.accuracy_sum += accuracy;
    }

    fn mean(&self) -> f64 {
        self.accuracy_sum / self.count.max(1) as f64
    }
}

fn mean_accuracy(scores: &[MovementScore]) -> f64 {
    scores.iter().map(|s| s.average_accuracy).sum::<f64>() / scores.len().max(1) as f64
}

/// In-progress session owned by one user.
#[derive(Debug, Clone)]
pub struct SessionRun {
    pub id: Uuid,
    pub user_id: UserId,
    pub started_at: Timestamp,
    pub movement_ids: Vec<String>,
    pub evaluations: Vec<FrameEvaluation>,
}

impl SessionRun {
    pub fn new(user_id: UserId, movement_ids: Vec<String>, started_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            started_at,
            movement_ids,
            evaluations: Vec::new(),
        }
    }

    /// Per-movement scores in first-seen order.
    pub fn movement_scores(&self) -> Vec<MovementScore> {
        let mut tallies: IndexMap<&str, Tally> = IndexMap::new();
        for eval in &self.evaluations {
            let tally = tallies.entry(eval.movement_id.as_str()).or_default();
            tally.add(eval.accuracy);
            if eval.status_color == StatusColor::Green {
                tally.greens += 1;
            }
        }
        tallies
            .into_iter()
            .map(|(movement_id, tally)| MovementScore {
                movement_id: movement_id.to_string(),
                average_accuracy: tally.mean(),
                rep_count: tally.greens,
            })
            .collect()
    }

    /// Fold the evaluations into closing metrics.
    pub fn summarize(&self, ended_at: Timestamp) -> SessionMetrics {
        let movement_scores = self.movement_scores();
        let completion = if movement_scores.is_empty() {
            0.0
        } else {
            clamp_unit(mean_accuracy(&movement_scores))
        };
        let consistency = if self.evaluations.is_empty() {
            0.0
        } else {
            let total: f64 = self.evaluations.iter().map(|e| status_weight(e.status_color)).sum();
            clamp_unit(total / self.evaluations.len() as f64)
        };

        SessionMetrics {
            session_id: self.id,
            user_id: self.user_id.clone(),
            started_at: self.started_at,
            ended_at,
            duration_sec: (ended_at - self.started_at).num_seconds().max(0) as u64,
            completion_rate: clamp_unit(
                completion * COMPLETION_ACCURACY_WEIGHT
                    + consistency * COMPLETION_CONSISTENCY_WEIGHT,
            ),
            consistency,
            movement_scores,
        }
    }
}

/// Aggregate session history per movement, in first-seen order.
pub fn movement_history(records: &[SessionRecord]) -> Vec<MovementHistoryEntry> {
    let mut tallies: IndexMap<&str, Tally> = IndexMap::new();
    for record in records {
        if record.movement_scores.is_empty() {
            tallies
                .entry(GENERAL_MOVEMENT_ID)
                .or_default()
                .add(record.average_accuracy);
            continue;
        }
        for score in &record.movement_scores {
            tallies
                .entry(score.movement_id.as_str())
                .or_default()
                .add(score.average_accuracy);
        }
    }

    tallies
        .into_iter()
        .map(|(movement_id, tally)| MovementHistoryEntry {
            movement_id: movement_id.to_string(),
            sessions: tally.count,
            average_accuracy: tally.mean(),
        })
        .collect()
}
