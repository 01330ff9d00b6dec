//! In-memory store for runs, profiles, history, consent and telemetry.
//!
//! One [`CoachStore`] is created by the service layer and shared behind an
//! `Arc`. Run maps are locked only to look up, insert or remove a run; each
//! run has its own `Mutex` so appends to one run are serialized while
//! distinct runs proceed in parallel.
//!
//! Completing a calibration or ending a session takes the run out of its slot
//! under that same `Mutex`. An append that looked the run up just before will
//! find an empty slot and is rejected, so every acknowledged frame is part of
//! the folded result.
//!
//! Every run accessor takes the requesting user. A run owned by someone else
//! is reported exactly like a missing run (`None` / `false`).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::Utc;
use uuid::Uuid;

use crate::calibration::{
    CalibrationFrame, CalibrationProfile, CalibrationProgress, CalibrationRun, CalibrationStart,
    TARGET_DURATION_SEC,
};
use crate::movements::default_movement;
use crate::session::{
    movement_history, MovementHistoryEntry, SessionMetrics, SessionRecord, SessionRun,
    SessionStart, HISTORY_LIMIT,
};
use crate::telemetry::{
    fairness_buckets, ConsentUpdate, FairnessBucketMetrics, StoredTelemetryFrame,
    TelemetryFrameSample, UserConsent, DEFAULT_LOCALE, TELEMETRY_LIMIT,
};
use crate::types::{DeviceProfile, FrameEvaluation, UserId};

/// Runs by id. A slot is `None` once the run has been finalized.
type RunSlot<R> = Arc<Mutex<Option<R>>>;
type RunMap<R> = RwLock<HashMap<Uuid, RunSlot<R>>>;

fn lock<R>(run: &Mutex<R>) -> MutexGuard<'_, R> {
    run.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide coaching state. Construct one per service (or per test).
#[derive(Default)]
pub struct CoachStore {
    calibration_runs: RunMap<CalibrationRun>,
    session_runs: RunMap<SessionRun>,
    profiles: RwLock<HashMap<UserId, CalibrationProfile>>,
    history: RwLock<HashMap<UserId, Vec<SessionRecord>>>,
    consents: RwLock<HashMap<UserId, UserConsent>>,
    telemetry: RwLock<VecDeque<StoredTelemetryFrame>>,
}

impl CoachStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn owned_run<R>(
        runs: &RunMap<R>,
        id: Uuid,
        user_id: &str,
        owner: impl Fn(&R) -> &str,
    ) -> Option<RunSlot<R>> {
        let slot = runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()?;
        let owned = lock(&slot).as_ref().is_some_and(|run| owner(run) == user_id);
        owned.then_some(slot)
    }

    /// Take an owned run out of its slot and drop it from the map.
    fn take_owned_run<R>(
        runs: &RunMap<R>,
        id: Uuid,
        user_id: &str,
        owner: impl Fn(&R) -> &str,
    ) -> Option<R> {
        let mut runs = runs.write().unwrap_or_else(PoisonError::into_inner);
        let run = {
            let mut slot = lock(runs.get(&id)?);
            if !slot.as_ref().is_some_and(|run| owner(run) == user_id) {
                return None;
            }
            slot.take()?
        };
        runs.remove(&id);
        Some(run)
    }

    // -----------------------------------------------------------------------
    // Calibration
    // -----------------------------------------------------------------------

    pub fn start_calibration(
        &self,
        user_id: &str,
        device_profile: DeviceProfile,
    ) -> CalibrationStart {
        let started_at = Utc::now();
        let run = CalibrationRun::new(user_id.to_string(), device_profile, started_at);
        let calibration_id = run.id;
        self.calibration_runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(calibration_id, Arc::new(Mutex::new(Some(run))));

        tracing::info!(%calibration_id, user_id, "Calibration started");
        CalibrationStart {
            calibration_id,
            target_duration_sec: TARGET_DURATION_SEC,
            started_at,
        }
    }

    /// Append a frame; `None` when the run is missing, finalized or not owned
    /// by `user_id`.
    pub fn add_calibration_frame(
        &self,
        calibration_id: Uuid,
        user_id: &str,
        frame: CalibrationFrame,
    ) -> Option<CalibrationProgress> {
        let slot = Self::owned_run(&self.calibration_runs, calibration_id, user_id, |r| {
            r.user_id.as_str()
        })?;
        let mut slot = lock(&slot);
        let run = slot.as_mut()?;
        let progress = run.push_frame(frame);
        tracing::debug!(
            %calibration_id,
            frames = run.frames.len(),
            average_score = progress.average_score,
            quality_level = progress.quality_level.as_str(),
            "Calibration frame appended"
        );
        Some(progress)
    }

    /// Finalize a run into the user's profile, replacing any previous one.
    pub fn complete_calibration(
        &self,
        calibration_id: Uuid,
        user_id: &str,
    ) -> Option<CalibrationProfile> {
        let run = Self::take_owned_run(&self.calibration_runs, calibration_id, user_id, |r| {
            r.user_id.as_str()
        })?;

        let profile = run.build_profile(Utc::now());
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.user_id.clone(), profile.clone());

        tracing::info!(
            %calibration_id,
            user_id,
            samples = profile.quality_stats.sample_count,
            landmark_baseline = profile.personal_baseline_v2.is_some(),
            "Calibration completed"
        );
        Some(profile)
    }

    pub fn calibration_profile(&self, user_id: &str) -> Option<CalibrationProfile> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Open a session. An empty selection falls back to the default movement.
    pub fn start_session(&self, user_id: &str, movement_ids: Vec<String>) -> SessionStart {
        let movement_ids = if movement_ids.is_empty() {
            vec![default_movement().id.to_string()]
        } else {
            movement_ids
        };
        let started_at = Utc::now();
        let run = SessionRun::new(user_id.to_string(), movement_ids.clone(), started_at);
        let session_id = run.id;
        self.session_runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id, Arc::new(Mutex::new(Some(run))));

        tracing::info!(%session_id, user_id, ?movement_ids, "Session started");
        SessionStart {
            session_id,
            started_at,
            movement_ids,
        }
    }

    /// Whether `user_id` owns the open session `session_id`.
    pub fn owns_session(&self, session_id: Uuid, user_id: &str) -> bool {
        Self::owned_run(&self.session_runs, session_id, user_id, |r| r.user_id.as_str()).is_some()
    }

    /// Record an evaluated frame; `false` when the session is missing, ended
    /// or foreign.
    pub fn append_evaluation(
        &self,
        session_id: Uuid,
        user_id: &str,
        evaluation: FrameEvaluation,
    ) -> bool {
        let Some(slot) =
            Self::owned_run(&self.session_runs, session_id, user_id, |r| r.user_id.as_str())
        else {
            return false;
        };
        let mut slot = lock(&slot);
        let Some(run) = slot.as_mut() else {
            return false;
        };
        run.evaluations.push(evaluation);
        tracing::debug!(%session_id, frames = run.evaluations.len(), "Session frame appended");
        true
    }

    /// Close a session, fold it into metrics and prepend it to history.
    pub fn end_session(&self, session_id: Uuid, user_id: &str) -> Option<SessionMetrics> {
        let run = Self::take_owned_run(&self.session_runs, session_id, user_id, |r| {
            r.user_id.as_str()
        })?;

        let metrics = run.summarize(Utc::now());
        {
            let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
            let records = history.entry(metrics.user_id.clone()).or_default();
            records.insert(0, SessionRecord::from(&metrics));
            records.truncate(HISTORY_LIMIT);
        }

        tracing::info!(
            %session_id,
            user_id,
            completion_rate = metrics.completion_rate,
            duration_sec = metrics.duration_sec,
            "Session ended"
        );
        Some(metrics)
    }

    /// Finished sessions, newest first.
    pub fn sessions(&self, user_id: &str) -> Vec<SessionRecord> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn movement_history(&self, user_id: &str) -> Vec<MovementHistoryEntry> {
        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        history
            .get(user_id)
            .map(|records| movement_history(records))
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Consent and telemetry
    // -----------------------------------------------------------------------

    pub fn user_consent(&self, user_id: &str) -> UserConsent {
        self.consents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserConsent::default_for(user_id.to_string(), Utc::now()))
    }

    pub fn update_consent(&self, user_id: &str, update: ConsentUpdate) -> UserConsent {
        let consent = UserConsent {
            user_id: user_id.to_string(),
            telemetry_opt_in: update.telemetry_opt_in,
            consent_version: update.consent_version,
            locale: update.locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            updated_at: Utc::now(),
        };
        self.consents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(consent.user_id.clone(), consent.clone());
        tracing::info!(user_id, opt_in = consent.telemetry_opt_in, "Consent updated");
        consent
    }

    /// Store a sample; `false` when the user has not opted in.
    pub fn append_telemetry(&self, user_id: &str, sample: TelemetryFrameSample) -> bool {
        if !self.user_consent(user_id).telemetry_opt_in {
            tracing::warn!(user_id, "Telemetry rejected without consent");
            return false;
        }
        let mut frames = self.telemetry.write().unwrap_or_else(PoisonError::into_inner);
        frames.push_front(StoredTelemetryFrame {
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            sample,
        });
        frames.truncate(TELEMETRY_LIMIT);
        true
    }

    pub fn fairness_buckets(&self, user_id: &str) -> Vec<FairnessBucketMetrics> {
        let frames = self.telemetry.read().unwrap_or_else(PoisonError::into_inner);
        fairness_buckets(
            frames
                .iter()
                .filter(|f| f.user_id == user_id)
                .map(|f| &f.sample),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
