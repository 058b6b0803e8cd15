//! The polling loop: list rooms, check each one against the retention policy,
//! archive the ones that have gone quiet, then wait for the next tick.

mod policy;

pub use policy::{idle_days, parse_last_active, should_archive};

use crate::hipchat::{
    DirectoryError, Privacy, RoomDirectory, RoomListFilter, RoomSummary, UpdateRoomRequest,
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;

/// A failure that ends the loop
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("could not get rooms list from HipChat: {0}")]
    ListRooms(#[source] DirectoryError),
}

/// A failure confined to one room. Logged, then the sweep moves on.
#[derive(Debug, Error)]
enum RoomError {
    #[error("could not retrieve room: {0}")]
    Detail(#[source] DirectoryError),

    #[error("could not retrieve statistics: {0}")]
    Statistics(#[source] DirectoryError),

    #[error("could not parse last active time '{value}': {source}")]
    LastActive {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("could not archive room: {0}")]
    Archive(#[source] DirectoryError),
}

impl RoomError {
    fn stage(&self) -> &'static str {
        match self {
            RoomError::Detail(_) => "detail",
            RoomError::Statistics(_) => "statistics",
            RoomError::LastActive { .. } => "last_active",
            RoomError::Archive(_) => "archive",
        }
    }
}

enum RoomOutcome {
    Public,
    Retained,
    Archived,
}

/// Tally of a single sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub archived: usize,
    pub public: usize,
    pub retained: usize,
    pub failed: usize,
}

pub struct Janitor<D> {
    directory: D,
    max_idle_days: u32,
}

impl<D: RoomDirectory> Janitor<D> {
    pub fn new(directory: D, max_idle_days: u32) -> Self {
        Self {
            directory,
            max_idle_days,
        }
    }

    /// Sweep now and then once every `every`, until listing rooms fails.
    pub async fn run(&self, every: Duration) -> Result<(), SweepError> {
        tracing::info!(
            max_idle_days = self.max_idle_days,
            interval_hours = every.as_secs() / 3600,
            "HipChat janitor started. Archiving any rooms untouched for {} days every {} hours.",
            self.max_idle_days,
            every.as_secs() / 3600
        );

        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let report = self.sweep().await?;
            tracing::info!(
                examined = report.examined,
                archived = report.archived,
                public = report.public,
                retained = report.retained,
                failed = report.failed,
                "Sweep complete"
            );
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport, SweepError> {
        self.sweep_at(Utc::now()).await
    }

    /// One pass over every unarchived room, measuring idle time against `now`
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, SweepError> {
        let rooms = self
            .directory
            .list_rooms(RoomListFilter::UNARCHIVED)
            .await
            .map_err(SweepError::ListRooms)?;

        metrics::counter!("janitor_sweeps_total").increment(1);
        tracing::debug!("Checking {} rooms", rooms.len());

        let mut report = SweepReport::default();

        for summary in &rooms {
            report.examined += 1;

            match self.process_room(summary, now).await {
                Ok(RoomOutcome::Public) => report.public += 1,
                Ok(RoomOutcome::Retained) => report.retained += 1,
                Ok(RoomOutcome::Archived) => {
                    report.archived += 1;
                    metrics::counter!("janitor_rooms_archived_total").increment(1);
                }
                Err(e) => {
                    report.failed += 1;
                    metrics::counter!("janitor_room_errors_total", "stage" => e.stage()).increment(1);
                    tracing::error!(
                        room_id = summary.id,
                        room = %summary.name,
                        stage = e.stage(),
                        "Error processing room '{}': {}",
                        summary.name,
                        e
                    );
                }
            }
        }

        metrics::counter!("janitor_rooms_examined_total").increment(report.examined as u64);
        metrics::gauge!("janitor_last_sweep_timestamp_seconds").set(now.timestamp() as f64);

        Ok(report)
    }

    async fn process_room(&self, summary: &RoomSummary, now: DateTime<Utc>) -> Result<RoomOutcome, RoomError> {
        let room = self
            .directory
            .get_room(summary.id)
            .await
            .map_err(RoomError::Detail)?;

        if room.privacy != Privacy::Private {
            return Ok(RoomOutcome::Public);
        }

        let stats = self
            .directory
            .get_room_statistics(summary.id)
            .await
            .map_err(RoomError::Statistics)?;

        let value = stats.last_active.as_deref().unwrap_or_default();
        let last_active = parse_last_active(value).map_err(|source| RoomError::LastActive {
            value: value.to_string(),
            source,
        })?;

        let idle = idle_days(last_active, now);

        if !should_archive(room.privacy, last_active, now, self.max_idle_days) {
            tracing::debug!(
                room_id = room.id,
                room = %room.name,
                idle_days = idle,
                messages_sent = stats.messages_sent,
                "Keeping room"
            );
            return Ok(RoomOutcome::Retained);
        }

        tracing::info!(
            room_id = room.id,
            idle_days = idle,
            "Archiving room '{}', not touched in >= {} days.",
            room.name,
            self.max_idle_days
        );

        self.directory
            .update_room(summary.id, &UpdateRoomRequest::archive(&room))
            .await
            .map_err(RoomError::Archive)?;

        Ok(RoomOutcome::Archived)
    }
}
