//! Production stages and the progress engine.
//!
//! Every order carries the same seven stages in a fixed order. Progress is a
//! pure function of how many of them are done.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::StageStatus;

/// Progress at which an order is flagged "sẵn sàng" (ready to ship soon).
pub const READY_THRESHOLD: u8 = 70;

/// The fixed production stages, in workshop order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "chat")]
    Cutting,
    #[serde(rename = "mat-giay")]
    Upper,
    #[serde(rename = "suon")]
    Side,
    #[serde(rename = "de")]
    Sole,
    #[serde(rename = "got")]
    Heel,
    #[serde(rename = "go")]
    Lasting,
    #[serde(rename = "dong-goi")]
    Packing,
}

impl Stage {
    pub const ALL: [Self; 7] = [
        Self::Cutting,
        Self::Upper,
        Self::Side,
        Self::Sole,
        Self::Heel,
        Self::Lasting,
        Self::Packing,
    ];

    /// Display name used on the shop floor.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cutting => "Chặt",
            Self::Upper => "Mặt giày",
            Self::Side => "Sườn",
            Self::Sole => "Đế",
            Self::Heel => "Gót",
            Self::Lasting => "Gò",
            Self::Packing => "Đóng gói",
        }
    }

    /// URL-safe identifier, identical to the serialized form.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Cutting => "chat",
            Self::Upper => "mat-giay",
            Self::Side => "suon",
            Self::Sole => "de",
            Self::Heel => "got",
            Self::Lasting => "go",
            Self::Packing => "dong-goi",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.slug() == s)
            .ok_or_else(|| format!("unknown stage: {s}"))
    }
}

/// One entry of a stage's transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEvent {
    pub status: StageStatus,
    pub at: DateTime<Utc>,
}

/// A stage of one production order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionStage {
    pub id: Stage,
    pub name: String,
    pub status: StageStatus,
    /// Last time the stage entered `in_progress`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// Last time the stage entered `done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Every accepted transition, oldest first.
    #[serde(default)]
    pub history: Vec<StageEvent>,
}

impl ProductionStage {
    #[must_use]
    pub fn pending(stage: Stage) -> Self {
        Self {
            id: stage,
            name: stage.name().to_owned(),
            status: StageStatus::Pending,
            start_date: None,
            end_date: None,
            note: None,
            history: Vec::new(),
        }
    }

    /// Move to `status`, stamping the matching timestamp.
    ///
    /// Timestamps are overwritten on every entry and never cleared; the
    /// full sequence is kept in `history`.
    pub fn transition(&mut self, status: StageStatus, now: DateTime<Utc>) {
        self.status = status;
        match status {
            StageStatus::InProgress => self.start_date = Some(now),
            StageStatus::Done => self.end_date = Some(now),
            StageStatus::Pending => {}
        }
        self.history.push(StageEvent { status, at: now });
    }
}

/// The seven stages of a new order, all pending.
#[must_use]
pub fn initial_stages() -> Vec<ProductionStage> {
    Stage::ALL.into_iter().map(ProductionStage::pending).collect()
}

/// Completion percentage, rounded half up. An empty list is 0%.
#[must_use]
pub fn progress(stages: &[ProductionStage]) -> u8 {
    let total = stages.len();
    if total == 0 {
        return 0;
    }
    let done = stages
        .iter()
        .filter(|s| s.status == StageStatus::Done)
        .count();
    // round(100 * done / total) with integer arithmetic
    let percent = (200 * done + total) / (2 * total);
    u8::try_from(percent).unwrap_or(100)
}

/// Whether the list is non-empty and every stage is done.
///
/// Decided on the statuses, not on the rounded percentage.
#[must_use]
pub fn is_fully_done(stages: &[ProductionStage]) -> bool {
    !stages.is_empty() && stages.iter().all(|s| s.status == StageStatus::Done)
}

/// Whether progress is at least 70% and some stage is still open.
#[must_use]
pub fn is_ready_threshold(stages: &[ProductionStage]) -> bool {
    !is_fully_done(stages) && progress(stages) >= READY_THRESHOLD
}

/// Whether any stage is currently being worked on.
#[must_use]
pub fn is_in_progress(stages: &[ProductionStage]) -> bool {
    stages.iter().any(|s| s.status == StageStatus::InProgress)
}
