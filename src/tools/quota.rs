//! Daily per-tool usage quota
//!
//! Counts successful calls per tool for the current UTC day. Counts live in
//! memory and reset when the date changes or the process restarts.

use crate::types::{AppError, Result};
use crate::utils::toml_config::AxonConfig;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

struct QuotaDay {
    date: NaiveDate,
    counts: HashMap<String, u32>,
}

impl QuotaDay {
    fn roll_to(&mut self, today: NaiveDate) {
        if self.date != today {
            self.date = today;
            self.counts.clear();
        }
    }
}

/// A counted call, stamped with the day it was counted against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaReservation {
    date: NaiveDate,
}

pub struct ToolQuota {
    limit: Option<u32>,
    day: Mutex<QuotaDay>,
}

impl ToolQuota {
    /// `None` allows every call
    pub fn new(limit: Option<u32>) -> Self {
        Self {
            limit,
            day: Mutex::new(QuotaDay {
                date: Utc::now().date_naive(),
                counts: HashMap::new(),
            }),
        }
    }

    pub fn from_config(config: &AxonConfig) -> Self {
        Self::new(config.daily_quota())
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Check and count a call in one locked step. Hand the slot back with
    /// [`ToolQuota::release`] if the call fails.
    pub fn try_acquire(&self, tool: &str) -> Result<QuotaReservation> {
        self.try_acquire_on(tool, Utc::now().date_naive())
    }

    /// Only the day the reservation was taken on gets the slot back
    pub fn release(&self, tool: &str, reservation: QuotaReservation) {
        if self.limit.is_none() {
            return;
        }
        let mut day = self.day.lock();
        if day.date != reservation.date {
            return;
        }
        if let Some(count) = day.counts.get_mut(tool) {
            *count = count.saturating_sub(1);
        }
    }

    /// Calls recorded today for `tool`
    pub fn usage(&self, tool: &str) -> u32 {
        let mut day = self.day.lock();
        day.roll_to(Utc::now().date_naive());
        day.counts.get(tool).copied().unwrap_or(0)
    }

    fn exceeded(tool: &str, used: u32, limit: u32) -> AppError {
        tracing::warn!(tool = %tool, used, limit, "Daily tool quota exceeded");
        AppError::QuotaExceeded(format!(
            "Daily quota ({}) exceeded for {}.",
            limit, tool
        ))
    }

    fn try_acquire_on(&self, tool: &str, today: NaiveDate) -> Result<QuotaReservation> {
        let reservation = QuotaReservation { date: today };
        let Some(limit) = self.limit else {
            return Ok(reservation);
        };

        let mut day = self.day.lock();
        day.roll_to(today);
        let used = day.counts.entry(tool.to_string()).or_insert(0);

        if *used >= limit {
            return Err(Self::exceeded(tool, *used, limit));
        }
        *used += 1;
        Ok(reservation)
    }
}
