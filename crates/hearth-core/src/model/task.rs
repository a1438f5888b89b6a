use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

use crate::time::Weekday;

/// How often a task recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Once per week, any day.
    Weekly,
    /// On the listed weekdays.
    WeeklyDays,
    /// A fixed number of times per week, any days.
    WeeklyTimes,
    /// Anything else found in a catalog. Never due, never expected.
    #[serde(other)]
    Unknown,
}

impl Frequency {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::WeeklyDays => "weekly_days",
            Self::WeeklyTimes => "weekly_times",
            Self::Unknown => "unknown",
        }
    }

    /// Frequencies that count distinct dates rather than raw marks.
    #[must_use]
    pub const fn is_per_day(self) -> bool {
        matches!(self, Self::Daily | Self::WeeklyDays)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a frequency from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFrequencyError(pub String);

impl fmt::Display for ParseFrequencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid frequency: '{}' (expected daily, weekly, weekly_days or weekly_times)",
            self.0
        )
    }
}

impl std::error::Error for ParseFrequencyError {}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "weekly_days" | "days" => Ok(Self::WeeklyDays),
            "weekly_times" | "times" => Ok(Self::WeeklyTimes),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

/// A recurring chore definition.
///
/// `days` is only meaningful for [`Frequency::WeeklyDays`] and
/// `times_per_week` only for [`Frequency::WeeklyTimes`]; the accessors ignore
/// whichever one does not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default = "default_zone")]
    pub zone: String,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<Weekday>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times_per_week: Option<u32>,
    /// Person id, or empty for family/unassigned.
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub minutes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hide_on_express: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub only_on_express: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Task {
    /// Scheduled weekdays; empty unless the task is `weekly_days`.
    #[must_use]
    pub fn scheduled_days(&self) -> &[Weekday] {
        match (self.frequency, self.days.as_deref()) {
            (Frequency::WeeklyDays, Some(days)) => days,
            _ => &[],
        }
    }

    /// Weekly quota; zero unless the task is `weekly_times`.
    #[must_use]
    pub fn weekly_target(&self) -> u32 {
        match self.frequency {
            Frequency::WeeklyTimes => self.times_per_week.unwrap_or(0),
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.assigned_to.trim().is_empty()
    }

    #[must_use]
    pub fn is_assigned_to(&self, person_id: &str) -> bool {
        !self.is_unassigned() && self.assigned_to == person_id
    }

    /// Whether this task shows up under the given express mode.
    #[must_use]
    pub const fn visible_in(&self, express_enabled: bool) -> bool {
        if express_enabled {
            !self.hide_on_express
        } else {
            !self.only_on_express
        }
    }

    /// Short human description of the recurrence rule.
    #[must_use]
    pub fn frequency_label(&self) -> String {
        match self.frequency {
            Frequency::Daily => "daily".to_string(),
            Frequency::Weekly => "weekly (once)".to_string(),
            Frequency::WeeklyDays => {
                let days = self.scheduled_days();
                if days.is_empty() {
                    "weekly (days: -)".to_string()
                } else {
                    let names: Vec<&str> = days.iter().map(|d| d.as_str()).collect();
                    format!("weekly (days: {})", names.join(", "))
                }
            }
            Frequency::WeeklyTimes => format!("weekly ({}x)", self.weekly_target()),
            Frequency::Unknown => "unknown".to_string(),
        }
    }
}

fn default_zone() -> String {
    "General".to_string()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}
