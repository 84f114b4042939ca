use chrono::Weekday;
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u16 = 1440;

/// One weekday's working hours. Times are minute-of-day (0–1439);
/// an absent weekday in [`WeeklyHours`] means the staff member is off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DayHours {
    pub start: u16,
    pub end: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_start: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_end: Option<u16>,
}

impl DayHours {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.end > MINUTES_PER_DAY {
            anyhow::bail!("end time out of range: {}", self.end);
        }
        if self.start >= self.end {
            anyhow::bail!(
                "start must be before end ({} >= {})",
                self.start,
                self.end
            );
        }
        match (self.break_start, self.break_end) {
            (None, None) => Ok(()),
            (Some(bs), Some(be)) => {
                if self.start <= bs && bs < be && be <= self.end {
                    Ok(())
                } else {
                    anyhow::bail!("break {bs}-{be} must lie within {}-{}", self.start, self.end)
                }
            }
            _ => anyhow::bail!("break_start and break_end must be set together"),
        }
    }

    /// The open intervals for the day: `[start, end)` split around the
    /// break if one is configured.
    pub fn windows(&self) -> Vec<(u16, u16)> {
        match (self.break_start, self.break_end) {
            (Some(bs), Some(be)) => {
                let mut out = Vec::with_capacity(2);
                if self.start < bs {
                    out.push((self.start, bs));
                }
                if be < self.end {
                    out.push((be, self.end));
                }
                out
            }
            _ => vec![(self.start, self.end)],
        }
    }
}

/// A staff member's weekly availability template, stored as a JSON
/// column on the staff row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyHours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mon: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tue: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wed: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thu: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fri: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sat: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sun: Option<DayHours>,
}

impl WeeklyHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: WeeklyHours = serde_json::from_str(s)?;
        hours.validate()?;
        Ok(hours)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for day in [
            &self.mon, &self.tue, &self.wed, &self.thu, &self.fri, &self.sat, &self.sun,
        ]
        .into_iter()
        .flatten()
        {
            day.validate()?;
        }
        Ok(())
    }

    pub fn for_weekday(&self, weekday: Weekday) -> Option<&DayHours> {
        match weekday {
            Weekday::Mon => self.mon.as_ref(),
            Weekday::Tue => self.tue.as_ref(),
            Weekday::Wed => self.wed.as_ref(),
            Weekday::Thu => self.thu.as_ref(),
            Weekday::Fri => self.fri.as_ref(),
            Weekday::Sat => self.sat.as_ref(),
            Weekday::Sun => self.sun.as_ref(),
        }
    }
}

/// A date-specific exception to the weekly template: the day is either
/// closed outright or runs on replacement hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateOverride {
    pub closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<DayHours>,
}

pub fn format_hhmm(minute_of_day: u16) -> String {
    format!("{:02}:{:02}", minute_of_day / 60, minute_of_day % 60)
}

pub fn parse_hhmm(s: &str) -> anyhow::Result<u16> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        anyhow::bail!("invalid time format: {s}");
    }
    let hour: u16 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u16 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        anyhow::bail!("time out of range: {s}");
    }
    Ok(hour * 60 + minute)
}
