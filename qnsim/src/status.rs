use crate::CustomerId;

use std::fmt;

use itertools::Itertools;
use serde::Serialize;

/// Formats simulation time, measured in minutes, as `minutes:seconds`.
///
/// ```
/// # use qnsim::format_time;
/// assert_eq!(format_time(0.0), "0:00");
/// assert_eq!(format_time(2.5), "2:30");
/// assert_eq!(format_time(61.1), "61:06");
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_time(time: f64) -> String {
    let minutes = time.trunc();
    let seconds = ((time - minutes) * 60.0) as u64;
    format!("{}:{:02}", minutes as u64, seconds)
}

/// Presentation hints passed through to the snapshot. They do not affect the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderOptions {
    /// Font size used by a front end to display the status.
    pub font_size: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { font_size: 22 }
    }
}

/// Occupancy of a single station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationStatus {
    /// Station name.
    pub name: String,
    /// Customers in service.
    pub serving: Vec<CustomerId>,
    /// Waiting customers; only reported for stations with non-zero service rate,
    /// since nobody ever waits at an instantaneous station for long.
    pub waiting: Option<Vec<CustomerId>>,
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}]", self.name, self.serving.iter().format(", "))?;
        if let Some(waiting) = &self.waiting {
            write!(f, "  waiting: [{}]", waiting.iter().format(", "))?;
        }
        Ok(())
    }
}

/// Current time and occupancy of all stations, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Simulation time.
    pub time: f64,
    /// See [`RenderOptions`].
    pub font_size: u32,
    /// Per-station occupancy.
    pub stations: Vec<StationStatus>,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Time: {}", format_time(self.time))?;
        for station in &self.stations {
            write!(f, "\n{}", station)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest(
        time,
        expected,
        case(0.0, "0:00"),
        case(0.1, "0:06"),
        case(0.999, "0:59"),
        case(1.0, "1:00"),
        case(12.75, "12:45")
    )]
    fn test_format_time(time: f64, expected: &str) {
        assert_eq!(format_time(time), expected);
    }

    #[test]
    fn test_display() {
        let snapshot = StatusSnapshot {
            time: 1.5,
            font_size: 22,
            stations: vec![
                StationStatus {
                    name: String::from("Eingang"),
                    serving: vec![CustomerId::from(3)],
                    waiting: None,
                },
                StationStatus {
                    name: String::from("Theke"),
                    serving: vec![CustomerId::from(1)],
                    waiting: Some(vec![CustomerId::from(2), CustomerId::from(4)]),
                },
            ],
        };
        assert_eq!(
            snapshot.to_string(),
            "Time: 1:30\nEingang: [K_3]\nTheke: [K_1]  waiting: [K_2, K_4]"
        );
    }
}
