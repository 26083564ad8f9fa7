use serde::{Deserialize, Serialize};

/// Format of the timestamp column in the pressure log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Unit appended to every logged value. The gauge reports mbar by convention,
/// nothing checks it.
pub const PRESSURE_UNIT: &str = "mbar";

/// A scalar value read from the server.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum Measurement {
    Float(f64),
    Integer(i64),
    Unsigned(u64),
    Boolean(bool),
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Vacuum readings go down to 1e-9 mbar, print those in scientific notation.
            Self::Float(value) => {
                let magnitude = value.abs();
                if value.is_finite() && magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
                    write!(f, "{value:e}")
                } else {
                    write!(f, "{value}")
                }
            }
            Self::Integer(value) => write!(f, "{value}"),
            Self::Unsigned(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
        }
    }
}

/// One poll of the pressure node: when it was taken and what was read.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub timestamp: chrono::NaiveDateTime,
    pub value: Measurement,
}

impl Reading {
    /// Stamps `value` with the current local time, truncated to whole seconds.
    pub fn now(value: Measurement) -> Self {
        use chrono::Timelike;

        let now = chrono::Local::now().naive_local();
        Self {
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            value,
        }
    }

    /// The timestamp as `YYYY-MM-DD HH:MM:SS`.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// An entry of the server's address space as shown by the node browser.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeEntry {
    /// String form of the node id, e.g. `ns=1;s=G1_pressure`.
    pub node_id: String,
    /// Namespace qualified browse name, e.g. `1:G1_pressure`.
    pub browse_name: String,
    pub display_name: String,
}

impl std::fmt::Display for NodeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_float_display() {
        assert_eq!(Measurement::Float(1013.25).to_string(), "1013.25");
        assert_eq!(Measurement::Float(0.00123).to_string(), "0.00123");
        assert_eq!(Measurement::Float(5.2e-7).to_string(), "5.2e-7");
        assert_eq!(Measurement::Float(0.0).to_string(), "0");
        assert_eq!(Measurement::Float(2.5e17).to_string(), "2.5e17");
        assert_eq!(Measurement::Float(1e-4).to_string(), "0.0001");
        assert_eq!(Measurement::Float(9.9e-5).to_string(), "9.9e-5");
        assert_eq!(Measurement::Float(1e16).to_string(), "1e16");
        assert_eq!(Measurement::Float(-1e-4).to_string(), "-0.0001");
    }

    #[test]
    fn test_other_display() {
        assert_eq!(Measurement::Integer(-42).to_string(), "-42");
        assert_eq!(Measurement::Unsigned(7).to_string(), "7");
        assert_eq!(Measurement::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_timestamp_string() {
        let reading = Reading {
            timestamp: NaiveDate::from_ymd_opt(2025, 2, 18)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            value: Measurement::Float(1.0),
        };

        assert_eq!(reading.timestamp_string(), "2025-02-18 10:00:00");
    }

    #[test]
    fn test_reading_now_has_whole_seconds() {
        use chrono::Timelike;

        let reading = Reading::now(Measurement::Integer(1));
        assert_eq!(reading.timestamp.nanosecond(), 0);
        assert_eq!(reading.timestamp_string().len(), 19);
    }

    #[test]
    fn test_measurement_json() {
        let value: Measurement = serde_json::from_str(r#"{"Float": 0.00123}"#).unwrap();
        assert_eq!(value, Measurement::Float(0.00123));

        let node: NodeEntry = serde_json::from_str(
            r#"{"node_id": "i=85", "browse_name": "0:Objects", "display_name": "Objects"}"#,
        )
        .unwrap();
        assert_eq!(node.to_string(), "i=85");
    }
}
