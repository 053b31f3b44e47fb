use crate::api::Error;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

/// Number of slots in an hourly record (midnight to midnight, both included).
pub const HOURLY_SLOTS: usize = 25;

const NO_DATA_MARKERS: [&str; 4] = ["--", "--.-", "-.-", "---"];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default)]
    pub type_info: Option<String>,
    #[serde(default)]
    pub values: Vec<Value>,
}

/* Payload of `getJsonValues` */
#[derive(Deserialize)]
pub struct HistoricValues {
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl HistoricValues {
    /// `false` when the vendor flagged an error or returned no records.
    pub fn is_usable(&self) -> bool {
        self.error.is_none() && self.errors.is_none() && !self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sensor {
    WaterTemp,
    AirTemp,
    Ph,
    Conductivity,
    Orp,
}

impl Sensor {
    fn from_type_info(type_info: &str) -> Option<Sensor> {
        match type_info {
            "WATER_TEMP" => Some(Sensor::WaterTemp),
            "AIR_TEMP" => Some(Sensor::AirTemp),
            "PH" => Some(Sensor::Ph),
            "CONDUCTIVITY" => Some(Sensor::Conductivity),
            "ORP" => Some(Sensor::Orp),
            _ => None,
        }
    }
}

/// Latest value of every channel, timestamped by the pH channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Readings {
    pub water_temperature: Option<f64>,
    pub technical_room_temperature: Option<f64>,
    pub ph: Option<f64>,
    pub conductivity: Option<f64>,
    pub red_ox: Option<f64>,
    pub date_time: NaiveDateTime,
}

pub fn parse(text: &str) -> Result<HistoricValues, Error> {
    serde_json::from_str(text).map_err(|e| Error::InvalidResponse(text.to_string(), e.to_string()))
}

fn slot_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if NO_DATA_MARKERS.contains(&s.trim()) => None,
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Scan from the latest hour backward; returns the hour index and the value.
fn latest_valid(values: &[Value]) -> Option<(usize, f64)> {
    values
        .iter()
        .enumerate()
        .rev()
        .find_map(|(hour, value)| slot_value(value).map(|v| (hour, v)))
}

const DATE_TIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M",
];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/* Offsets are dropped: the vendor reports local pool time */
fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.naive_local())
        .ok()
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Extract the latest readings. `today` stands in for a missing `DATE` record.
pub fn readings(historic: &HistoricValues, today: NaiveDate) -> Result<Readings, Error> {
    let (mut water_temperature, mut technical_room_temperature) = (None, None);
    let (mut ph, mut conductivity, mut red_ox) = (None, None, None);
    let mut measure_hour = 0;
    let mut dates: Option<&[Value]> = None;

    for record in historic.records.iter() {
        let type_info = match record.type_info.as_deref() {
            Some(t) => t,
            None => continue,
        };

        if type_info == "DATE" {
            dates = Some(record.values.as_slice());
            continue;
        }

        let sensor = match Sensor::from_type_info(type_info) {
            Some(s) => s,
            None => continue,
        };
        let latest = latest_valid(&record.values);
        let value = latest.map(|(_, v)| v);

        match sensor {
            Sensor::WaterTemp => water_temperature = value,
            Sensor::AirTemp => technical_room_temperature = value,
            Sensor::Conductivity => conductivity = value,
            Sensor::Orp => red_ox = value,
            Sensor::Ph => {
                ph = value;
                if let Some((hour, _)) = latest {
                    measure_hour = hour;
                }
            }
        }
    }

    let date = match dates.and_then(|d| d.get(measure_hour)) {
        Some(Value::String(raw)) => parse_date(raw).ok_or_else(|| {
            Error::InvalidResponse(raw.to_owned(), String::from("unrecognized date"))
        })?,
        _ => today
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| Error::InternalError(String::from("invalid midnight")))?,
    };

    Ok(Readings {
        water_temperature,
        technical_room_temperature,
        ph,
        conductivity,
        red_ox,
        date_time: date + Duration::hours(measure_hour as i64),
    })
}
