use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub type PoolId = i64;

/// Number of hourly slots in a timer schedule.
pub const TIMER_HOURS: usize = 24;

/// Device command exposed by the pool controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    Filtration,
    Light,
    HeatingRegulation,
    PhRegulation,
    RedoxRegulation,
}

struct CommandEntry {
    name: &'static str,
    field: &'static str,
    /* external state name -> internal code */
    states: &'static [(&'static str, i64)],
    default: &'static str,
}

/* Indexed by `Command as usize` */
const COMMANDS: [CommandEntry; 5] = [
    CommandEntry {
        name: "Filtration",
        field: "filtration",
        states: &[
            ("Filtration OFF", 2),
            ("Filtration ON", 1),
            ("Filtration TIMER", 3),
            ("Filtration AUTO", 0),
            ("Filtration CHOC", 4),
        ],
        default: "Filtration AUTO",
    },
    CommandEntry {
        name: "Light",
        field: "lighting",
        states: &[
            ("Pool Light OFF", 2),
            ("Pool Light TIMER", 1),
            ("Pool Light ON", 0),
        ],
        default: "Pool Light OFF",
    },
    CommandEntry {
        name: "Heating Regulation",
        field: "heating_regulation",
        states: &[("Pool Heat OFF", 1), ("Pool Heat AUTO", 0)],
        default: "Pool Heat OFF",
    },
    CommandEntry {
        name: "pH Regulation",
        field: "ph_regulation",
        states: &[("pH Regulation OFF", 1), ("pH Regulation AUTO", 0)],
        default: "pH Regulation AUTO",
    },
    CommandEntry {
        name: "Redox Regulation",
        field: "orp_regulation",
        states: &[("redox Regulation OFF", 1), ("redox Regulation AUTO", 0)],
        default: "redox Regulation AUTO",
    },
];

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Filtration,
        Command::Light,
        Command::HeatingRegulation,
        Command::PhRegulation,
        Command::RedoxRegulation,
    ];

    fn entry(&self) -> &'static CommandEntry {
        &COMMANDS[*self as usize]
    }

    /// External name, e.g. `"Filtration"`.
    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    /// Vendor form/XML field name, e.g. `"filtration"`.
    pub fn field(&self) -> &'static str {
        self.entry().field
    }

    pub fn from_name(name: &str) -> Option<Command> {
        Command::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn from_field(field: &str) -> Option<Command> {
        Command::ALL.iter().copied().find(|c| c.field() == field)
    }

    pub fn default_state(&self) -> &'static str {
        self.entry().default
    }

    /// External states accepted by this command, default first.
    pub fn states(&self) -> Vec<&'static str> {
        let entry = self.entry();
        let mut states = vec![entry.default];
        states.extend(
            entry
                .states
                .iter()
                .map(|(name, _)| *name)
                .filter(|name| *name != entry.default),
        );
        states
    }

    /// Canonical `'static` form of an external state, if it belongs to this command.
    pub fn state(&self, external: &str) -> Option<&'static str> {
        self.entry()
            .states
            .iter()
            .find(|(name, _)| *name == external)
            .map(|(name, _)| *name)
    }

    /// Internal code for `external`; unknown states map to the default state's code.
    pub fn encode(&self, external: &str) -> i64 {
        let entry = self.entry();
        let lookup = |state: &str| {
            entry
                .states
                .iter()
                .find(|(name, _)| *name == state)
                .map(|(_, code)| *code)
        };
        lookup(external)
            .or_else(|| lookup(entry.default))
            .unwrap_or_default()
    }

    /// External state for an internal code; unknown codes map to the default state.
    pub fn decode(&self, code: i64) -> &'static str {
        let entry = self.entry();
        entry
            .states
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(name, _)| *name)
            .unwrap_or(entry.default)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type CommandStates = BTreeMap<Command, &'static str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetpointKind {
    Integer,
    Float,
    Timer,
}

/// Setpoint ("consign") exposed by the pool controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Setpoint {
    Heating,
    FiltrationTimer,
    LightingTimer,
}

impl Setpoint {
    pub const ALL: [Setpoint; 3] = [
        Setpoint::Heating,
        Setpoint::FiltrationTimer,
        Setpoint::LightingTimer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Setpoint::Heating => "setpoint_heating",
            Setpoint::FiltrationTimer => "Filtration Timer",
            Setpoint::LightingTimer => "Lighting Timer",
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Setpoint::Heating => "setpoint_heating",
            Setpoint::FiltrationTimer => "timer_filtration",
            Setpoint::LightingTimer => "timer_lighting",
        }
    }

    pub fn kind(&self) -> SetpointKind {
        match self {
            Setpoint::Heating => SetpointKind::Integer,
            Setpoint::FiltrationTimer | Setpoint::LightingTimer => SetpointKind::Timer,
        }
    }

    /// Device driven by the setpoint, as labelled in the vendor UI.
    pub fn device_label(&self) -> &'static str {
        match self {
            Setpoint::Heating => "Heat",
            Setpoint::FiltrationTimer => "Filtration",
            Setpoint::LightingTimer => "Pool Light",
        }
    }

    pub fn from_name(name: &str) -> Option<Setpoint> {
        Setpoint::ALL.iter().copied().find(|s| s.name() == name)
    }

    pub fn from_field(field: &str) -> Option<Setpoint> {
        Setpoint::ALL.iter().copied().find(|s| s.field() == field)
    }
}

impl fmt::Display for Setpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 24-hour on/off schedule, one slot per hour of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timer([bool; TIMER_HOURS]);

impl Timer {
    /// Returns `None` unless `hours` has exactly 24 elements.
    pub fn from_slice(hours: &[bool]) -> Option<Timer> {
        let mut slots = [false; TIMER_HOURS];
        if hours.len() != TIMER_HOURS {
            return None;
        }
        slots.copy_from_slice(hours);
        Some(Timer(slots))
    }

    /// Decode the vendor `'0'`/`'1'` string. Any other length or character is rejected.
    pub fn decode(raw: &str) -> Option<Timer> {
        let raw = raw.trim();
        if raw.chars().count() != TIMER_HOURS {
            return None;
        }
        let mut slots = [false; TIMER_HOURS];
        for (slot, c) in slots.iter_mut().zip(raw.chars()) {
            *slot = match c {
                '1' => true,
                '0' => false,
                _ => return None,
            };
        }
        Some(Timer(slots))
    }

    pub fn encode(&self) -> String {
        self.0.iter().map(|on| if *on { '1' } else { '0' }).collect()
    }

    pub fn hours(&self) -> &[bool; TIMER_HOURS] {
        &self.0
    }

    pub fn is_on(&self, hour: usize) -> Option<bool> {
        self.0.get(hour).copied()
    }

    /// Returns `false` when `hour` is outside `[0, 24)`.
    pub fn set(&mut self, hour: usize, on: bool) -> bool {
        match self.0.get_mut(hour) {
            Some(slot) => {
                *slot = on;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SetpointValue {
    Integer(i64),
    Float(f64),
    Timer(Timer),
}

impl SetpointValue {
    pub fn kind(&self) -> SetpointKind {
        match self {
            SetpointValue::Integer(_) => SetpointKind::Integer,
            SetpointValue::Float(_) => SetpointKind::Float,
            SetpointValue::Timer(_) => SetpointKind::Timer,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            SetpointValue::Integer(v) => v.to_string(),
            SetpointValue::Float(v) => v.to_string(),
            SetpointValue::Timer(t) => t.encode(),
        }
    }

    pub fn decode(kind: SetpointKind, raw: &str) -> Option<SetpointValue> {
        let raw = raw.trim();
        match kind {
            SetpointKind::Integer => raw
                .parse::<i64>()
                .ok()
                .or_else(|| {
                    raw.parse::<f64>()
                        .ok()
                        .filter(|v| v.fract() == 0.0)
                        .map(|v| v as i64)
                })
                .map(SetpointValue::Integer),
            SetpointKind::Float => raw.parse::<f64>().ok().map(SetpointValue::Float),
            SetpointKind::Timer => Timer::decode(raw).map(SetpointValue::Timer),
        }
    }

    pub fn as_timer(&self) -> Option<&Timer> {
        match self {
            SetpointValue::Timer(t) => Some(t),
            _ => None,
        }
    }
}

pub type Setpoints = BTreeMap<Setpoint, SetpointValue>;

/// Vendor-configured alarm thresholds for one monitored quantity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Alarm {
    pub enable: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    TooLow,
    #[serde(rename = "OK")]
    Ok,
    TooHigh,
}

impl Status {
    /// Compare `value` against `alarm`. No value or no alarm is `Ok`.
    pub fn evaluate(value: Option<f64>, alarm: Option<&Alarm>) -> Status {
        match (value, alarm) {
            (Some(v), Some(alarm)) => {
                if alarm.min.map_or(false, |min| v < min) {
                    Status::TooLow
                } else if alarm.max.map_or(false, |max| v > max) {
                    Status::TooHigh
                } else {
                    Status::Ok
                }
            }
            _ => Status::Ok,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::TooLow => "TooLow",
            Status::Ok => "OK",
            Status::TooHigh => "TooHigh",
        })
    }
}

/// Latest sensor readings of the pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_room_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conductivity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_ox: Option<f64>,
    pub date_time: NaiveDateTime,
    pub ph_status: Status,
    pub conductivity_status: Status,
    pub red_ox_status: Status,
}
