use super::{parse_xml, status_text, NOT_AUTHENTICATED, STATUS_OK};
use crate::api::Error;
use crate::model::Alarm;
use roxmltree::Node;
use std::collections::HashMap;

/// Alarm thresholds keyed by the vendor quantity name (`PH`, `ORP`, `CONDUCTIVITY`).
pub type Alarms = HashMap<String, Alarm>;

fn parse_flag(text: Option<&str>) -> bool {
    match text.map(str::trim) {
        None | Some("") | Some("0") => false,
        Some(t) => !t.eq_ignore_ascii_case("false"),
    }
}

/* `None` when a threshold is present but not a number */
fn parse_alarm(node: Node) -> Option<Alarm> {
    let mut alarm = Alarm::default();

    for c in node.children().filter(|n| n.is_element()) {
        match c.tag_name().name() {
            "min" => alarm.min = Some(c.text()?.trim().parse().ok()?),
            "max" => alarm.max = Some(c.text()?.trim().parse().ok()?),
            "enable" => alarm.enable = parse_flag(c.text()),
            _ => {}
        }
    }

    Some(alarm)
}

pub fn parse(text: &str) -> Result<Alarms, Error> {
    let doc = parse_xml(text)?;

    match status_text(&doc) {
        Some(status) if status.contains(NOT_AUTHENTICATED) => return Err(Error::NotAuthenticated),
        Some(status) if status.contains(STATUS_OK) => {}
        Some(status) => return Err(Error::ApiError(format!("alarms status: {}", status))),
        None => {
            return Err(Error::InvalidResponse(
                text.to_string(),
                String::from("missing status"),
            ))
        }
    }

    let alarms = doc
        .root_element()
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "alarm")
        .filter_map(|n| {
            let name = n.attribute("name")?;
            match parse_alarm(n) {
                Some(alarm) => Some((name.to_string(), alarm)),
                None => {
                    log::debug!("discarding unparsable alarm {}", name);
                    None
                }
            }
        })
        .collect();

    Ok(alarms)
}
