use super::{check_authenticated, child, parse_xml};
use crate::api::Error;
use crate::model::{Command, CommandStates, Setpoint, SetpointValue, Setpoints};
use roxmltree::{Document, Node};

/* Setpoints live under one of these parents depending on their kind */
const SETPOINT_PARENTS: [&str; 2] = ["select", "timer"];

fn datas<'a, 'input>(doc: &'a Document<'input>) -> Option<Node<'a, 'input>> {
    child(doc.root_element(), "datas")
}

/// Parse `ajaxCommands/get`. Fields absent from the payload are omitted.
pub fn command_states(text: &str) -> Result<CommandStates, Error> {
    let doc = parse_xml(text)?;
    check_authenticated(&doc)?;

    let datas = match datas(&doc) {
        Some(node) => node,
        None => return Ok(CommandStates::new()),
    };

    let states = Command::ALL
        .iter()
        .filter_map(|command| {
            let code = child(datas, command.field())?
                .text()?
                .trim()
                .parse::<i64>()
                .ok()?;
            Some((*command, command.decode(code)))
        })
        .collect();

    Ok(states)
}

fn setpoint_node<'a, 'input>(datas: Node<'a, 'input>, field: &str) -> Option<Node<'a, 'input>> {
    SETPOINT_PARENTS
        .iter()
        .filter_map(|parent| child(datas, parent))
        .find_map(|parent| child(parent, field))
}

/// Parse `ajaxSetpoints/get`. Absent or undecodable setpoints are omitted.
pub fn setpoints(text: &str) -> Result<Setpoints, Error> {
    let doc = parse_xml(text)?;
    check_authenticated(&doc)?;

    let datas = match datas(&doc) {
        Some(node) => node,
        None => return Ok(Setpoints::new()),
    };

    let setpoints = Setpoint::ALL
        .iter()
        .filter_map(|setpoint| {
            let raw = setpoint_node(datas, setpoint.field())?.text()?;
            match SetpointValue::decode(setpoint.kind(), raw) {
                Some(value) => Some((*setpoint, value)),
                None => {
                    log::debug!("ignoring {} value {:?}", setpoint.field(), raw);
                    None
                }
            }
        })
        .collect();

    Ok(setpoints)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::response::read_resource;
    use crate::model::Timer;

    #[test]
    fn get_commands() {
        let states = command_states(&read_resource("commands.xml")).unwrap();
        assert_eq!(Some(&"Filtration TIMER"), states.get(&Command::Filtration));
        assert_eq!(Some(&"Pool Light OFF"), states.get(&Command::Light));
        assert_eq!(Some(&"Pool Heat AUTO"), states.get(&Command::HeatingRegulation));
        assert_eq!(Some(&"pH Regulation AUTO"), states.get(&Command::PhRegulation));
        /* orp_regulation is missing from the fixture */
        assert_eq!(None, states.get(&Command::RedoxRegulation));
    }

    #[test]
    fn unknown_code_decodes_to_default() {
        let states =
            command_states("<root><datas><lighting>9</lighting><filtration>x</filtration></datas></root>")
                .unwrap();
        assert_eq!(Some(&"Pool Light OFF"), states.get(&Command::Light));
        assert_eq!(None, states.get(&Command::Filtration));
    }

    #[test]
    fn commands_not_authenticated() {
        assert!(matches!(
            command_states(&read_resource("not_authenticated.xml")),
            Err(Error::NotAuthenticated)
        ));
    }

    #[test]
    fn get_setpoints() {
        let setpoints = setpoints(&read_resource("setpoints.xml")).unwrap();
        assert_eq!(
            Some(&SetpointValue::Integer(28)),
            setpoints.get(&Setpoint::Heating)
        );
        assert_eq!(
            Some(&SetpointValue::Timer(
                Timer::decode("000000001111111111000000").unwrap()
            )),
            setpoints.get(&Setpoint::FiltrationTimer)
        );
        /* timer_lighting has 23 slots in the fixture */
        assert_eq!(None, setpoints.get(&Setpoint::LightingTimer));
    }
}
