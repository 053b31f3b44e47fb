pub mod endpoint;
pub mod error;
pub mod response;

use crate::model::{
    Command, CommandStates, Measurements, PoolId, Setpoint, SetpointValue, Setpoints, Status,
};
use crate::session::Session;
use chrono::NaiveDate;
pub use error::Error;
use futures::future::BoxFuture;
use response::{alarms, datas, historic, SaveStatus};
use std::time::Duration;

/// How long to wait for the controller to apply a saved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polling {
    pub attempts: u32,
    pub delay: Duration,
}

fn serial(pool_id: PoolId) -> (&'static str, String) {
    ("serial", pool_id.to_string())
}

async fn historic_values(
    session: &mut Session,
    pool_id: PoolId,
    today: NaiveDate,
) -> Result<historic::HistoricValues, Error> {
    let query = [
        serial(pool_id),
        ("date", today.format("%Y-%m-%d").to_string()),
        ("type_date", String::from("day")),
    ];

    let text = session.get(endpoint::VALUES_HISTORY, &query).await?;
    historic::parse(&text)
}

/// Alarm thresholds configured for the pool.
pub async fn alarm_thresholds(session: &mut Session, pool_id: PoolId) -> Result<alarms::Alarms, Error> {
    let referer = format!("{}?serial={}", session.url(endpoint::POOL_HISTORIC), pool_id);
    let form = [serial(pool_id)];

    let text = session
        .post(endpoint::GET_ALARMS, &form, Some(referer.as_str()))
        .await?;
    alarms::parse(&text)
}

/// Latest readings of today, with their alarm status.
pub async fn measurements(session: &mut Session) -> Result<Measurements, Error> {
    let pool_id = session.resolve_pool_id().await?;
    let today = chrono::Local::now().date_naive();

    let mut historic = historic_values(session, pool_id, today).await?;
    if !historic.is_usable() {
        log::warn!("no usable measures for pool {}, logging in again", pool_id);
        session.reconnect().await?;
        historic = historic_values(session, pool_id, today).await?;
    }

    if historic.records.is_empty() {
        return Err(Error::NoData(String::from("no data records from pool")));
    }

    let readings = historic::readings(&historic, today)?;
    let alarms = alarm_thresholds(session, pool_id).await?;

    Ok(Measurements {
        water_temperature: readings.water_temperature,
        technical_room_temperature: readings.technical_room_temperature,
        ph: readings.ph,
        conductivity: readings.conductivity,
        red_ox: readings.red_ox,
        date_time: readings.date_time,
        ph_status: Status::evaluate(readings.ph, alarms.get("PH")),
        conductivity_status: Status::evaluate(readings.conductivity, alarms.get("CONDUCTIVITY")),
        red_ox_status: Status::evaluate(readings.red_ox, alarms.get("ORP")),
    })
}

/// Current state of every command the controller reports.
pub async fn command_states(session: &mut Session) -> Result<CommandStates, Error> {
    let pool_id = session.resolve_pool_id().await?;

    let text = session
        .get(endpoint::GET_COMMANDS, &[serial(pool_id)])
        .await?;
    let states = datas::command_states(&text)?;

    if states.is_empty() {
        return Err(Error::NoData(String::from("no command state")));
    }
    Ok(states)
}

/// Current value of every setpoint the controller reports.
pub async fn setpoints(session: &mut Session) -> Result<Setpoints, Error> {
    let pool_id = session.resolve_pool_id().await?;

    let text = session
        .get(endpoint::GET_SETPOINTS, &[serial(pool_id)])
        .await?;
    let setpoints = datas::setpoints(&text)?;

    if setpoints.is_empty() {
        return Err(Error::NoData(String::from("no setpoint")));
    }
    Ok(setpoints)
}

/// Re-read with `fetch` until `applied` holds, at most `polling.attempts` times.
async fn wait_applied<T, F, P>(
    session: &mut Session,
    polling: Polling,
    what: &str,
    mut fetch: F,
    applied: P,
) -> Result<T, Error>
where
    F: for<'s> FnMut(&'s mut Session) -> BoxFuture<'s, Result<T, Error>>,
    P: Fn(&T) -> bool,
{
    for attempt in 1..=polling.attempts {
        let current = fetch(&mut *session).await?;
        if applied(&current) {
            log::debug!("{} applied after {} read(s)", what, attempt);
            return Ok(current);
        }

        if attempt < polling.attempts {
            tokio::time::sleep(polling.delay).await;
        }
    }

    Err(Error::WriteNotApplied(format!(
        "{} still not applied after {} reads",
        what, polling.attempts
    )))
}

/// Save `states` in a single request and wait until the controller reports them.
///
/// Returns the states in place before the write when `retrieve_previous` is set. When the
/// vendor answers that nothing changed, the requested states are returned instead.
pub async fn set_command_states(
    session: &mut Session,
    states: CommandStates,
    polling: Polling,
    retrieve_previous: bool,
) -> Result<Option<CommandStates>, Error> {
    let pool_id = session.resolve_pool_id().await?;

    let previous = if retrieve_previous {
        let current = command_states(session).await?;
        Some(
            current
                .into_iter()
                .filter(|(command, _)| states.contains_key(command))
                .collect::<CommandStates>(),
        )
    } else {
        None
    };

    let mut form: Vec<(&str, String)> = states
        .iter()
        .map(|(command, state)| (command.field(), command.encode(state).to_string()))
        .collect();
    form.push(serial(pool_id));

    let referer = session.url(endpoint::POOL_LIST_OWN);
    let text = session
        .post(endpoint::SAVE_COMMANDS, &form, Some(referer.as_str()))
        .await?;

    if response::save_status(&text)? == SaveStatus::NoModification {
        log::debug!("commands already in requested state");
        return Ok(previous.or(Some(states)));
    }

    wait_applied(
        session,
        polling,
        "command change",
        |s| Box::pin(command_states(s)),
        |current: &CommandStates| {
            states
                .iter()
                .all(|(command, state)| current.get(command) == Some(state))
        },
    )
    .await?;

    Ok(previous)
}

/// Convenience wrapper around [`set_command_states`] for one command.
pub async fn set_command_state(
    session: &mut Session,
    command: Command,
    state: &'static str,
    polling: Polling,
    retrieve_previous: bool,
) -> Result<Option<&'static str>, Error> {
    let states: CommandStates = vec![(command, state)].into_iter().collect();

    set_command_states(session, states, polling, retrieve_previous)
        .await
        .map(|previous| previous.and_then(|p| p.get(&command).copied()))
}

/// Save one setpoint and wait until the controller reports it.
pub async fn set_setpoint(
    session: &mut Session,
    setpoint: Setpoint,
    value: SetpointValue,
    polling: Polling,
    retrieve_previous: bool,
) -> Result<Option<SetpointValue>, Error> {
    let pool_id = session.resolve_pool_id().await?;

    let previous = if retrieve_previous {
        setpoints(session).await?.get(&setpoint).copied()
    } else {
        None
    };

    let form = [(setpoint.field(), value.encode()), serial(pool_id)];
    let text = session
        .post(endpoint::SAVE_SETPOINTS, &form, None)
        .await?;

    if response::save_status(&text)? == SaveStatus::NoModification {
        log::debug!("{} already at requested value", setpoint);
        return Ok(previous.or(Some(value)));
    }

    wait_applied(
        session,
        polling,
        setpoint.name(),
        |s| Box::pin(setpoints(s)),
        |current: &Setpoints| current.get(&setpoint) == Some(&value),
    )
    .await?;

    Ok(previous)
}
