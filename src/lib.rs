#[macro_use]
extern crate lazy_static;

pub mod api;
pub mod model;
pub mod session;
pub mod settings;

pub use api::{Error, Polling};
use model::{
    Command, CommandStates, Measurements, PoolId, Setpoint, SetpointKind, SetpointValue,
    Setpoints, Timer, TIMER_HOURS,
};
pub use session::Session;
pub use settings::Settings;

use serde_json::Value;
use std::collections::HashMap;

/// Client of the Hydrocapt pool monitoring service.
///
/// Every public operation is retried once with a fresh session before its error is
/// returned. The last fetched commands, measurements and setpoints are kept and
/// merged by [`HydrocaptClient::packaged_data`].
pub struct HydrocaptClient {
    session: Session,
    polling: Polling,
    states: CommandStates,
    measurements: Option<Measurements>,
    setpoints: Setpoints,
}

impl HydrocaptClient {
    pub fn new(settings: &Settings) -> HydrocaptClient {
        HydrocaptClient {
            session: Session::new(settings),
            polling: Polling {
                attempts: settings.poll_attempts,
                delay: settings.poll_delay(),
            },
            states: CommandStates::new(),
            measurements: None,
            setpoints: Setpoints::new(),
        }
    }

    /// Use a pool id known in advance instead of discovering it.
    pub fn with_pool_id(mut self, pool_id: PoolId) -> HydrocaptClient {
        self.session = self.session.with_pool_id(pool_id);
        self
    }

    pub async fn pool_id(&mut self) -> Result<PoolId, Error> {
        self.session
            .retry_once("pool id lookup", |s| Box::pin(s.resolve_pool_id()))
            .await
    }

    pub async fn is_connection_ok(&mut self) -> bool {
        match self.pool_id().await {
            Ok(pool_id) => pool_id >= 0,
            Err(e) => {
                log::warn!("connection check failed: {}", e);
                false
            }
        }
    }

    /// Force a new login.
    pub async fn reconnect(&mut self) -> Result<(), Error> {
        self.session.reconnect().await
    }

    pub async fn fetch_measurements(&mut self) -> Result<Measurements, Error> {
        let measurements = self
            .session
            .retry_once("measures fetch", |s| Box::pin(api::measurements(s)))
            .await?;

        self.measurements = Some(measurements.clone());
        Ok(measurements)
    }

    pub async fn fetch_command_states(&mut self) -> Result<CommandStates, Error> {
        let states = self
            .session
            .retry_once("commands fetch", |s| Box::pin(api::command_states(s)))
            .await?;

        self.states = states.clone();
        Ok(states)
    }

    /* Unknown states are sent as the command's default, as the vendor UI does */
    fn normalize_state(command: Command, state: &str) -> &'static str {
        command.state(state).unwrap_or_else(|| {
            log::warn!(
                "unknown state {:?} for {}, using {:?}",
                state,
                command,
                command.default_state()
            );
            command.default_state()
        })
    }

    /// Set one command and wait for the controller to apply it.
    ///
    /// With `retrieve_previous`, the state in place before the write is returned.
    pub async fn set_command_state(
        &mut self,
        command: Command,
        state: &str,
        retrieve_previous: bool,
    ) -> Result<Option<&'static str>, Error> {
        let state = HydrocaptClient::normalize_state(command, state);
        let polling = self.polling;

        let previous = self
            .session
            .retry_once("command save", |s| {
                Box::pin(api::set_command_state(
                    s,
                    command,
                    state,
                    polling,
                    retrieve_previous,
                ))
            })
            .await?;

        self.states.insert(command, state);
        Ok(previous)
    }

    /// Set several commands in one request and wait for all of them to be applied.
    pub async fn set_command_states(
        &mut self,
        states: &[(Command, &str)],
        retrieve_previous: bool,
    ) -> Result<Option<CommandStates>, Error> {
        let states: CommandStates = states
            .iter()
            .map(|(command, state)| (*command, HydrocaptClient::normalize_state(*command, state)))
            .collect();
        if states.is_empty() {
            return Ok(None);
        }
        let polling = self.polling;

        let previous = self
            .session
            .retry_once("commands save", |s| {
                Box::pin(api::set_command_states(
                    s,
                    states.clone(),
                    polling,
                    retrieve_previous,
                ))
            })
            .await?;

        self.states.extend(states);
        Ok(previous)
    }

    pub async fn fetch_setpoints(&mut self) -> Result<Setpoints, Error> {
        let setpoints = self
            .session
            .retry_once("setpoints fetch", |s| Box::pin(api::setpoints(s)))
            .await?;

        self.setpoints = setpoints.clone();
        Ok(setpoints)
    }

    /// Set a setpoint and wait for the controller to apply it.
    ///
    /// A value whose type does not match the setpoint is ignored and nothing is sent.
    pub async fn set_setpoint(
        &mut self,
        setpoint: Setpoint,
        value: SetpointValue,
        retrieve_previous: bool,
    ) -> Result<Option<SetpointValue>, Error> {
        if value.kind() != setpoint.kind() {
            log::warn!(
                "ignoring {:?} value for {:?} setpoint {}",
                value.kind(),
                setpoint.kind(),
                setpoint
            );
            return Ok(None);
        }
        let polling = self.polling;

        let previous = self
            .session
            .retry_once("setpoint save", |s| {
                Box::pin(api::set_setpoint(
                    s,
                    setpoint,
                    value,
                    polling,
                    retrieve_previous,
                ))
            })
            .await?;

        self.setpoints.insert(setpoint, value);
        Ok(previous)
    }

    /// Replace a whole timer. `hours` must hold exactly 24 slots, otherwise nothing is sent.
    pub async fn set_timer(
        &mut self,
        setpoint: Setpoint,
        hours: &[bool],
        retrieve_previous: bool,
    ) -> Result<Option<SetpointValue>, Error> {
        match Timer::from_slice(hours) {
            Some(timer) => {
                self.set_setpoint(setpoint, SetpointValue::Timer(timer), retrieve_previous)
                    .await
            }
            None => {
                log::warn!(
                    "ignoring {} timer of {} slots, expected {}",
                    setpoint,
                    hours.len(),
                    TIMER_HOURS
                );
                Ok(None)
            }
        }
    }

    /// Switch one hour of a timer, keeping the other 23 slots as they are.
    pub async fn set_single_timer_hour(
        &mut self,
        setpoint: Setpoint,
        hour: usize,
        on: bool,
    ) -> Result<(), Error> {
        if setpoint.kind() != SetpointKind::Timer || hour >= TIMER_HOURS {
            log::debug!("ignoring hour {} of {}", hour, setpoint);
            return Ok(());
        }

        let cached = self
            .setpoints
            .get(&setpoint)
            .and_then(SetpointValue::as_timer)
            .copied();
        let mut timer = match cached {
            Some(timer) => timer,
            None => self
                .fetch_setpoints()
                .await?
                .get(&setpoint)
                .and_then(SetpointValue::as_timer)
                .copied()
                .ok_or_else(|| Error::NoData(format!("no current value for {}", setpoint)))?,
        };

        timer.set(hour, on);
        self.set_setpoint(setpoint, SetpointValue::Timer(timer), false)
            .await
            .map(|_| ())
    }

    pub fn command_states(&self) -> &CommandStates {
        &self.states
    }

    pub fn measurements(&self) -> Option<&Measurements> {
        self.measurements.as_ref()
    }

    pub fn setpoints(&self) -> &Setpoints {
        &self.setpoints
    }

    /// Last fetched commands, measurements and setpoints, merged in that order.
    pub fn packaged_data(&self) -> HashMap<String, Value> {
        let mut data = HashMap::new();

        for (command, state) in self.states.iter() {
            data.insert(command.name().to_string(), Value::from(*state));
        }

        if let Some(Ok(Value::Object(fields))) =
            self.measurements.as_ref().map(serde_json::to_value)
        {
            data.extend(fields);
        }

        for (setpoint, value) in self.setpoints.iter() {
            if let Ok(value) = serde_json::to_value(value) {
                data.insert(setpoint.name().to_string(), value);
            }
        }

        data
    }

    /// Refresh commands, measurements and setpoints, then package them.
    pub async fn fetch_all_data(&mut self) -> Result<HashMap<String, Value>, Error> {
        self.fetch_command_states().await?;
        self.fetch_measurements().await?;
        self.fetch_setpoints().await?;
        Ok(self.packaged_data())
    }
}
