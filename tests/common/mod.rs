//! In-process fake of the Hydrocapt web application.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Form, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use hydrocapt_rs::{HydrocaptClient, Settings};
use tokio::net::TcpListener;

pub const USERNAME: &str = "pool@example.com";
pub const PASSWORD: &str = "secret";
pub const POOL_ID: &str = "4242";

const HISTORY: &str = include_str!("../../resources/test/getJsonValues.json");

const ALARMS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
  <status>OK</status>
  <alarm name="PH"><max>7.6</max><min>6.8</min><enable>1</enable></alarm>
  <alarm name="ORP"><max>800</max><min>650</min><enable>1</enable></alarm>
  <alarm name="CONDUCTIVITY"><max>1000</max><min>500</min><enable>1</enable></alarm>
</root>"#;

/// How the fake answers save requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Apply,
    NoModification,
    /// Acknowledge the save but never apply it.
    Ignore,
    NotAuthenticated,
}

pub struct Backend {
    pub commands: BTreeMap<String, i64>,
    pub setpoints: BTreeMap<String, String>,
    pub history: String,
    pub save_mode: SaveMode,
    pub logins: u32,
    pub pool_page_reads: u32,
    pub command_reads: u32,
    pub setpoint_reads: u32,
    pub history_reads: u32,
    /// Number of upcoming command reads answered with a 500.
    pub command_read_failures: u32,
    /// Number of upcoming command saves answered with a 500.
    pub command_save_failures: u32,
    /// Number of upcoming history reads answered with an error payload.
    pub history_failures: u32,
    pub command_saves: Vec<HashMap<String, String>>,
    pub setpoint_saves: Vec<HashMap<String, String>>,
}

impl Default for Backend {
    fn default() -> Self {
        let commands = [
            ("filtration", 0),
            ("lighting", 2),
            ("heating_regulation", 1),
            ("ph_regulation", 0),
            ("orp_regulation", 0),
        ]
        .iter()
        .map(|(field, code)| (field.to_string(), *code))
        .collect();

        let setpoints = [
            ("setpoint_heating", "28"),
            ("timer_filtration", "000000001111111111000000"),
            ("timer_lighting", "000000000000000000011110"),
        ]
        .iter()
        .map(|(field, raw)| (field.to_string(), raw.to_string()))
        .collect();

        Backend {
            commands,
            setpoints,
            history: HISTORY.to_string(),
            save_mode: SaveMode::Apply,
            logins: 0,
            pool_page_reads: 0,
            command_reads: 0,
            setpoint_reads: 0,
            history_reads: 0,
            command_read_failures: 0,
            command_save_failures: 0,
            history_failures: 0,
            command_saves: Vec::new(),
            setpoint_saves: Vec::new(),
        }
    }
}

type Shared = Arc<Mutex<Backend>>;

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], body).into_response()
}

fn status(text: &str) -> Response {
    xml(format!("<root><status>{}</status></root>", text))
}

async fn login(State(backend): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    let mut backend = backend.lock().unwrap();
    backend.logins += 1;

    let valid = form.get("login").map(String::as_str) == Some(USERNAME)
        && form.get("pass").map(String::as_str) == Some(PASSWORD);
    if !valid {
        return StatusCode::FORBIDDEN.into_response();
    }

    (
        [(header::SET_COOKIE, "PHPSESSID=fake-session; Path=/")],
        "<html><body>Bienvenue</body></html>",
    )
        .into_response()
}

async fn pool_edit(State(backend): State<Shared>) -> Response {
    backend.lock().unwrap().pool_page_reads += 1;

    let page = format!(
        "<html><body><form><input type=\"hidden\" name=\"serial\" value=\"{}\"/></form></body></html>",
        POOL_ID
    );
    ([(header::CONTENT_TYPE, "text/html")], page).into_response()
}

async fn history(State(backend): State<Shared>, Query(query): Query<HashMap<String, String>>) -> Response {
    if query.get("serial").map(String::as_str) != Some(POOL_ID) {
        return ([(header::CONTENT_TYPE, "application/json")], r#"{"error": "bad serial"}"#)
            .into_response();
    }

    let mut backend = backend.lock().unwrap();
    backend.history_reads += 1;
    if backend.history_failures > 0 {
        backend.history_failures -= 1;
        return ([(header::CONTENT_TYPE, "application/json")], r#"{"error": "session expired", "records": []}"#)
            .into_response();
    }

    let body = backend.history.clone();
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn alarms(Form(form): Form<HashMap<String, String>>) -> Response {
    match form.get("serial").map(String::as_str) {
        Some(POOL_ID) => xml(ALARMS.to_string()),
        _ => status("Erreur"),
    }
}

async fn get_commands(State(backend): State<Shared>) -> Response {
    let mut backend = backend.lock().unwrap();
    if backend.command_read_failures > 0 {
        backend.command_read_failures -= 1;
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    backend.command_reads += 1;

    let datas: String = backend
        .commands
        .iter()
        .map(|(field, code)| format!("<{0}>{1}</{0}>", field, code))
        .collect();
    xml(format!(
        "<root><status>OK</status><datas>{}<type_aux1>0</type_aux1></datas></root>",
        datas
    ))
}

fn save_answer(mode: SaveMode) -> Response {
    match mode {
        SaveMode::Apply | SaveMode::Ignore => status("OK"),
        SaveMode::NoModification => status("Pas de modification"),
        SaveMode::NotAuthenticated => status("You are not authenticated"),
    }
}

async fn save_commands(
    State(backend): State<Shared>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut backend = backend.lock().unwrap();
    if backend.command_save_failures > 0 {
        backend.command_save_failures -= 1;
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    backend.command_saves.push(form.clone());

    if backend.save_mode == SaveMode::Apply {
        for (field, value) in form.iter().filter(|(field, _)| *field != "serial") {
            if let Ok(code) = value.parse() {
                backend.commands.insert(field.clone(), code);
            }
        }
    }
    save_answer(backend.save_mode)
}

async fn get_setpoints(State(backend): State<Shared>) -> Response {
    let mut backend = backend.lock().unwrap();
    backend.setpoint_reads += 1;

    let (timers, selects): (Vec<_>, Vec<_>) = backend
        .setpoints
        .iter()
        .partition(|(field, _)| field.starts_with("timer_"));
    let render = |entries: Vec<(&String, &String)>| -> String {
        entries
            .iter()
            .map(|(field, raw)| format!("<{0}>{1}</{0}>", field, raw))
            .collect()
    };

    xml(format!(
        "<root><status>OK</status><datas><select>{}</select><timer>{}</timer></datas></root>",
        render(selects),
        render(timers)
    ))
}

async fn save_setpoints(
    State(backend): State<Shared>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut backend = backend.lock().unwrap();
    backend.setpoint_saves.push(form.clone());

    if backend.save_mode == SaveMode::Apply {
        for (field, value) in form.iter().filter(|(field, _)| *field != "serial") {
            backend.setpoints.insert(field.clone(), value.clone());
        }
    }
    save_answer(backend.save_mode)
}

/// Fake server bound to an ephemeral port; shut down when dropped.
pub struct FakeHydrocapt {
    pub addr: SocketAddr,
    backend: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeHydrocapt {
    pub async fn start(backend: Backend) -> FakeHydrocapt {
        let backend = Arc::new(Mutex::new(backend));

        let router = Router::new()
            .route("/pool/poolLogin/login", post(login))
            .route("/pool/poolEdit/own", get(pool_edit))
            .route("/pool/ajaxHistoric/getJsonValues", get(history))
            .route("/pool/ajaxAlarms/get", post(alarms))
            .route("/pool/ajaxCommands/get", get(get_commands))
            .route("/pool/ajaxCommands/save", post(save_commands))
            .route("/pool/ajaxSetpoints/get", get(get_setpoints))
            .route("/pool/ajaxSetpoints/save", post(save_setpoints))
            .with_state(backend.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        FakeHydrocapt {
            addr,
            backend,
            handle,
        }
    }

    pub fn settings(&self) -> Settings {
        Settings::new(USERNAME, PASSWORD)
            .with_api_url(&format!("http://{}", self.addr))
            .with_polling(5, Duration::from_millis(5))
    }

    pub fn client(&self) -> HydrocaptClient {
        HydrocaptClient::new(&self.settings())
    }

    pub fn backend(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap()
    }
}

impl Drop for FakeHydrocapt {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
