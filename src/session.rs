use crate::api::endpoint::{self, Endpoint};
use crate::api::error::map_api_err;
use crate::api::response::pool_edit;
use crate::api::Error;
use crate::model::PoolId;
use crate::settings::Settings;
use futures::future::BoxFuture;
use reqwest::header::REFERER;
use reqwest::{Client, RequestBuilder};

/// Authenticated cookie session against the Hydrocapt web application.
///
/// The underlying HTTP client (and its cookie jar) is replaced wholesale on every
/// login. The pool id, once resolved, survives re-logins.
pub struct Session {
    api_url: String,
    username: String,
    password: String,
    client: Option<Client>,
    pool_id: Option<PoolId>,
}

impl Session {
    pub fn new(settings: &Settings) -> Session {
        Session {
            api_url: settings.api_url.to_owned(),
            username: settings.username.to_owned(),
            password: settings.password.to_owned(),
            client: None,
            pool_id: None,
        }
    }

    /// Skip pool id discovery by providing a known id.
    pub fn with_pool_id(mut self, pool_id: PoolId) -> Session {
        if pool_id >= 0 {
            self.pool_id = Some(pool_id);
        }
        self
    }

    pub fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.api_url, endpoint)
    }

    /* Only the HTTP status is checked: the vendor answers 200 to bad credentials on some paths */
    async fn login(&self) -> Result<Client, Error> {
        let client = reqwest::ClientBuilder::new()
            .cookie_store(true)
            .build()
            .map_err(|e| Error::InternalError(e.to_string()))?;

        let form = [
            ("login", self.username.as_str()),
            ("pass", self.password.as_str()),
        ];

        client
            .post(self.url(endpoint::LOGIN))
            .form(&form)
            .header(REFERER, self.url(endpoint::DISCONNECT))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| Error::LoginError(e.to_string()))?;

        log::info!("logged in to {} as {}", self.api_url, self.username);
        Ok(client)
    }

    /// Drop the current session and log in again.
    pub async fn reconnect(&mut self) -> Result<(), Error> {
        self.client = None;
        self.client = Some(self.login().await?);
        Ok(())
    }

    async fn client(&mut self) -> Result<Client, Error> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        let client = self.login().await?;
        self.client = Some(client.clone());
        Ok(client)
    }

    async fn send(request: RequestBuilder) -> Result<String, reqwest::Error> {
        request.send().await?.error_for_status()?.text().await
    }

    /// Send the request built by `build`; on any failure log in again and send it once more.
    async fn execute<F>(&mut self, url: &str, build: F) -> Result<String, Error>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let client = self.client().await?;

        let text = match Session::send(build(&client)).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("request to {} failed ({}), logging in again", url, e);
                self.reconnect().await?;
                let client = self.client().await?;
                Session::send(build(&client)).await.map_err(map_api_err)?
            }
        };

        log::trace!("url: {}, response_text: {}", url, text);
        Ok(text)
    }

    pub async fn get(&mut self, endpoint: &Endpoint, query: &[(&str, String)]) -> Result<String, Error> {
        let url = self.url(endpoint);
        self.execute(&url, |client| client.get(&url).query(query))
            .await
    }

    /// Form POST. `referer` defaults to the target URL.
    pub async fn post(
        &mut self,
        endpoint: &Endpoint,
        form: &[(&str, String)],
        referer: Option<&str>,
    ) -> Result<String, Error> {
        let url = self.url(endpoint);
        let referer = referer.unwrap_or(url.as_str()).to_owned();

        log::trace!("endpoint: {}, form: {:?}", endpoint, form);
        self.execute(&url, |client| {
            client.post(&url).form(form).header(REFERER, referer.as_str())
        })
        .await
    }

    /// Pool id of the account, scraped from the pool edit page on first use.
    pub async fn resolve_pool_id(&mut self) -> Result<PoolId, Error> {
        if let Some(pool_id) = self.pool_id {
            return Ok(pool_id);
        }

        let page = self.get(endpoint::EDIT_POOL_OWN, &[]).await?;
        let pool_id = pool_edit::pool_id(&page)?;

        log::debug!("resolved pool id {}", pool_id);
        self.pool_id = Some(pool_id);
        Ok(pool_id)
    }

    /// Run `op`; if it fails, log in again and run it exactly once more.
    pub async fn retry_once<T, F>(&mut self, what: &str, mut op: F) -> Result<T, Error>
    where
        F: for<'s> FnMut(&'s mut Session) -> BoxFuture<'s, Result<T, Error>>,
    {
        match op(&mut *self).await {
            Ok(value) => Ok(value),
            Err(e) => {
                log::warn!("{} failed ({}), retrying with a fresh session", what, e);
                self.reconnect().await?;
                op(&mut *self).await
            }
        }
    }
}
