//! HTTP client for the IoT API, implementing [`RemotePlatform`].

use std::future::Future;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use yhk_app::ports::{CredentialStore, RemotePlatform};
use yhk_domain::credentials::Credentials;
use yhk_domain::device::{DeviceActions, UserInfo};
use yhk_domain::error::YhkError;
use yhk_domain::time;

use crate::config::{YandexConfig, join};
use crate::error::YandexError;
use crate::oauth::OAuthClient;

#[derive(Serialize)]
struct ActionsRequest<'a> {
    devices: &'a [DeviceActions],
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ActionsResponse {
    devices: Vec<DeviceResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeviceResult {
    id: String,
    capabilities: Vec<CapabilityResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CapabilityResult {
    #[serde(rename = "type")]
    kind: String,
    state: Option<ResultState>,
}

#[derive(Debug, Deserialize)]
struct ResultState {
    #[serde(default)]
    instance: String,
    action_result: Option<ActionResult>,
}

#[derive(Debug, Deserialize)]
struct ActionResult {
    status: String,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Decode a successful JSON answer, or turn the status into an error.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, YandexError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(YandexError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(serde_json::from_slice(&body)?)
}

/// Yandex IoT API client.
///
/// Requests carry the stored access token. A 401 answer triggers one token
/// refresh, persisted through the credential store, and one retry.
pub struct YandexClient<C> {
    http: reqwest::Client,
    api_url: String,
    oauth: OAuthClient,
    store: C,
    credentials: Mutex<Credentials>,
}

impl<C: CredentialStore + Send + Sync> YandexClient<C> {
    /// Build a client for `credentials`, persisting refreshed tokens to `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &YandexConfig,
        credentials: Credentials,
        store: C,
    ) -> Result<Self, YandexError> {
        let http = config.http_client()?;
        Ok(Self {
            oauth: OAuthClient::new(http.clone(), config),
            http,
            api_url: config.api_url.clone(),
            store,
            credentials: Mutex::new(credentials),
        })
    }

    /// The credentials currently in use.
    pub async fn credentials(&self) -> Credentials {
        self.credentials.lock().await.clone()
    }

    async fn access_token(&self) -> Result<String, YandexError> {
        self.credentials
            .lock()
            .await
            .access_token
            .clone()
            .ok_or(YandexError::NotConfigured)
    }

    /// Replace the `rejected` access token, unless another request already did.
    async fn refresh(&self, rejected: &str) -> Result<String, YandexError> {
        let mut credentials = self.credentials.lock().await;
        if let Some(current) = credentials.access_token.as_deref()
            && current != rejected
        {
            return Ok(current.to_string());
        }
        let refresh_token = credentials
            .refresh_token
            .clone()
            .ok_or(YandexError::Unauthorized(None))?;
        let token = self.oauth.refresh(&refresh_token).await?;
        token.apply(&mut credentials, time::now_millis());
        self.store
            .save(&credentials)
            .await
            .map_err(YandexError::Domain)?;
        tracing::info!("access token refreshed");
        credentials
            .access_token
            .clone()
            .ok_or(YandexError::NotConfigured)
    }

    fn request<B>(&self, method: &Method, url: &str, body: Option<&B>, token: &str) -> RequestBuilder
    where
        B: Serialize + ?Sized,
    {
        let builder = self.http.request(method.clone(), url).bearer_auth(token);
        match body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    #[tracing::instrument(skip(self, method, body), fields(method = %method))]
    async fn execute<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, YandexError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = join(&self.api_url, path);
        let token = self.access_token().await?;
        let mut response = self.request(&method, &url, body, &token).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("access token rejected");
            let token = self.refresh(&token).await?;
            response = self.request(&method, &url, body, &token).send().await?;
        }
        decode(response).await
    }
}

impl<C: CredentialStore + Send + Sync> RemotePlatform for YandexClient<C> {
    fn user_info(&self) -> impl Future<Output = Result<UserInfo, YhkError>> + Send {
        async move {
            let info: UserInfo = self.execute(Method::GET, "/user/info", None::<&()>).await?;
            tracing::debug!(
                devices = info.devices.len(),
                rooms = info.rooms.len(),
                "user info fetched"
            );
            Ok(info)
        }
    }

    fn send_actions(
        &self,
        devices: Vec<DeviceActions>,
    ) -> impl Future<Output = Result<(), YhkError>> + Send {
        async move {
            let body = ActionsRequest { devices: &devices };
            let response: ActionsResponse = self
                .execute(Method::POST, "/devices/actions", Some(&body))
                .await?;
            for device in &response.devices {
                for capability in &device.capabilities {
                    let Some(state) = &capability.state else {
                        continue;
                    };
                    if let Some(result) = &state.action_result
                        && result.status != "DONE"
                    {
                        tracing::warn!(
                            device = %device.id,
                            capability = %capability.kind,
                            instance = %state.instance,
                            status = %result.status,
                            code = result.error_code.as_deref().unwrap_or_default(),
                            message = result.error_message.as_deref().unwrap_or_default(),
                            "action not applied"
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
