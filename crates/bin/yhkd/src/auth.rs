//! Startup credential handling and the console authorization prompt.

use yhk_adapter_yandex::{OAuthClient, YandexConfig, YandexError};
use yhk_app::ports::CredentialStore;
use yhk_domain::credentials::Credentials;
use yhk_domain::error::YhkError;
use yhk_domain::time::now_millis;

/// Load the stored credentials for the configured client.
///
/// Stored tokens issued to a different client are discarded and the
/// configured client is persisted in their place.
///
/// # Errors
///
/// Returns a storage error when the credential file cannot be read or written.
pub async fn stored_credentials(
    store: &impl CredentialStore,
    config: &YandexConfig,
) -> Result<Credentials, YhkError> {
    let configured = config.credentials();
    match store.load().await? {
        Some(stored) if stored.same_client(&configured) => Ok(stored),
        stored => {
            if stored.is_some() {
                tracing::info!("client credentials changed, discarding stored tokens");
            }
            store.save(&configured).await?;
            Ok(configured)
        }
    }
}

/// Run the device-code flow, printing the verification URL and user code,
/// and persist the issued tokens.
///
/// # Errors
///
/// Returns an error if the code cannot be requested, the user does not
/// confirm it before it expires, or the tokens cannot be stored.
pub async fn authorize(
    config: &YandexConfig,
    mut credentials: Credentials,
    store: &impl CredentialStore,
) -> Result<Credentials, YhkError> {
    let http = config.http_client().map_err(YandexError::from)?;
    let oauth = OAuthClient::new(http, config);
    let code = oauth.request_device_code().await?;
    println!(
        "Go to {} and enter the code: {}",
        code.verification_url, code.user_code
    );
    let token = oauth.authorize_device(&code).await?;
    token.apply(&mut credentials, now_millis());
    store.save(&credentials).await?;
    println!("Authorization successful!");
    Ok(credentials)
}
