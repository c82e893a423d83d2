//! Credential store backed by `yandex.json`.

use std::future::Future;
use std::path::Path;

use yhk_app::ports::CredentialStore;
use yhk_domain::credentials::Credentials;
use yhk_domain::error::YhkError;

use crate::file::{JsonFile, encode};

const FILE_NAME: &str = "yandex.json";

/// Persists OAuth client credentials and tokens.
#[derive(Debug, Clone)]
pub struct JsonCredentialStore {
    file: JsonFile,
}

impl JsonCredentialStore {
    /// Store the credentials in `dir/yandex.json`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            file: JsonFile::new(dir.join(FILE_NAME)),
        }
    }
}

impl CredentialStore for JsonCredentialStore {
    fn load(&self) -> impl Future<Output = Result<Option<Credentials>, YhkError>> + Send {
        let file = self.file.clone();
        async move { Ok(file.read().await?) }
    }

    fn save(&self, credentials: &Credentials) -> impl Future<Output = Result<(), YhkError>> + Send {
        let file = self.file.clone();
        let encoded = encode(credentials);
        async move { Ok(file.write(encoded?).await?) }
    }
}
