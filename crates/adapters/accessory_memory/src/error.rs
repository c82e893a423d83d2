//! Errors returned to simulated local controllers.

use yhk_domain::accessory::{CharacteristicHandle, CharacteristicKind};
use yhk_domain::error::YhkError;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The characteristic does not exist on the accessory tree.
    #[error("unknown characteristic {0:?}")]
    UnknownCharacteristic(CharacteristicKind),

    /// The characteristic only forwards reads.
    #[error("characteristic {0:?} is read-only")]
    ReadOnly(CharacteristicKind),

    /// The owning binding refused the written value.
    #[error("write rejected")]
    Rejected(#[source] YhkError),

    /// The core stopped answering local requests.
    #[error("request channel closed")]
    Closed,
}

impl HostError {
    pub(crate) fn unknown(characteristic: &CharacteristicHandle) -> Self {
        Self::UnknownCharacteristic(characteristic.kind)
    }
}
