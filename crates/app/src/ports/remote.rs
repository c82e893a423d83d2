//! Remote platform port — the cloud device registry.

use std::future::Future;

use yhk_domain::device::{DeviceActions, UserInfo};
use yhk_domain::error::YhkError;

/// Access to the remote device listing and action endpoint.
pub trait RemotePlatform {
    /// Fetch households, rooms, devices, groups and scenarios.
    fn user_info(&self) -> impl Future<Output = Result<UserInfo, YhkError>> + Send;

    /// Send one batch of capability changes.
    fn send_actions(
        &self,
        devices: Vec<DeviceActions>,
    ) -> impl Future<Output = Result<(), YhkError>> + Send;
}

impl<T: RemotePlatform + Send + Sync> RemotePlatform for std::sync::Arc<T> {
    fn user_info(&self) -> impl Future<Output = Result<UserInfo, YhkError>> + Send {
        (**self).user_info()
    }

    fn send_actions(
        &self,
        devices: Vec<DeviceActions>,
    ) -> impl Future<Output = Result<(), YhkError>> + Send {
        (**self).send_actions(devices)
    }
}
