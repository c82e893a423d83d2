//! Reconciliation controller — the device registry and its event loop.
//!
//! The controller owns every [`DeviceSynchronizer`] and is the only place
//! that mutates them. Three sources of work are interleaved on its task:
//!
//! - periodic fetches of the remote listing, diffed against the registry
//! - local reads and writes forwarded by the accessory host
//! - debounce deadlines of deferred capability writes
//!
//! Outbound actions go through a single sender task, so a slow remote never
//! stalls local reads and batches reach the remote in the order they were
//! produced.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};

use yhk_domain::device::{CapabilityAction, DeviceActions, DeviceSnapshot, UserInfo};
use yhk_domain::error::YhkError;
use yhk_domain::id::DeviceId;
use yhk_domain::time::now_millis;

use crate::debounce::DebounceConfig;
use crate::ports::{AccessoryHost, LocalRequest, RemotePlatform, SnapshotStore};
use crate::synchronizer::DeviceSynchronizer;

/// Controller timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Delay between the end of one fetch and the start of the next.
    pub fetch_interval: Duration,
    pub debounce: DebounceConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            fetch_interval: Duration::from_millis(1500),
            debounce: DebounceConfig::default(),
        }
    }
}

/// Registry changes made by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Resolves once the remote answered a batch queued by
/// [`ReconciliationController::set_state`].
pub type SendReceipt = oneshot::Receiver<Result<(), YhkError>>;

struct Outbound {
    device: DeviceId,
    actions: Vec<CapabilityAction>,
    done: oneshot::Sender<Result<(), YhkError>>,
}

/// Keeps the local accessories in line with the remote device registry.
pub struct ReconciliationController<R, S, H> {
    remote: Arc<R>,
    store: S,
    host: H,
    devices: BTreeMap<DeviceId, DeviceSynchronizer>,
    config: ControllerConfig,
    last_saved: Option<Vec<DeviceSnapshot>>,
    outbox: Option<mpsc::UnboundedSender<Outbound>>,
}

impl<R, S, H> ReconciliationController<R, S, H>
where
    R: RemotePlatform + Send + Sync + 'static,
    S: SnapshotStore,
    H: AccessoryHost,
{
    pub fn new(remote: Arc<R>, store: S, host: H, config: ControllerConfig) -> Self {
        Self {
            remote,
            store,
            host,
            devices: BTreeMap::new(),
            config,
            last_saved: None,
            outbox: None,
        }
    }

    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn device(&self, id: &DeviceId) -> Option<&DeviceSynchronizer> {
        self.devices.get(id)
    }

    /// Current persistable view of the registry.
    #[must_use]
    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        self.devices
            .values()
            .map(DeviceSynchronizer::snapshot)
            .collect()
    }

    /// Restore the registry from the persisted snapshot, so accessories are
    /// exposed before the first fetch completes. Returns how many devices
    /// were restored.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the snapshot cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) -> Result<usize, YhkError> {
        let Some(snapshots) = self.store.load().await? else {
            tracing::info!("no device snapshot to restore");
            return Ok(0);
        };
        for snapshot in &snapshots {
            let id = snapshot.device.id.clone();
            if self.devices.contains_key(&id) {
                continue;
            }
            let synchronizer =
                DeviceSynchronizer::new(snapshot.clone(), &self.host, self.config.debounce);
            self.devices.insert(id, synchronizer);
        }
        self.last_saved = Some(snapshots);
        tracing::info!(devices = self.devices.len(), "device snapshot restored");
        Ok(self.devices.len())
    }

    /// Diff a remote listing against the registry.
    ///
    /// Devices seen for the first time get a synchronizer, known devices are
    /// reconciled, and devices missing from the listing are removed. The
    /// snapshot is persisted once at the end of the pass if it changed.
    #[tracing::instrument(skip_all, fields(devices = listing.devices.len()))]
    pub async fn apply(&mut self, listing: UserInfo) -> ApplySummary {
        let mut summary = ApplySummary::default();
        let now_ms = now_millis();
        let mut seen = Vec::with_capacity(listing.devices.len());

        for device in &listing.devices {
            let snapshot = DeviceSnapshot {
                device: device.clone(),
                room: listing.room_of(device).cloned(),
            };
            seen.push(device.id.clone());
            if let Some(synchronizer) = self.devices.get_mut(&device.id) {
                synchronizer.reconcile(snapshot, &self.host, now_ms);
                summary.updated += 1;
            } else {
                let synchronizer =
                    DeviceSynchronizer::new(snapshot, &self.host, self.config.debounce);
                self.devices.insert(device.id.clone(), synchronizer);
                summary.added += 1;
            }
        }

        let gone: Vec<DeviceId> = self
            .devices
            .keys()
            .filter(|id| !seen.contains(id))
            .cloned()
            .collect();
        for id in gone {
            if let Some(synchronizer) = self.devices.remove(&id) {
                synchronizer.destroy(&self.host);
                summary.removed += 1;
            }
        }

        if summary.added > 0 || summary.removed > 0 {
            tracing::info!(
                added = summary.added,
                removed = summary.removed,
                "device registry changed"
            );
        }
        self.persist().await;
        summary
    }

    /// Fetch the remote listing and apply it.
    ///
    /// # Errors
    ///
    /// Returns the remote error when the listing cannot be fetched; the
    /// registry is left untouched in that case.
    pub async fn fetch_once(&mut self) -> Result<ApplySummary, YhkError> {
        let listing = self.remote.user_info().await?;
        Ok(self.apply(listing).await)
    }

    /// Persist the registry, then queue `actions` for `device` behind every
    /// batch queued before it.
    ///
    /// The returned receipt yields the remote's answer. Dropping it is fine:
    /// failures are logged either way and the next fetch resynchronizes.
    #[tracing::instrument(skip(self, actions), fields(actions = actions.len()))]
    pub async fn set_state(
        &mut self,
        device: DeviceId,
        actions: Vec<CapabilityAction>,
    ) -> SendReceipt {
        self.persist().await;
        let (done, receipt) = oneshot::channel();
        let outbound = Outbound {
            device,
            actions,
            done,
        };
        if self.outbox().send(outbound).is_err() {
            tracing::warn!("action sender stopped, dropping actions");
        }
        receipt
    }

    fn outbox(&mut self) -> &mpsc::UnboundedSender<Outbound> {
        let remote = &self.remote;
        self.outbox.get_or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(send_queued(Arc::clone(remote), rx));
            tx
        })
    }

    async fn persist(&mut self) {
        let snapshots = self.snapshots();
        if self.last_saved.as_ref() == Some(&snapshots) {
            return;
        }
        match self.store.save(&snapshots).await {
            Ok(()) => self.last_saved = Some(snapshots),
            Err(err) => tracing::warn!(error = %err, "failed to persist device snapshot"),
        }
    }

    /// Answer one local read or write.
    pub async fn handle_request(&mut self, request: LocalRequest) {
        match request {
            LocalRequest::Read {
                characteristic,
                reply,
            } => {
                let value = self
                    .devices
                    .get(characteristic.accessory())
                    .and_then(|synchronizer| synchronizer.read(&characteristic));
                let _ = reply.send(value);
            }
            LocalRequest::Write {
                characteristic,
                value,
                ack,
            } => {
                let device = characteristic.accessory().clone();
                let outcome = match self.devices.get_mut(&device) {
                    Some(synchronizer) => {
                        synchronizer.write(&characteristic, &value, now_millis(), Instant::now())
                    }
                    None => {
                        tracing::warn!(device = %device, "write for unknown accessory");
                        Ok(None)
                    }
                };
                match outcome {
                    Ok(Some(action)) => {
                        let _ = ack.send(Ok(()));
                        let _ = self.set_state(device, vec![action]).await;
                    }
                    Ok(None) => {
                        let _ = ack.send(Ok(()));
                    }
                    Err(err) => {
                        tracing::warn!(
                            device = %device,
                            characteristic = ?characteristic.kind,
                            error = %err,
                            "rejected local write"
                        );
                        let _ = ack.send(Err(err));
                    }
                }
            }
        }
    }

    /// Send every deferred action due at `at`, one batch per device.
    pub async fn flush_due(&mut self, at: Instant) {
        let due: Vec<(DeviceId, Vec<CapabilityAction>)> = self
            .devices
            .iter_mut()
            .map(|(id, synchronizer)| (id.clone(), synchronizer.flush_due(at)))
            .filter(|(_, actions)| !actions.is_empty())
            .collect();
        for (device, actions) in due {
            let _ = self.set_state(device, actions).await;
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.devices
            .values()
            .filter_map(DeviceSynchronizer::next_deadline)
            .min()
    }

    /// Run until `requests` is closed.
    ///
    /// The first fetch starts immediately; each following one starts
    /// `fetch_interval` after the previous one finished, whether it
    /// succeeded or not.
    pub async fn run(mut self, mut requests: mpsc::Receiver<LocalRequest>) {
        let (listings_tx, mut listings) = mpsc::channel::<Result<UserInfo, YhkError>>(1);
        let next_fetch = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(next_fetch);
        let mut fetching = false;

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                () = &mut next_fetch, if !fetching => {
                    fetching = true;
                    let remote = Arc::clone(&self.remote);
                    let tx = listings_tx.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(remote.user_info().await).await;
                    });
                }
                Some(result) = listings.recv() => {
                    fetching = false;
                    match result {
                        Ok(listing) => {
                            self.apply(listing).await;
                        }
                        Err(err) => tracing::warn!(error = %err, "device fetch failed"),
                    }
                    next_fetch
                        .as_mut()
                        .reset(Instant::now() + self.config.fetch_interval);
                }
                request = requests.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => {
                        tracing::info!("local request channel closed, stopping");
                        break;
                    }
                },
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush_due(Instant::now()).await;
                }
            }
        }
    }
}

/// Send queued batches one at a time until the controller is dropped.
async fn send_queued<R: RemotePlatform>(
    remote: Arc<R>,
    mut outbox: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(Outbound {
        device,
        actions,
        done,
    }) = outbox.recv().await
    {
        let batch = vec![DeviceActions {
            id: device.clone(),
            actions,
        }];
        let result = remote.send_actions(batch).await;
        if let Err(err) = &result {
            tracing::warn!(device = %device, error = %err, "failed to send actions");
        }
        let _ = done.send(result);
    }
}
