//! Session controller
//!
//! Owns the reading session: acquires the reader (or the fallback source),
//! runs the polling scheduler, feeds new tags into the store, detects the
//! threshold crossing and publishes every state change on the event bus.
//!
//! Locking:
//! - `control` serializes start/stop/reset so they never interleave
//! - `cycle` serializes polling cycles; only one touches the reader at a time
//! - `session` guards state, store, threshold and the reader link together;
//!   it is never held across a device call
//!
//! Lock order is always `control` → `cycle` → `session`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tagsense_common::{EventBus, TagCounterSnapshot, TagEvent, TagRecord};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{SessionState, SessionStatus, SourceKind};
use super::store::TagStore;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fallback::FallbackGenerator;
use crate::notify::NotificationDispatcher;
use crate::reader::{
    parse_epc_buffer, BaudRate, InventoryParams, ReaderAdapter, ReaderCode, ReaderLink,
};

/// Static parameters of a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub com_port: u8,
    /// Address used on open (0xFF = broadcast discovery)
    pub address: u8,
    pub baud_rate: BaudRate,
    pub poll_interval: Duration,
    pub inventory: InventoryParams,
    pub initial_threshold: u32,
    pub reset_pause: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            com_port: config.reader.com_port,
            address: config.reader.address,
            baud_rate: config.reader.baud_rate,
            poll_interval: config.reader.poll_interval(),
            inventory: config.reader.inventory.clone(),
            initial_threshold: config.session.initial_threshold,
            reset_pause: config.session.reset_pause(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Copy)]
enum TagSource {
    Device(ReaderLink),
    Fallback(ReaderLink),
}

impl TagSource {
    fn kind(&self) -> SourceKind {
        match self {
            TagSource::Device(_) => SourceKind::Device,
            TagSource::Fallback(_) => SourceKind::Fallback,
        }
    }

    fn link(&self) -> ReaderLink {
        match self {
            TagSource::Device(link) | TagSource::Fallback(link) => *link,
        }
    }
}

struct Poller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Session {
    state: SessionState,
    store: TagStore,
    threshold: u32,
    source: Option<TagSource>,
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    poller: Option<Poller>,
}

/// What one buffer read produced
struct CycleInput {
    candidates: Vec<TagRecord>,
    /// Device buffer held tags and must be cleared after ingestion
    clear_device_buffer: bool,
}

pub struct SessionController {
    adapter: Arc<dyn ReaderAdapter>,
    fallback: FallbackGenerator,
    events: Arc<EventBus>,
    notifier: NotificationDispatcher,
    settings: SessionSettings,
    control: Mutex<()>,
    cycle: Mutex<()>,
    session: Mutex<Session>,
}

impl SessionController {
    pub fn new(
        adapter: Arc<dyn ReaderAdapter>,
        events: Arc<EventBus>,
        notifier: NotificationDispatcher,
        settings: SessionSettings,
    ) -> Self {
        let session = Session {
            state: SessionState::Idle,
            store: TagStore::new(),
            threshold: settings.initial_threshold,
            source: None,
            session_id: None,
            started_at: None,
            poller: None,
        };

        Self {
            adapter,
            fallback: FallbackGenerator::new(),
            events,
            notifier,
            settings,
            control: Mutex::new(()),
            cycle: Mutex::new(()),
            session: Mutex::new(session),
        }
    }

    /// Subscribe to session events
    pub fn subscribe_events(&self) -> broadcast::Receiver<TagEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Control operations
    // ------------------------------------------------------------------

    /// Start a reading session
    ///
    /// Succeeds without side effects when a session is already active. A
    /// reader that cannot be opened is replaced by the fallback source.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let _control = self.control.lock().await;
        self.start_inner().await
    }

    /// Stop the reading session; succeeds without side effects when idle
    ///
    /// Returns after the polling task has finished, so no tag event follows
    /// the `ReadingStatusChanged(false)` emitted here.
    pub async fn stop(&self) -> Result<()> {
        let _control = self.control.lock().await;
        self.stop_inner().await
    }

    /// Stop, pause, start: the only way to clear accumulated tags
    pub async fn reset(self: &Arc<Self>) -> Result<()> {
        let _control = self.control.lock().await;
        self.stop_inner().await?;
        tokio::time::sleep(self.settings.reset_pause).await;
        self.start_inner().await?;
        info!("Tag counter reset");
        Ok(())
    }

    /// Set the notification threshold; values ≤ 0 are rejected untouched
    ///
    /// Does not re-evaluate the current count against the new value.
    pub async fn set_threshold(&self, value: i64) -> Result<u32> {
        if value <= 0 {
            return Err(Error::InvalidInput(
                "Threshold value must be greater than 0".to_string(),
            ));
        }
        let threshold = u32::try_from(value)
            .map_err(|_| Error::InvalidInput(format!("Threshold value too large: {}", value)))?;

        let mut session = self.session.lock().await;
        session.threshold = threshold;
        self.events.emit_lossy(TagEvent::threshold_changed(threshold));
        info!("Threshold set to {}", threshold);
        Ok(threshold)
    }

    /// Stop reading on process shutdown
    pub async fn shutdown(&self) {
        if let Err(e) = self.stop().await {
            warn!("Error stopping session during shutdown: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn status(&self) -> SessionStatus {
        let session = self.session.lock().await;
        SessionStatus {
            is_reading: session.state.is_active(),
            state: session.state,
            session_id: session.session_id,
            source: session.source.map(|s| s.kind()),
            started_at: session.started_at,
            timestamp: Utc::now(),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state
    }

    pub async fn is_reading(&self) -> bool {
        self.state().await.is_active()
    }

    pub async fn threshold(&self) -> u32 {
        self.session.lock().await.threshold
    }

    pub async fn count(&self) -> usize {
        self.session.lock().await.store.count()
    }

    pub async fn snapshot(&self) -> TagCounterSnapshot {
        let session = self.session.lock().await;
        session.store.snapshot(session.threshold)
    }

    /// All stored tags, most recent read first
    pub async fn recent_tags(&self) -> Vec<TagRecord> {
        self.session.lock().await.store.most_recent_first()
    }

    // ------------------------------------------------------------------
    // Polling
    // ------------------------------------------------------------------

    /// Run one polling cycle now, waiting for a running cycle to finish
    ///
    /// Returns the number of new tags stored. Does nothing unless active.
    pub async fn poll_once(&self) -> Result<usize> {
        let _cycle = self.cycle.lock().await;
        self.run_cycle().await
    }

    /// Scheduler entry point: skips the tick if a cycle is still running
    async fn poll_tick(&self) -> Result<usize> {
        let Ok(_cycle) = self.cycle.try_lock() else {
            debug!("Polling cycle still running, skipping tick");
            return Ok(0);
        };
        self.run_cycle().await
    }

    /// Caller holds the `cycle` lock
    async fn run_cycle(&self) -> Result<usize> {
        let source = {
            let session = self.session.lock().await;
            match (session.state, session.source) {
                (SessionState::Active, Some(source)) => source,
                _ => return Ok(0),
            }
        };

        let input = match source {
            TagSource::Device(link) => self.read_device(link).await,
            TagSource::Fallback(_) => CycleInput {
                candidates: vec![self.fallback.generate()],
                clear_device_buffer: false,
            },
        };

        let added = {
            let mut session = self.session.lock().await;
            if !session.state.is_active() {
                debug!("Session left Active during read, discarding cycle results");
                return Ok(0);
            }
            self.ingest(&mut session, input.candidates)
        };

        if let TagSource::Device(link) = source {
            if input.clear_device_buffer {
                if let Err(e) = self
                    .device_call("clear_buffer", move |a| a.clear_buffer(&link))
                    .await
                {
                    warn!("Failed to clear reader buffer: {}", e);
                }
            }
            self.request_inventory(link).await;
        }

        Ok(added)
    }

    /// Read and decode the device buffer; a failed read yields one
    /// synthetic candidate instead
    async fn read_device(&self, link: ReaderLink) -> CycleInput {
        match self.device_call("read_buffer", move |a| a.read_buffer(&link)).await {
            Ok(read) if read.card_count > 0 => CycleInput {
                candidates: parse_epc_buffer(&read.raw, read.total_length, read.card_count)
                    .into_iter()
                    .map(|epc| epc.into_record())
                    .collect(),
                clear_device_buffer: true,
            },
            Ok(_) => CycleInput {
                candidates: Vec::new(),
                clear_device_buffer: false,
            },
            Err(e) => {
                warn!("{}, using simulation", e);
                CycleInput {
                    candidates: vec![self.fallback.generate()],
                    clear_device_buffer: false,
                }
            }
        }
    }

    /// Best-effort inventory round so the next read finds fresh tags
    async fn request_inventory(&self, link: ReaderLink) {
        let params = self.settings.inventory.clone();
        match self
            .device_call("inventory", move |a| a.inventory(&link, &params))
            .await
        {
            Ok(summary) => debug!(cards = summary.card_count, "Inventory round staged tags"),
            Err(Error::Device { code, .. }) if code.is_inventory_timeout() => {}
            Err(e) if e.is_device_fault() => debug!("Inventory command result: {}", e),
            Err(e) => warn!("Inventory round failed: {}", e),
        }
    }

    /// Store new candidates and publish their events; caller holds `session`
    fn ingest(&self, session: &mut Session, candidates: Vec<TagRecord>) -> usize {
        let mut added = 0;

        for record in candidates {
            if session.store.contains(&record.tag_id) {
                continue;
            }

            let event = TagEvent::tag_read(record.clone());
            let (tag_id, rssi) = (record.tag_id.clone(), record.rssi);
            session.store.insert_if_new(record);
            added += 1;

            let count = session.store.count();
            self.events.emit_lossy(event);
            self.events.emit_lossy(TagEvent::tag_count_changed(count));
            info!("New tag read: {}, RSSI: {}, Total: {}", tag_id, rssi, count);

            // Exact match: a count that skips past the threshold never fires
            if count == session.threshold as usize {
                self.events.emit_lossy(TagEvent::threshold_reached(count));
                info!("Threshold of {} tags reached", count);
                self.notifier.dispatch(count);
            }
        }

        added
    }

    // ------------------------------------------------------------------
    // Session acquisition and release
    // ------------------------------------------------------------------

    /// Caller holds the `control` lock
    async fn start_inner(self: &Arc<Self>) -> Result<()> {
        {
            let mut session = self.session.lock().await;
            if session.state.is_active() {
                debug!("Start requested while already reading");
                return Ok(());
            }
            session.state = SessionState::Connecting;
        }

        let source = match self.acquire().await {
            Ok(source) => source,
            Err(e) => {
                self.session.lock().await.state = SessionState::Idle;
                return Err(e);
            }
        };

        if let TagSource::Device(link) = source {
            if let Err(e) = self
                .device_call("clear_buffer", move |a| a.clear_buffer(&link))
                .await
            {
                warn!("Failed to clear reader buffer on start: {}", e);
            }
        }

        let mut session = self.session.lock().await;
        let session_id = Uuid::new_v4();
        session.store.clear();
        session.source = Some(source);
        session.session_id = Some(session_id);
        session.started_at = Some(Utc::now());
        session.poller = Some(self.spawn_poller());
        session.state = SessionState::Active;
        self.events.emit_lossy(TagEvent::reading_status_changed(true));

        let link = source.link();
        info!(
            %session_id,
            "RFID reading started with handle: {}, address: 0x{:02X} ({:?})",
            link.handle,
            link.address,
            source.kind()
        );
        Ok(())
    }

    /// Open the reader, or acquire the fallback source if that fails
    async fn acquire(&self) -> Result<TagSource> {
        let (port, address, baud) = (
            self.settings.com_port,
            self.settings.address,
            self.settings.baud_rate,
        );

        match self
            .device_call("open", move |a| a.open(port, address, baud))
            .await
        {
            Ok(link) => Ok(TagSource::Device(link)),
            Err(e) => {
                warn!(
                    "Failed to open {} reader on port {}, using simulation mode: {}",
                    self.adapter.name(),
                    port,
                    e
                );
                let link = self.fallback.acquire(port, address)?;
                Ok(TagSource::Fallback(link))
            }
        }
    }

    /// Caller holds the `control` lock
    async fn stop_inner(&self) -> Result<()> {
        let poller = {
            let mut session = self.session.lock().await;
            if session.state == SessionState::Idle {
                debug!("Stop requested while idle");
                return Ok(());
            }
            session.state = SessionState::Stopping;
            session.poller.take()
        };

        if let Some(poller) = poller {
            poller.cancel.cancel();
            if let Err(e) = poller.handle.await {
                warn!("Polling task ended abnormally: {}", e);
            }
        }

        // Wait out a cycle started through poll_once before releasing the reader
        let _cycle = self.cycle.lock().await;

        let source = self.session.lock().await.source.take();
        if let Some(TagSource::Device(_)) = source {
            match self.device_call("close", |a| a.close()).await {
                Ok(()) => info!("Reader port closed successfully"),
                Err(e) => warn!("Error closing reader port: {}", e),
            }
        }

        let mut session = self.session.lock().await;
        session.state = SessionState::Idle;
        session.session_id = None;
        session.started_at = None;
        self.events.emit_lossy(TagEvent::reading_status_changed(false));
        info!("RFID reading stopped");
        Ok(())
    }

    fn spawn_poller(self: &Arc<Self>) -> Poller {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let controller: Weak<Self> = Arc::downgrade(self);
        let period = self.settings.poll_interval;

        let handle = tokio::spawn(async move {
            // First cycle one period after start, not immediately
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tick.tick() => {}
                }

                let Some(controller) = controller.upgrade() else {
                    break;
                };
                if let Err(e) = controller.poll_tick().await {
                    warn!("Polling cycle failed: {}", e);
                }
            }

            debug!("Polling loop stopped");
        });

        Poller { cancel, handle }
    }

    /// Run a blocking adapter call on the blocking pool
    async fn device_call<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ReaderAdapter) -> std::result::Result<T, ReaderCode> + Send + 'static,
    {
        let adapter = Arc::clone(&self.adapter);
        tokio::task::spawn_blocking(move || f(adapter.as_ref()))
            .await
            .map_err(|e| Error::Internal(format!("Reader {} task failed: {}", operation, e)))?
            .map_err(|code| Error::Device { operation, code })
    }
}
