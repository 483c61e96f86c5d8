//! Shared test helpers: a scripted reader adapter and controller setup

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use tagsense_common::{EventBus, TagEvent};
use tagsense_reader::config::NotificationConfig;
use tagsense_reader::notify::NotificationDispatcher;
use tagsense_reader::reader::{
    BaudRate, BufferRead, InventoryParams, InventorySummary, ReaderAdapter, ReaderCode,
    ReaderLink,
};
use tagsense_reader::session::{SessionController, SessionSettings};
use tokio::sync::broadcast;

/// Reader adapter that replays queued buffer reads
///
/// An empty queue reads as an empty buffer. Inventory always reports the
/// benign timeout code. Buffer reads can be slowed down to hold a polling
/// cycle open.
pub struct ScriptedReader {
    open_result: Result<ReaderLink, ReaderCode>,
    reads: Mutex<VecDeque<Result<BufferRead, ReaderCode>>>,
    read_delay: Duration,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub clears: AtomicUsize,
    pub read_calls: AtomicUsize,
    in_flight: AtomicUsize,
    /// Most buffer reads ever running at the same time
    pub max_in_flight: AtomicUsize,
}

impl ScriptedReader {
    pub fn connected() -> Self {
        Self::with_open_result(Ok(ReaderLink {
            address: 0x01,
            handle: 4242,
        }))
    }

    pub fn failing() -> Self {
        Self::with_open_result(Err(ReaderCode::COMM_ERROR))
    }

    fn with_open_result(open_result: Result<ReaderLink, ReaderCode>) -> Self {
        Self {
            open_result,
            reads: Mutex::new(VecDeque::new()),
            read_delay: Duration::ZERO,
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
            read_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every buffer read blocks for `delay`
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Queue a buffer holding one record per tag number
    pub fn queue_tags(&self, numbers: &[u16]) {
        self.queue_read(Ok(buffer(numbers, -50)));
    }

    pub fn queue_read(&self, read: Result<BufferRead, ReaderCode>) {
        self.reads.lock().unwrap().push_back(read);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl ReaderAdapter for ScriptedReader {
    fn name(&self) -> &str {
        "scripted"
    }

    fn open(&self, _port: u8, _address: u8, _baud: BaudRate) -> Result<ReaderLink, ReaderCode> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open_result
    }

    fn close(&self) -> Result<(), ReaderCode> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear_buffer(&self, _link: &ReaderLink) -> Result<(), ReaderCode> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_buffer(&self, _link: &ReaderLink) -> Result<BufferRead, ReaderCode> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay);
        }
        let read = self
            .reads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BufferRead::default()));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        read
    }

    fn inventory(
        &self,
        _link: &ReaderLink,
        _params: &InventoryParams,
    ) -> Result<InventorySummary, ReaderCode> {
        Err(ReaderCode::INVENTORY_TIMEOUT)
    }
}

/// 12-byte EPC whose last two bytes carry `number`
pub fn epc(number: u16) -> Vec<u8> {
    let mut epc = vec![0xE2, 0x00, 0x00, 0x1A, 0x75, 0x01, 0x23, 0x45, 0x00, 0x00];
    epc.extend_from_slice(&number.to_be_bytes());
    epc
}

/// Tag id the parser produces for `number`
pub fn tag_id(number: u16) -> String {
    format!("E200001A750123450000{:04X}", number)
}

/// Raw device buffer with one record per tag number
pub fn buffer(numbers: &[u16], rssi: i8) -> BufferRead {
    let mut raw = Vec::new();
    for &number in numbers {
        let epc = epc(number);
        raw.push(1);
        raw.push(epc.len() as u8);
        raw.extend_from_slice(&epc);
        raw.push(rssi as u8);
        raw.push(1);
    }

    BufferRead {
        total_length: raw.len(),
        card_count: numbers.len(),
        raw,
    }
}

/// Settings whose scheduler never fires during a test; cycles are driven
/// with `poll_once`
pub fn manual_settings(threshold: u32) -> SessionSettings {
    SessionSettings {
        poll_interval: Duration::from_secs(3600),
        reset_pause: Duration::from_millis(10),
        initial_threshold: threshold,
        ..SessionSettings::default()
    }
}

/// Controller with an explicit notification sink (`None` disables it)
pub fn build_controller(
    adapter: Arc<dyn ReaderAdapter>,
    settings: SessionSettings,
    notification: Option<&NotificationConfig>,
) -> Arc<SessionController> {
    let events = Arc::new(EventBus::new(1000));
    let notifier = match notification {
        Some(config) => NotificationDispatcher::new(config, Arc::clone(&events))
            .expect("notification client builds"),
        None => NotificationDispatcher::disabled(Arc::clone(&events)),
    };
    Arc::new(SessionController::new(adapter, events, notifier, settings))
}

pub fn controller(adapter: Arc<dyn ReaderAdapter>, threshold: u32) -> Arc<SessionController> {
    build_controller(adapter, manual_settings(threshold), None)
}

/// Local HTTP endpoint answering `GET /notify` with `status`
///
/// Returns the URL to configure and the number of requests received.
pub async fn spawn_notification_sink(status: StatusCode) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().route(
        "/notify",
        get(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                status
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/notify?=ok", addr), hits)
}

/// Receive events until one named `name` arrives; returns everything seen
///
/// Panics if it does not arrive within `limit`.
pub async fn recv_until(
    rx: &mut broadcast::Receiver<TagEvent>,
    name: &str,
    limit: Duration,
) -> Vec<TagEvent> {
    let mut seen = Vec::new();
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        let event = tokio::time::timeout_at(deadline, rx.recv())
            .await
            .unwrap_or_else(|_| panic!("{} not received within {:?}", name, limit))
            .expect("event bus open");
        let done = event.event_name() == name;
        seen.push(event);
        if done {
            return seen;
        }
    }
}

/// Poll `check` every few milliseconds until it holds or `limit` passes
pub async fn wait_for<F, Fut>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check().await
}

/// Everything currently queued on the receiver
pub fn drain(rx: &mut broadcast::Receiver<TagEvent>) -> Vec<TagEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn names(events: &[TagEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.event_name()).collect()
}
