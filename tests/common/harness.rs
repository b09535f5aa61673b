//! tests/common/harness.rs
use async_trait::async_trait;
use rabbit_warden::{
    config::ConnectionConfig,
    error::{Error, Result},
    state::NativePhase,
    transport::{Channel, ChannelInfo, Connector, EventSink, Transport},
};
use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc, Mutex, Once,
};
use tokio::{sync::watch, time::Instant};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "rabbit_warden=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// The test's view of one transport the connector handed out.
#[derive(Debug, Clone)]
pub struct ScriptedHandle {
    phase: Arc<AtomicU8>,
    closed: Arc<AtomicBool>,
    sink: EventSink,
}

impl ScriptedHandle {
    /// Moves the transport to OPEN and reports it.
    pub fn open(&self) {
        self.phase.store(NativePhase::OPEN.0, Ordering::SeqCst);
        self.sink.opened();
    }

    pub fn fail_open(&self, reason: &str) {
        self.phase.store(NativePhase::CLOSED.0, Ordering::SeqCst);
        self.sink.open_failed(reason);
    }

    /// Simulates the broker dropping the connection.
    pub fn drop_connection(&self, reason: &str) {
        self.phase.store(NativePhase::CLOSED.0, Ordering::SeqCst);
        self.sink.closed(Some(reason.to_string()));
    }

    pub fn set_phase(&self, phase: u8) {
        self.phase.store(phase, Ordering::SeqCst);
    }

    /// Whether the manager asked this transport to close.
    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct ScriptedTransport {
    handle: ScriptedHandle,
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn phase(&self) -> NativePhase {
        NativePhase(self.handle.phase.load(Ordering::SeqCst))
    }

    async fn open_channel(&self) -> Result<Box<dyn Channel>> {
        if self.phase() == NativePhase::OPEN {
            Ok(Box::new(ScriptedChannel))
        } else {
            Err(Error::NoChannel)
        }
    }

    async fn close(&self) {
        self.handle.closed.store(true, Ordering::SeqCst);
        self.handle.phase.store(NativePhase::CLOSED.0, Ordering::SeqCst);
        self.handle.sink.closed(None);
    }
}

#[derive(Debug)]
struct ScriptedChannel;

impl Channel for ScriptedChannel {
    fn info(&self) -> ChannelInfo {
        ChannelInfo {
            channel_number: 1,
            flow_active: true,
            consumer_tags: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    handles: Vec<ScriptedHandle>,
    connected_at: Vec<Instant>,
    fail_next: bool,
}

/// A connector whose transports are driven by the test.
///
/// With `auto_open` every new transport reports `Opened` right away.
#[derive(Debug)]
pub struct ScriptedConnector {
    auto_open: bool,
    script: Mutex<Script>,
    connects: watch::Sender<usize>,
}

impl ScriptedConnector {
    pub fn auto_open() -> Arc<Self> {
        Arc::new(Self::with(true))
    }

    pub fn manual() -> Arc<Self> {
        Arc::new(Self::with(false))
    }

    fn with(auto_open: bool) -> Self {
        let (connects, _) = watch::channel(0);
        Self {
            auto_open,
            script: Mutex::new(Script::default()),
            connects,
        }
    }

    /// Makes the next `connect` call fail outright.
    pub fn fail_next(&self) {
        self.script.lock().unwrap().fail_next = true;
    }

    pub fn connects(&self) -> usize {
        *self.connects.borrow()
    }

    /// Waits until at least `n` connect calls have been made.
    pub async fn wait_for_connects(&self, n: usize) {
        let mut rx = self.connects.subscribe();
        rx.wait_for(|count| *count >= n).await.unwrap();
    }

    pub fn handle(&self, index: usize) -> ScriptedHandle {
        self.script.lock().unwrap().handles[index].clone()
    }

    pub fn last(&self) -> ScriptedHandle {
        self.script.lock().unwrap().handles.last().cloned().unwrap()
    }

    /// When the `index`-th connect call happened.
    pub fn connected_at(&self, index: usize) -> Instant {
        self.script.lock().unwrap().connected_at[index]
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(
        &self,
        _config: &ConnectionConfig,
        events: EventSink,
    ) -> Result<Box<dyn Transport>> {
        let result = {
            let mut script = self.script.lock().unwrap();
            script.connected_at.push(Instant::now());
            if std::mem::take(&mut script.fail_next) {
                Err(Error::TransportOpen("connection refused".to_string()))
            } else {
                let handle = ScriptedHandle {
                    phase: Arc::new(AtomicU8::new(NativePhase::INIT.0)),
                    closed: Arc::new(AtomicBool::new(false)),
                    sink: events,
                };
                script.handles.push(handle.clone());
                Ok(handle)
            }
        };
        self.connects.send_modify(|count| *count += 1);

        let handle = result?;
        if self.auto_open {
            handle.open();
        }
        Ok(Box::new(ScriptedTransport { handle }))
    }
}
