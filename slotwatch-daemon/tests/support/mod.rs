//! In-memory collaborators for daemon tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use slotwatch_core::{
    AuthError, CommandOffset, CredentialBundle, FetchResult, InboundMessage, MessagingError,
    Messenger, OutboundMessage, Reauthenticator, ResourceFetch, SessionCookie,
};
use slotwatch_daemon::{Dispatcher, SessionManager, SlotSource};

pub const CHAT_ID: &str = "42";
pub const BOOKING_URL: &str = "https://lks.bmstu.ru/fv/new-record";

// ============================================================================
// Payloads
// ============================================================================

/// One slot group as the schedule endpoint sends it.
pub fn group(id: &str, vacancy: u32) -> String {
    format!(
        r#"{{"id": "{id}", "section": "Swimming", "week": "Monday", "time": "10:15-11:50", "place": "Pool", "teacherName": "Orlova T. V.", "vacancy": {vacancy}}}"#
    )
}

/// A schedule payload with all groups in one day.
pub fn payload(groups: &[String]) -> FetchResult {
    FetchResult::Authorized(format!(r#"[{{"groups": [{}]}}]"#, groups.join(",")))
}

// ============================================================================
// Resource
// ============================================================================

/// Plays back scripted results and records the cookies it was called with.
#[derive(Default)]
pub struct ScriptedResource {
    script: Mutex<VecDeque<FetchResult>>,
    seen_cookies: Mutex<Vec<Option<String>>>,
    panic_next: Mutex<bool>,
}

impl ScriptedResource {
    pub fn new(script: impl IntoIterator<Item = FetchResult>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn push(&self, result: FetchResult) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn panic_on_next_fetch(&self) {
        *self.panic_next.lock().unwrap() = true;
    }

    pub fn seen_cookies(&self) -> Vec<Option<String>> {
        self.seen_cookies.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen_cookies.lock().unwrap().len()
    }
}

#[async_trait]
impl ResourceFetch for ScriptedResource {
    async fn fetch(&self, credentials: &CredentialBundle) -> FetchResult {
        self.seen_cookies
            .lock()
            .unwrap()
            .push(credentials.cookie_header());

        let panic_now = std::mem::take(&mut *self.panic_next.lock().unwrap());
        if panic_now {
            panic!("scripted panic");
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| FetchResult::NetworkFailure("script exhausted".to_string()))
    }
}

// ============================================================================
// Messenger
// ============================================================================

/// Records sent messages and plays back inbound batches.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<OutboundMessage>>,
    inbound: Mutex<VecDeque<Vec<InboundMessage>>>,
    offsets: Mutex<Vec<i64>>,
    fail_sends: Mutex<bool>,
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let messenger = Self::default();
        *messenger.fail_sends.lock().unwrap() = true;
        Arc::new(messenger)
    }

    pub fn queue_inbound(&self, batch: Vec<InboundMessage>) {
        self.inbound.lock().unwrap().push_back(batch);
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn requested_offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, message: &OutboundMessage) -> Result<(), MessagingError> {
        if *self.fail_sends.lock().unwrap() {
            return Err(MessagingError::Transport("connection reset".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn poll_inbound(
        &self,
        offset: CommandOffset,
    ) -> Result<Vec<InboundMessage>, MessagingError> {
        self.offsets.lock().unwrap().push(offset.next());
        Ok(self.inbound.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// A text message from `sender`.
pub fn inbound(id: i64, sender: &str, text: &str) -> InboundMessage {
    InboundMessage {
        id,
        sender: Some(sender.to_string()),
        text: Some(text.to_string()),
    }
}

// ============================================================================
// Reauthentication
// ============================================================================

/// Counts login runs; each success yields `sid=login-<n>`.
pub struct CountingGate {
    calls: AtomicUsize,
    fail: bool,
    delay: Duration,
}

impl CountingGate {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
            delay: Duration::ZERO,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
            delay: Duration::ZERO,
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reauthenticator for CountingGate {
    async fn reauthenticate(&self) -> Result<CredentialBundle, AuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(AuthError::LoginFailed("captcha".to_string()));
        }
        Ok(CredentialBundle::new(vec![SessionCookie::new(
            "sid",
            format!("login-{n}"),
        )]))
    }
}

// ============================================================================
// Wiring
// ============================================================================

/// A session seeded with `sid=initial`.
pub async fn session(gate: Arc<CountingGate>) -> Arc<SessionManager> {
    let session = SessionManager::new(gate, None);
    session
        .install(CredentialBundle::new(vec![SessionCookie::new("sid", "initial")]))
        .await;
    Arc::new(session)
}

pub fn source(resource: Arc<ScriptedResource>, session: Arc<SessionManager>) -> SlotSource {
    SlotSource::new(resource, session)
}

pub fn dispatcher(messenger: Arc<RecordingMessenger>) -> Dispatcher {
    Dispatcher::new(messenger, BOOKING_URL)
}
