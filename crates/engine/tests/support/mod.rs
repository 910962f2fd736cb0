//! Scripted collaborators for driving the dispatcher deterministically.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use mailbatch_common::error::StoreError;
use mailbatch_common::types::{MessageTemplate, Recipient, RecipientId};
use mailbatch_engine::{MemoryRecipientStore, RecipientStore};
use mailbatch_notifier::{
    Attachment, AttachmentError, AttachmentSource, OutboundEmail, Transport, TransportError,
};

/// Ordered record of side effects across transport and store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Sent(String),
    MarkRequested(RecipientId),
    Marked(RecipientId),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Transport that fails or panics for configured sets of addresses.
pub struct ScriptedTransport {
    failing: HashSet<String>,
    panicking: HashSet<String>,
    delay: Option<Duration>,
    events: EventLog,
    attempts: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(events: EventLog) -> Self {
        Self {
            failing: HashSet::new(),
            panicking: HashSet::new(),
            delay: None,
            events,
            attempts: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing_for(mut self, emails: &[&str]) -> Self {
        self.failing = emails.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn panicking_for(mut self, emails: &[&str]) -> Self {
        self.panicking = emails.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Sent(email) => Some(email.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panicking.contains(&email.to) {
            panic!("transport crashed while sending to {}", email.to);
        }
        if self.failing.contains(&email.to) {
            return Err(TransportError::Rejected {
                status: 550,
                body: "mailbox unavailable".to_string(),
            });
        }
        self.events.lock().push(Event::Sent(email.to.clone()));
        Ok(())
    }
}

/// How a wrapped store misbehaves for one recipient's write.
#[derive(Debug, Clone, Copy)]
pub enum WriteFault {
    Hang,
    Unavailable,
}

/// Memory store wrapper with failure injection and an event trail.
pub struct FaultyStore {
    pub inner: MemoryRecipientStore,
    unreachable: bool,
    write_faults: HashMap<RecipientId, WriteFault>,
    events: EventLog,
    selects: AtomicUsize,
    commits: Mutex<HashMap<RecipientId, usize>>,
}

impl FaultyStore {
    pub fn new(emails: &[&str], events: EventLog) -> Self {
        Self {
            inner: MemoryRecipientStore::with_emails(emails.iter().copied()),
            unreachable: false,
            write_faults: HashMap::new(),
            events,
            selects: AtomicUsize::new(0),
            commits: Mutex::new(HashMap::new()),
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn with_write_fault(mut self, id: RecipientId, fault: WriteFault) -> Self {
        self.write_faults.insert(id, fault);
        self
    }

    pub fn selects(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    pub fn commits_for(&self, id: RecipientId) -> usize {
        self.commits.lock().get(&id).copied().unwrap_or(0)
    }

    pub fn mark_requests(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Event::MarkRequested(_)))
            .count()
    }

    pub fn is_delivered(&self, id: RecipientId) -> bool {
        self.inner.get(id).is_some_and(|r| r.has_sent)
    }
}

#[async_trait]
impl RecipientStore for FaultyStore {
    async fn select_pending(&self, limit: i64) -> Result<Vec<Recipient>, StoreError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.select_pending(limit).await
    }

    async fn mark_delivered(&self, id: RecipientId) -> Result<(), StoreError> {
        self.events.lock().push(Event::MarkRequested(id));
        match self.write_faults.get(&id) {
            Some(WriteFault::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            Some(WriteFault::Unavailable) => {
                Err(StoreError::Unavailable("connection reset".to_string()))
            }
            None => {
                self.inner.mark_delivered(id).await?;
                *self.commits.lock().entry(id).or_default() += 1;
                self.events.lock().push(Event::Marked(id));
                Ok(())
            }
        }
    }
}

/// Attachment source that knows a fixed set of files.
pub struct StaticAttachments {
    known: HashSet<String>,
}

impl StaticAttachments {
    pub fn new(known: &[&str]) -> Self {
        Self {
            known: known.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[async_trait]
impl AttachmentSource for StaticAttachments {
    async fn resolve(&self, file_id: &str) -> Result<Attachment, AttachmentError> {
        if self.known.contains(file_id) {
            Ok(Attachment {
                filename: file_id.to_string(),
                content: b"%PDF-1.4".to_vec(),
            })
        } else {
            Err(AttachmentError::NotFound(file_id.to_string()))
        }
    }
}

pub fn message(attachments: &[&str]) -> Arc<MessageTemplate> {
    Arc::new(MessageTemplate {
        from: "sales@example.com".to_string(),
        subject: "Cable tray price offer".to_string(),
        html_body: "<p>Please find our catalog attached.</p>".to_string(),
        attachments: attachments.iter().map(|a| a.to_string()).collect(),
    })
}

pub fn events() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}
