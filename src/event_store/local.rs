//! Local Event Store - in-memory log with optional JSONL persistence
//!
//! Events live in an in-memory vector in insertion order. When a data
//! directory is configured every insert is first appended to
//! `events.jsonl` and fsynced on a blocking thread, and the file is replayed
//! on open.
//!
//! Only newline-terminated lines count as written. A failed append is cut
//! back to the previous file length; if that also fails the next append
//! starts on a fresh line so the fragment cannot swallow it. A torn tail
//! left by a crash is truncated on open.

use std::collections::{BTreeSet, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::aggregate::{group_events, AggregateQuery, GroupRow};
use super::filter::{EventField, EventFilter, EventPage};
use super::store::{EventStore, EventStoreConfig, StoreResult};
use crate::types::{Event, NewEvent};

#[derive(Default)]
struct EventLog {
    events: Vec<Event>,
    by_id: HashMap<Uuid, usize>,
}

impl EventLog {
    fn push(&mut self, event: Event) {
        self.by_id.insert(event.id, self.events.len());
        self.events.push(event);
    }
}

/// File the event log is appended to
trait LogFile: Write {
    fn size(&self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Appends whole batches, rolling back partial writes
struct Appender<F> {
    file: F,
    /// The file may end in an unterminated fragment
    torn_tail: bool,
}

impl<F: LogFile> Appender<F> {
    fn new(file: F) -> Self {
        Self {
            file,
            torn_tail: false,
        }
    }

    /// Write `buf` and fsync, or leave no complete line of it behind
    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        let prev_len = self.file.size()?;

        let written = self.write_from_line_start(buf);
        if let Err(e) = written {
            match self.file.truncate_to(prev_len).and_then(|()| self.file.sync()) {
                Ok(()) => {}
                Err(rollback) => {
                    error!(error = %rollback, len = prev_len, "Failed to roll back partial append");
                    self.torn_tail = true;
                }
            }
            return Err(e);
        }

        self.torn_tail = false;
        Ok(())
    }

    fn write_from_line_start(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.torn_tail {
            self.file.write_all(b"\n")?;
        }
        self.file.write_all(buf)?;
        self.file.sync()
    }
}

fn publish(log: &RwLock<EventLog>, stored: &[Event]) {
    let mut log = log.write();
    for event in stored {
        log.push(event.clone());
    }
    debug!(count = stored.len(), "Committed events");
}

/// EventStore backed by process memory and an append-only JSONL file
pub struct LocalEventStore {
    config: EventStoreConfig,
    log: Arc<RwLock<EventLog>>,
    /// Serializes appends so file order matches memory order
    appender: Arc<Mutex<Option<Appender<File>>>>,
}

impl LocalEventStore {
    /// Store that keeps events in memory only
    pub fn in_memory() -> Self {
        Self {
            config: EventStoreConfig::in_memory(),
            log: Arc::new(RwLock::new(EventLog::default())),
            appender: Arc::new(Mutex::new(None)),
        }
    }

    /// Open a store, replaying any existing event log
    pub fn open(config: EventStoreConfig) -> StoreResult<Self> {
        let mut log = EventLog::default();

        let appender = match config.events_path() {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                let (events, complete_len) = Self::load_events(&path)?;
                for event in events {
                    log.push(event);
                }
                info!(
                    path = %path.display(),
                    events = log.events.len(),
                    "Replayed event log"
                );

                let file = OpenOptions::new().create(true).append(true).open(&path)?;
                if file.size()? > complete_len {
                    file.set_len(complete_len)?;
                    file.sync_all()?;
                }
                Some(Appender::new(file))
            }
            None => None,
        };

        Ok(Self {
            config,
            log: Arc::new(RwLock::new(log)),
            appender: Arc::new(Mutex::new(appender)),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &EventStoreConfig {
        &self.config
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.log.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load all events from a JSONL file, skipping unparsable lines
    ///
    /// Also returns the byte length of the newline-terminated prefix.
    fn load_events(path: &Path) -> StoreResult<(Vec<Event>, u64)> {
        if !path.exists() {
            return Ok((Vec::new(), 0));
        }

        let mut reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        let mut complete_len = 0u64;
        let mut line = Vec::new();
        let mut line_num = 0usize;

        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 {
                break;
            }
            line_num += 1;

            if line.last() != Some(&b'\n') {
                warn!(line = line_num, bytes = read, "Discarding torn tail of event log");
                break;
            }
            complete_len += read as u64;

            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            match Event::from_json_line(text) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!(line = line_num, error = %e, "Skipping unparsable event");
                }
            }
        }

        Ok((events, complete_len))
    }

    /// Persist then publish; nothing becomes visible if the write fails
    async fn commit(&self, stored: Vec<Event>) -> StoreResult<Vec<Event>> {
        if self.config.events_path().is_none() {
            publish(&self.log, &stored);
            return Ok(stored);
        }

        let mut buf = String::new();
        for event in &stored {
            buf.push_str(&event.to_json_line()?);
            buf.push('\n');
        }

        let appender = Arc::clone(&self.appender);
        let log = Arc::clone(&self.log);
        tokio::task::spawn_blocking(move || -> StoreResult<Vec<Event>> {
            let mut appender = appender.lock();
            if let Some(appender) = appender.as_mut() {
                appender.append(buf.as_bytes())?;
            }
            publish(&log, &stored);
            Ok(stored)
        })
        .await?
    }
}

#[async_trait]
impl EventStore for LocalEventStore {
    async fn insert_one(&self, event: NewEvent) -> StoreResult<Event> {
        let event = event.into_event(Uuid::new_v4());
        self.commit(vec![event.clone()]).await?;
        Ok(event)
    }

    async fn insert_many(&self, events: Vec<NewEvent>) -> StoreResult<Vec<Event>> {
        let stored: Vec<Event> = events
            .into_iter()
            .map(|e| e.into_event(Uuid::new_v4()))
            .collect();
        self.commit(stored).await
    }

    async fn find_page(&self, filter: &EventFilter, offset: usize, limit: usize) -> StoreResult<EventPage> {
        let log = self.log.read();

        let mut matching: Vec<&Event> = log.events.iter().filter(|e| filter.matches(e)).collect();
        let total = matching.len() as u64;

        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let events = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(EventPage { events, total })
    }

    async fn count(&self, filter: &EventFilter) -> StoreResult<u64> {
        let log = self.log.read();
        Ok(log.events.iter().filter(|e| filter.matches(e)).count() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let log = self.log.read();
        Ok(log.by_id.get(&id).map(|&i| log.events[i].clone()))
    }

    async fn distinct_values(&self, field: EventField) -> StoreResult<Vec<String>> {
        let log = self.log.read();
        let values: BTreeSet<String> = log.events.iter().map(|e| field.value_of(e)).collect();
        Ok(values.into_iter().collect())
    }

    async fn aggregate(&self, query: &AggregateQuery) -> StoreResult<Vec<GroupRow>> {
        let log = self.log.read();
        let matching = log.events.iter().filter(|e| query.filter.matches(e));
        Ok(group_events(matching, query))
    }
}
