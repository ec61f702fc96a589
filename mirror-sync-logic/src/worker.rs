use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};

use crate::{
    client::MirrorClient,
    dispatcher, message,
    repository::{cursors, events},
    settings::WorkerSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug, Serialize)]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub running: bool,
    pub topics: Vec<String>,
    pub polling_interval_secs: u64,
    pub page_size: u32,
    pub cursors: HashMap<String, i64>,
    pub iterations: u64,
    pub started_at: Option<DateTime<Utc>>,
}

/// The poll scheduler. Tails every configured topic on a fixed interval,
/// one topic at a time within an iteration, and advances the durable cursor
/// only after the corresponding events are stored.
pub struct MirrorWorker {
    db: Arc<DatabaseConnection>,
    client: MirrorClient,
    settings: WorkerSettings,
    state: RwLock<WorkerState>,
    cursors: RwLock<HashMap<String, i64>>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    iterations: AtomicU64,
    started_at: RwLock<Option<DateTime<Utc>>>,
}

impl MirrorWorker {
    pub fn new(db: Arc<DatabaseConnection>, client: MirrorClient, settings: WorkerSettings) -> Self {
        Self {
            db,
            client,
            settings,
            state: RwLock::new(WorkerState::Stopped),
            cursors: RwLock::new(HashMap::new()),
            shutdown: Mutex::new(None),
            iterations: AtomicU64::new(0),
            started_at: RwLock::new(None),
        }
    }

    /// Starts the polling loop. Returns `Ok(false)` if the worker is already
    /// running (or still stopping), `Ok(true)` once the loop has been spawned.
    pub async fn start(self: &Arc<Self>) -> anyhow::Result<bool> {
        {
            let mut state = self.state.write().await;
            if *state != WorkerState::Stopped {
                return Ok(false);
            }
            *state = WorkerState::Starting;
        }

        if let Err(err) = self.load_cursors().await {
            *self.state.write().await = WorkerState::Stopped;
            return Err(err);
        }

        let (tx, rx) = watch::channel(false);
        *self.shutdown.lock().await = Some(tx);
        *self.started_at.write().await = Some(Utc::now());
        *self.state.write().await = WorkerState::Running;

        tracing::info!(
            topics = ?self.settings.topics,
            polling_interval = ?self.settings.polling_interval,
            "mirror worker started"
        );

        let worker = self.clone();
        tokio::spawn(async move { worker.run_loop(rx).await });
        Ok(true)
    }

    /// Stops the loop. The in-flight iteration, if any, runs to completion so
    /// the store-before-advance ordering is preserved; only further
    /// iterations are cancelled. Returns `false` if the worker was not running.
    pub async fn stop(&self) -> bool {
        {
            let mut state = self.state.write().await;
            if *state != WorkerState::Running {
                return false;
            }
            *state = WorkerState::Stopping;
        }
        if let Some(tx) = self.shutdown.lock().await.take() {
            // Loop side transitions to Stopped once it observes the signal.
            let _ = tx.send(true);
        }
        tracing::info!("mirror worker stopping");
        true
    }

    pub async fn status(&self) -> WorkerStatus {
        let state = *self.state.read().await;
        WorkerStatus {
            state,
            running: state == WorkerState::Running,
            topics: self.settings.topics.clone(),
            polling_interval_secs: self.settings.polling_interval.as_secs(),
            page_size: self.settings.page_size,
            cursors: self.cursors.read().await.clone(),
            iterations: self.iterations.load(Ordering::Relaxed),
            started_at: *self.started_at.read().await,
        }
    }

    async fn run_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            self.run_iteration().await;
            self.iterations.fetch_add(1, Ordering::Relaxed);
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.settings.polling_interval) => {}
            }
        }
        *self.state.write().await = WorkerState::Stopped;
        tracing::info!("mirror worker stopped");
    }

    /// One full pass over the configured topics. A failure in one topic is
    /// logged and does not stop the others from being polled.
    pub(crate) async fn run_iteration(&self) {
        for topic_id in &self.settings.topics {
            if let Err(err) = self.poll_topic(topic_id).await {
                tracing::error!(topic_id = %topic_id, error = ?err, "topic poll failed");
            }
        }
    }

    pub(crate) async fn load_cursors(&self) -> anyhow::Result<()> {
        let mut loaded = HashMap::new();
        for topic_id in &self.settings.topics {
            let cursor = cursors::get(&self.db, topic_id)
                .await
                .with_context(|| format!("loading cursor for topic {topic_id}"))?;
            loaded.insert(topic_id.clone(), cursor);
        }
        *self.cursors.write().await = loaded;
        Ok(())
    }

    async fn poll_topic(&self, topic_id: &str) -> anyhow::Result<()> {
        let cursor = self
            .cursors
            .read()
            .await
            .get(topic_id)
            .copied()
            .unwrap_or(0);
        let messages = self
            .client
            .fetch_messages(topic_id, cursor + 1, self.settings.page_size)
            .await;
        if messages.is_empty() {
            return Ok(());
        }

        let mut advanced = cursor;
        let mut store_failure = None;
        for msg in messages {
            // Overlapping poll windows can re-deliver already-seen sequences.
            if msg.sequence_number <= advanced {
                continue;
            }
            let envelope = message::decode(&msg.message);
            let event = match events::upsert(
                &self.db,
                topic_id,
                msg.sequence_number,
                &msg.consensus_timestamp,
                &msg.running_hash,
                &envelope,
            )
            .await
            {
                Ok(event) => event,
                Err(err) => {
                    // Do not advance past an unstored message: it will be
                    // re-fetched on the next poll.
                    store_failure = Some(err.context(format!(
                        "storing event at sequence {}",
                        msg.sequence_number
                    )));
                    break;
                }
            };
            dispatcher::dispatch(&self.db, &envelope, &event).await;
            advanced = msg.sequence_number;
        }

        if advanced > cursor {
            cursors::set(&self.db, topic_id, advanced)
                .await
                .context("persisting topic cursor")?;
            self.cursors
                .write()
                .await
                .insert(topic_id.to_string(), advanced);
            tracing::debug!(topic_id, from = cursor, to = advanced, "advanced topic cursor");
        }

        match store_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
