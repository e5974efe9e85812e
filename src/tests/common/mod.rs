//! Shared test doubles: scripted producers, factories and session fetchers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::time::sleep;

use crate::config::settings::GenerationSettings;
use crate::generation::GenerationCoordinator;
use crate::producer::{ProducerFactory, TokenProducer};
use crate::session::SessionFetcher;
use crate::utils::constants::MIN_PROOF_LENGTH;

pub const SESSION_ID: &str = "session-under-test";

pub fn valid_proof() -> String {
    "p".repeat(MIN_PROOF_LENGTH)
}

/// What one scripted producer does when started.
#[derive(Debug, Clone)]
pub enum Script {
    Succeed { proof: String, delay: Duration },
    Fail { reason: String, delay: Duration },
    Hang,
}

impl Script {
    pub fn succeed_after(ms: u64) -> Self {
        Script::Succeed {
            proof: valid_proof(),
            delay: Duration::from_millis(ms),
        }
    }

    pub fn fail_after(ms: u64) -> Self {
        Script::Fail {
            reason: "scripted failure".to_string(),
            delay: Duration::from_millis(ms),
        }
    }

    pub fn short_proof_after(ms: u64) -> Self {
        Script::Succeed {
            proof: "too-short".to_string(),
            delay: Duration::from_millis(ms),
        }
    }
}

pub struct ScriptedProducer {
    script: Script,
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl TokenProducer for ScriptedProducer {
    async fn start(&mut self) -> Result<String> {
        match self.script.clone() {
            Script::Succeed { proof, delay } => {
                sleep(delay).await;
                Ok(proof)
            }
            Script::Fail { reason, delay } => {
                sleep(delay).await;
                bail!("{reason}")
            }
            Script::Hang => futures_util::future::pending().await,
        }
    }

    async fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out scripted producers in order, falling back to `fallback` once the
/// queue is drained. Records every created producer's stop counter.
pub struct ScriptedFactory {
    scripts: Mutex<VecDeque<Script>>,
    fallback: Script,
    created: AtomicUsize,
    stop_counters: Mutex<Vec<Arc<AtomicUsize>>>,
    session_ids: Mutex<Vec<String>>,
}

impl ScriptedFactory {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            fallback: Script::Hang,
            created: AtomicUsize::new(0),
            stop_counters: Mutex::new(Vec::new()),
            session_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn always(script: Script) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            fallback: script,
            created: AtomicUsize::new(0),
            stop_counters: Mutex::new(Vec::new()),
            session_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Stop-call count per created producer, in creation order.
    pub fn stops(&self) -> Vec<usize> {
        self.stop_counters
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .collect()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.session_ids.lock().unwrap().clone()
    }
}

impl ProducerFactory for ScriptedFactory {
    fn create(&self, session_id: &str) -> Box<dyn TokenProducer> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.session_ids.lock().unwrap().push(session_id.to_string());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let stops = Arc::new(AtomicUsize::new(0));
        self.stop_counters.lock().unwrap().push(stops.clone());
        Box::new(ScriptedProducer { script, stops })
    }
}

/// Fetcher returning a fixed identifier (or failing), counting calls.
pub struct StubFetcher {
    session_id: Option<String>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn ok() -> Self {
        Self {
            session_id: Some(SESSION_ID.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            session_id: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFetcher for StubFetcher {
    async fn fetch_session_id(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.session_id {
            Some(id) => Ok(id.clone()),
            None => bail!("session page unreachable"),
        }
    }
}

pub fn gen_settings(parallel: bool, worker_count: usize) -> GenerationSettings {
    GenerationSettings {
        parallel,
        worker_count,
        ..GenerationSettings::default()
    }
}

pub fn coordinator(
    fetcher: Arc<StubFetcher>,
    factory: Arc<ScriptedFactory>,
    settings: GenerationSettings,
) -> Arc<GenerationCoordinator> {
    Arc::new(GenerationCoordinator::new(fetcher, factory, settings))
}
