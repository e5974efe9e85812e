//! Subprocess-backed producer
//!
//! Runs the configured proof derivation command with the session identifier as
//! its last argument and reads the proof from stdout. The derivation mechanism
//! itself is opaque to this service.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::debug;

use super::TokenProducer;

pub struct CommandProducer {
    program: String,
    args: Vec<String>,
    session_id: String,
    child: Option<Child>,
}

impl CommandProducer {
    pub fn new(program: impl Into<String>, args: Vec<String>, session_id: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            session_id: session_id.into(),
            child: None,
        }
    }
}

#[async_trait]
impl TokenProducer for CommandProducer {
    async fn start(&mut self) -> Result<String> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&self.session_id)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to spawn proof command '{}'", self.program))?;
        let mut stdout = child
            .stdout
            .take()
            .context("proof command stdout was not captured")?;

        // Keep the child reachable from stop() while we wait on it.
        self.child = Some(child);
        let status = match self.child.as_mut() {
            Some(child) => child.wait().await.context("proof command wait failed")?,
            None => bail!("producer was stopped before it started"),
        };
        self.child = None;

        let mut output = String::new();
        stdout
            .read_to_string(&mut output)
            .await
            .context("failed to read proof command output")?;

        if !status.success() {
            bail!("proof command exited with {status}");
        }
        let proof = output.trim().to_string();
        debug!(len = proof.len(), "proof command completed");
        Ok(proof)
    }

    async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }
}

/// Factory handing each attempt a fresh [`CommandProducer`].
#[derive(Debug, Clone)]
pub struct CommandProducerFactory {
    program: String,
    args: Vec<String>,
}

impl CommandProducerFactory {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl super::ProducerFactory for CommandProducerFactory {
    fn create(&self, session_id: &str) -> Box<dyn TokenProducer> {
        Box::new(CommandProducer::new(
            self.program.clone(),
            self.args.clone(),
            session_id,
        ))
    }
}
