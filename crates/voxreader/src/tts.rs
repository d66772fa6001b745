//! TTS backends behind the scheduler's device interface.

use std::process::{Child, Command};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use voxreader_core::config::SpeechConfig;
use voxreader_core::TtsDevice;

/// Build the configured backend. Completion signals go to `done_tx`; the
/// main loop forwards them to the scheduler.
pub fn create_tts(cfg: &SpeechConfig, done_tx: Sender<()>) -> Result<Box<dyn TtsDevice>> {
    match cfg.backend.as_str() {
        "log" => Ok(Box::new(LogTts { done_tx })),
        "say" => Ok(Box::new(SayTts::spawn(cfg.voice.clone(), done_tx)?)),
        other => anyhow::bail!("unknown speech backend {other:?} (expected: log, say)"),
    }
}

/// Logs utterances instead of speaking them. The default backend; also what
/// keeps `--mock` runs silent and CI-safe.
struct LogTts {
    done_tx: Sender<()>,
}

impl TtsDevice for LogTts {
    fn speak(&mut self, text: &str) {
        log::info!("[speech] {text}");
        let _ = self.done_tx.send(());
    }

    fn stop(&mut self) {}
}

enum Job {
    Speak(String),
    Stop,
}

/// Drives the system `say` command, one child process per utterance, on a
/// dedicated worker thread. `stop` kills the current child immediately.
struct SayTts {
    job_tx: Sender<Job>,
}

impl SayTts {
    fn spawn(voice: Option<String>, done_tx: Sender<()>) -> Result<SayTts> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        std::thread::Builder::new()
            .name("speech-synthesis".into())
            .spawn(move || say_worker(job_rx, done_tx, voice))
            .context("spawn speech-synthesis thread")?;
        Ok(SayTts { job_tx })
    }
}

impl TtsDevice for SayTts {
    fn speak(&mut self, text: &str) {
        let _ = self.job_tx.send(Job::Speak(text.to_string()));
    }

    fn stop(&mut self) {
        let _ = self.job_tx.send(Job::Stop);
    }
}

fn say_worker(job_rx: Receiver<Job>, done_tx: Sender<()>, voice: Option<String>) {
    let mut current: Option<Child> = None;
    loop {
        if let Some(child) = &mut current {
            match job_rx.recv_timeout(Duration::from_millis(20)) {
                Ok(Job::Stop) => {
                    kill(child);
                    current = None;
                }
                Ok(Job::Speak(text)) => {
                    kill(child);
                    current = start_utterance(&text, voice.as_deref(), &done_tx);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if matches!(child.try_wait(), Ok(Some(_))) {
                        current = None;
                        let _ = done_tx.send(());
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    kill(child);
                    return;
                }
            }
        } else {
            match job_rx.recv() {
                Ok(Job::Speak(text)) => {
                    current = start_utterance(&text, voice.as_deref(), &done_tx);
                }
                Ok(Job::Stop) => {}
                Err(_) => return,
            }
        }
    }
}

fn start_utterance(text: &str, voice: Option<&str>, done_tx: &Sender<()>) -> Option<Child> {
    let mut command = Command::new("say");
    if let Some(voice) = voice {
        command.arg("-v").arg(voice);
    }
    match command.arg(text).spawn() {
        Ok(child) => Some(child),
        Err(e) => {
            log::error!("failed to start speech synthesis: {e}");
            // Report completion anyway so the scheduler keeps draining.
            let _ = done_tx.send(());
            None
        }
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
