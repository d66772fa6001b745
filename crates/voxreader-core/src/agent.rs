//! The orchestrator: wires input, navigation, and speech together.
//!
//! Three execution domains. The main loop (whoever calls [`Agent::run`])
//! owns the input subsystem and the speech scheduler and selects over the
//! ingress channels. A dedicated `"accessibility"` thread owns the gateway
//! and the navigator, so blocking OS round-trips never stall the main loop;
//! navigator commands are serialized through one bounded channel, which is
//! what keeps concurrent moves impossible. The ingress threads themselves
//! belong to the OS binding shim and only feed the channels.

use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};

use voxreader_ax::Gateway;

pub use crate::navigator::NavCommand;
use crate::config::Config;
use crate::input::keys::{key, HidEvent, KeyStateProbe, TapEvent};
use crate::input::lock_key::{LockState, TimebaseRatio};
use crate::input::shortcuts::ShortcutKey;
use crate::input::{InputSubsystem, TapControl};
use crate::navigator::{DumpSink, Navigator};
use crate::speech::SpeechScheduler;

const COMMAND_CAPACITY: usize = 32;

/// Event sources the main loop drains. In production these are fed by the
/// OS binding shim's callback threads; in tests, by the test body.
pub struct IngressChannels {
    pub tap_events: Receiver<TapEvent>,
    pub hid_events: Receiver<HidEvent>,
    /// One message per finished TTS utterance.
    pub tts_done: Receiver<()>,
    /// Pid of the application that just became frontmost.
    pub app_activated: Receiver<i32>,
}

pub struct Agent {
    scheduler: SpeechScheduler,
    input: InputSubsystem<NavCommand>,
    nav_tx: Sender<NavCommand>,
    nav_thread: Option<thread::JoinHandle<()>>,
}

impl Agent {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        scheduler: SpeechScheduler,
        os_lock: Box<dyn LockState>,
        tap: Box<dyn TapControl>,
        timebase: TimebaseRatio,
        config: &Config,
        dump_sink: Option<DumpSink>,
    ) -> Result<Agent> {
        let mut input = InputSubsystem::new(
            scheduler.clone(),
            os_lock,
            tap,
            timebase,
            config.input.double_tap_window_ms,
        );
        input.set_browse_mode(config.input.browse_mode);
        bind_default_shortcuts(&mut input)?;

        let probe: Arc<dyn KeyStateProbe> = Arc::new(input.probe());
        let (nav_tx, nav_rx) = bounded(COMMAND_CAPACITY);
        let nav_thread =
            spawn_navigator(gateway, scheduler.clone(), probe, nav_rx, dump_sink)?;

        Ok(Agent { scheduler, input, nav_tx, nav_thread: Some(nav_thread) })
    }

    /// Command injection point (used by the demo runner and tests).
    pub fn commands(&self) -> Sender<NavCommand> {
        self.nav_tx.clone()
    }

    pub fn scheduler(&self) -> SpeechScheduler {
        self.scheduler.clone()
    }

    /// Drain ingress until every input channel disconnects.
    pub fn run(mut self, channels: IngressChannels) {
        loop {
            crossbeam_channel::select! {
                recv(channels.tap_events) -> msg => match msg {
                    Ok(event) => {
                        // The gate decision itself is consumed by the binding
                        // shim at tap time; here only the dispatch matters.
                        let (_disposition, action) = self.input.handle_tap(&event);
                        if let Some(command) = action {
                            if self.nav_tx.send(command).is_err() {
                                break;
                            }
                        }
                    }
                    Err(_) => break,
                },
                recv(channels.hid_events) -> msg => match msg {
                    Ok(event) => self.input.handle_hid(&event),
                    Err(_) => break,
                },
                recv(channels.tts_done) -> msg => match msg {
                    Ok(()) => self.scheduler.utterance_finished(),
                    Err(_) => break,
                },
                recv(channels.app_activated) -> msg => match msg {
                    Ok(pid) => {
                        log::info!("frontmost application changed: pid {pid}");
                        if self.nav_tx.send(NavCommand::Refocus { pid }).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                },
            }
        }
        self.shutdown();
    }

    /// Stop the accessibility thread and wait for it.
    pub fn shutdown(mut self) {
        drop(self.nav_tx);
        if let Some(handle) = self.nav_thread.take() {
            if handle.join().is_err() {
                log::error!("accessibility thread panicked");
            }
        }
    }
}

/// The default chord surface. Every chord is taken while the lock key is
/// held; arrows move, Tab re-reads, and the punctuation row dumps trees.
pub fn bind_default_shortcuts(input: &mut InputSubsystem<NavCommand>) -> Result<()> {
    let bindings = [
        (key::TAB, NavCommand::ReadFocus),
        (key::LEFT, NavCommand::FocusNextSibling { backwards: true }),
        (key::RIGHT, NavCommand::FocusNextSibling { backwards: false }),
        (key::DOWN, NavCommand::FocusFirstChild),
        (key::UP, NavCommand::FocusParent),
        (key::SLASH, NavCommand::DumpSystemWide),
        (key::PERIOD, NavCommand::DumpApplication),
        (key::COMMA, NavCommand::DumpFocus),
    ];
    for (code, command) in bindings {
        input
            .bind_key(ShortcutKey::plain(code), command)
            .with_context(|| format!("binding key code {code}"))?;
    }
    Ok(())
}

fn spawn_navigator(
    gateway: Arc<dyn Gateway>,
    scheduler: SpeechScheduler,
    probe: Arc<dyn KeyStateProbe>,
    commands: Receiver<NavCommand>,
    dump_sink: Option<DumpSink>,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("accessibility".into())
        .spawn(move || {
            let mut navigator = Navigator::new(gateway, scheduler, probe);
            if let Some(sink) = dump_sink {
                navigator.set_dump_sink(sink);
            }
            loop {
                // Re-fetched each turn: a retarget swaps the observer and
                // with it the event stream.
                let events = navigator.event_receiver();
                crossbeam_channel::select! {
                    recv(commands) -> msg => match msg {
                        Ok(command) => navigator.handle_command(command),
                        Err(_) => break,
                    },
                    recv(events) -> msg => {
                        if let Ok(event) = msg {
                            navigator.handle_event(event);
                        }
                    }
                }
            }
            log::debug!("accessibility thread exiting");
        })
        .context("spawn accessibility thread")
}
