//! voxreader — Lock-key driven screen reader.
//!
//! Hold CapsLock and navigate: arrows move through the interesting elements
//! of the frontmost application, Tab re-reads, the punctuation row dumps
//! element trees to disk. A solo Control tap silences speech; a CapsLock
//! double tap toggles the real lock state.
//!
//! The OS binding shim (event tap, HID stream, AX calls) implements the
//! `Gateway`/`LockState`/`TapControl` seams from a platform build; this
//! binary also runs self-contained against the built-in mock tree
//! (`--mock`), which is how the engine is demoed and tested.

mod dump_file;
mod tts;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use voxreader_ax::{dump, Attr, AxValue, Gateway, MockGateway, Role};
use voxreader_core::agent::{Agent, IngressChannels, NavCommand};
use voxreader_core::config::{self, Config};
use voxreader_core::input::lock_key::{LockState, TimebaseRatio};
use voxreader_core::input::NullTapControl;
use voxreader_core::navigator::DumpKind;
use voxreader_core::SpeechScheduler;

const DEMO_PID: i32 = 1000;

#[derive(Parser, Debug)]
#[command(name = "voxreader", version, about = "Lock-key driven screen reader")]
struct Cli {
    /// Run against the built-in mock tree instead of the OS accessibility API.
    #[arg(long)]
    mock: bool,

    /// Produce one element dump, write it to the dump directory, and exit.
    #[arg(long, value_enum, value_name = "KIND")]
    dump: Option<DumpArg>,

    /// Alternate config file (default: config.json next to the binary).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum DumpArg {
    System,
    App,
    Focus,
}

/// Lock bit for runs without the OS keyboard shim.
#[derive(Default)]
struct InProcessLock {
    on: bool,
}

impl LockState for InProcessLock {
    fn get(&mut self) -> bool {
        self.on
    }

    fn set(&mut self, on: bool) {
        self.on = on;
    }

    fn synthesize_toggle(&mut self, _on: bool) {}
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let code = match real_main() {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn real_main() -> Result<i32> {
    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };

    let gateway = create_gateway(&cli)?;
    if !gateway.confirm_trusted() {
        log::error!("accessibility privilege denied; grant it in system settings and restart");
        return Ok(1);
    }
    gateway.set_timeout(cfg.ax.timeout_secs);

    if let Some(kind) = cli.dump {
        one_shot_dump(&*gateway, kind, &cfg)?;
        return Ok(0);
    }

    run_agent(gateway, &cfg)?;
    Ok(0)
}

fn create_gateway(cli: &Cli) -> Result<Arc<dyn Gateway>> {
    if cli.mock {
        return Ok(Arc::new(demo_gateway()));
    }
    anyhow::bail!(
        "no OS accessibility gateway is linked into this build; run with --mock, \
         or build with a platform shim crate providing the gateway"
    )
}

fn run_agent(gateway: Arc<dyn Gateway>, cfg: &Config) -> Result<()> {
    let (done_tx, done_rx) = crossbeam_channel::unbounded();
    let device = tts::create_tts(&cfg.speech, done_tx)?;
    let scheduler = SpeechScheduler::new(device);

    let agent = Agent::new(
        Arc::clone(&gateway),
        scheduler,
        Box::new(InProcessLock::default()),
        Box::new(NullTapControl),
        TimebaseRatio::IDENTITY,
        cfg,
        Some(dump_file::file_sink(cfg.dump.directory.clone())),
    )?;

    let (tap_tx, tap_rx) = crossbeam_channel::bounded(64);
    let (hid_tx, hid_rx) = crossbeam_channel::bounded(64);
    let (app_tx, app_rx) = crossbeam_channel::bounded(8);
    let channels = IngressChannels {
        tap_events: tap_rx,
        hid_events: hid_rx,
        tts_done: done_rx,
        app_activated: app_rx,
    };

    // Without a platform shim the ingress is the demo script: activate the
    // mock application, walk a few elements, dump the focus, and exit.
    let commands = agent.commands();
    std::thread::Builder::new()
        .name("demo-script".into())
        .spawn(move || {
            let pause = Duration::from_millis(250);
            let _ = app_tx.send(DEMO_PID);
            std::thread::sleep(pause);
            let script = [
                NavCommand::FocusNextSibling { backwards: false },
                NavCommand::FocusNextSibling { backwards: false },
                NavCommand::FocusParent,
                NavCommand::ReadFocus,
                NavCommand::DumpFocus,
            ];
            for command in script {
                let _ = commands.send(command);
                std::thread::sleep(pause);
            }
            drop(tap_tx);
            drop(hid_tx);
        })
        .context("spawn demo-script thread")?;

    agent.run(channels);
    Ok(())
}

fn one_shot_dump(gateway: &dyn Gateway, kind: DumpArg, cfg: &Config) -> Result<()> {
    let (element, kind) = match kind {
        DumpArg::System => (gateway.system_wide(), DumpKind::SystemWide),
        DumpArg::App => (gateway.application(DEMO_PID), DumpKind::Application),
        DumpArg::Focus => {
            let app = gateway.application(DEMO_PID);
            let focused = gateway
                .element_attr(app, Attr::FocusedElement)
                .ok()
                .flatten()
                .unwrap_or(app);
            (focused, DumpKind::Focus)
        }
    };
    match dump(gateway, element, false, true)? {
        Some(node) => {
            let path = dump_file::write_dump(&cfg.dump.directory, kind, &node)?;
            log::info!("dump written to {path:?}");
        }
        None => log::warn!("element vanished before it could be dumped"),
    }
    Ok(())
}

/// A small notepad-shaped tree for `--mock` runs.
fn demo_gateway() -> MockGateway {
    let gw = MockGateway::new();
    let app = gw.add_application(DEMO_PID, "Demo Notepad");
    let win = gw.add_child(app, Role::Window);
    gw.set_attr(win, Attr::Title, AxValue::String("Untitled".into()));

    let toolbar = gw.add_child(win, Role::Toolbar);
    gw.set_attr(toolbar, Attr::Title, AxValue::String("Toolbar".into()));
    for name in ["Save", "Open"] {
        let button = gw.add_child(toolbar, Role::Button);
        gw.set_attr(button, Attr::Title, AxValue::String(name.into()));
        gw.set_attr(button, Attr::RoleDescription, AxValue::String("button".into()));
        gw.add_action(button, "AXPress", "press");
    }

    let text = gw.add_child(win, Role::TextArea);
    gw.set_attr(text, Attr::Value, AxValue::String("Hello, world.".into()));
    gw.set_attr(text, Attr::RoleDescription, AxValue::String("text area".into()));

    let status = gw.add_child(win, Role::StaticText);
    gw.set_attr(status, Attr::Value, AxValue::String("Ln 1, Col 1".into()));

    let first_button = gw.children_in_navigation_order(toolbar).unwrap()[0];
    gw.set_attr(app, Attr::FocusedWindow, AxValue::Element(win));
    gw.set_attr(app, Attr::FocusedElement, AxValue::Element(first_button));
    gw
}
