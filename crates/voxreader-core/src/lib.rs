//! voxreader-core — The screen-reader engine.
//!
//! Four coupled subsystems: the input capture and shortcut dispatcher
//! (`input`), the accessibility-tree navigator and focus tracker
//! (`navigator`), the semantic reader that turns an element into an ordered
//! token sequence (`reader`), and the priority speech scheduler that
//! serializes utterances with preemption and coalescing (`speech`). The
//! `agent` module wires them together over the gateway seam from
//! `voxreader-ax`.

pub mod agent;
pub mod config;
pub mod input;
pub mod navigator;
pub mod reader;
pub mod speech;
pub mod tokens;

pub use agent::{Agent, NavCommand};
pub use speech::{SpeechScheduler, TtsDevice, UtteranceBatch};
pub use tokens::OutputToken;
