//! The dump-file sink: serialized element trees on disk.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use voxreader_ax::DumpNode;
use voxreader_core::navigator::{DumpKind, DumpSink};

fn kind_slug(kind: DumpKind) -> &'static str {
    match kind {
        DumpKind::SystemWide => "system",
        DumpKind::Application => "app",
        DumpKind::Focus => "focus",
    }
}

/// Write one dump as pretty JSON, named by kind and timestamp.
pub fn write_dump(directory: &Path, kind: DumpKind, node: &DumpNode) -> Result<PathBuf> {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before epoch")?
        .as_secs();
    let path = directory.join(format!("ax-dump-{}-{stamp}.json", kind_slug(kind)));
    let json = serde_json::to_string_pretty(node).context("serialize dump")?;
    std::fs::write(&path, json).with_context(|| format!("write dump to {path:?}"))?;
    Ok(path)
}

/// A navigator sink that writes every dump into `directory`.
pub fn file_sink(directory: PathBuf) -> DumpSink {
    Box::new(move |kind, node| match write_dump(&directory, kind, node) {
        Ok(path) => log::info!("{} dump written to {:?}", kind_slug(kind), path),
        Err(e) => log::error!("failed to write {} dump: {e}", kind_slug(kind)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxreader_ax::{dump, Attr, AxValue, MockGateway, Role};

    #[test]
    fn dump_file_round_trips_as_json() {
        let gw = MockGateway::new();
        let app = gw.add_application(1, "App");
        let win = gw.add_child(app, Role::Window);
        gw.set_attr(win, Attr::Title, AxValue::String("Main".into()));
        let node = dump(&gw, win, false, true).unwrap().unwrap();

        let dir = std::env::temp_dir();
        let path = write_dump(&dir, DumpKind::Focus, &node).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["attributes"]["AXTitle"], serde_json::json!("Main"));
        std::fs::remove_file(path).ok();
    }
}
