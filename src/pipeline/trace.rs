use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

/// Per-node debugging files. Disabled when no directory is configured.
pub struct TraceWriter {
    dir: Option<PathBuf>,
}

impl TraceWriter {
    pub fn new(dir: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(dir) = dir.as_ref() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create trace dir: {}", dir.display()))?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn write_text(&self, name: &str, text: &str) -> anyhow::Result<()> {
        let Some(dir) = self.dir.as_ref() else {
            return Ok(());
        };
        let path = dir.join(sanitize_filename(name));
        std::fs::write(&path, text).with_context(|| format!("write trace: {}", path.display()))?;
        Ok(())
    }

    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> anyhow::Result<()> {
        if self.dir.is_none() {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(value).context("serialize trace")?;
        self.write_text(name, &json)
    }

    pub fn write_node_text(&self, node_id: &str, kind: &str, text: &str) -> anyhow::Result<()> {
        self.write_text(&format!("node_{node_id}.{kind}.txt"), text)
    }

    pub fn write_node_json<T: Serialize>(
        &self,
        node_id: &str,
        kind: &str,
        value: &T,
    ) -> anyhow::Result<()> {
        self.write_json(&format!("node_{node_id}.{kind}.json"), value)
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_writer_is_a_no_op() {
        let trace = TraceWriter::new(None).expect("trace");
        assert!(trace.dir().is_none());
        trace.write_node_text("1:2", "original", "x").expect("no-op");
    }

    #[test]
    fn node_ids_become_safe_file_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let trace = TraceWriter::new(Some(dir.path().join("_trace"))).expect("trace");
        trace.write_node_text("12:34", "translated", "hola").expect("write");
        trace
            .write_node_json("12:34", "plan", &vec![1, 2, 3])
            .expect("write json");

        let base = dir.path().join("_trace");
        assert_eq!(
            std::fs::read_to_string(base.join("node_12_34.translated.txt")).expect("read"),
            "hola"
        );
        assert!(base.join("node_12_34.plan.json").exists());
    }
}
