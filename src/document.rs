use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::extract::merge_adjacent_runs;
use crate::host::{
    Direction, HostError, ParagraphProp, StyleProp, StyleReader, StyleValue, StyleWriter,
    TextAlign,
};
use crate::style::{FontRef, StyleRun, StyleSignature};
use crate::textutil::char_len;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub spacing: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TextNodeRepr", into = "TextNodeRepr")]
pub struct MemoryTextNode {
    text: String,
    styles: Vec<StyleSignature>,
    base: StyleSignature,
    pub paragraph: ParagraphStyle,
    /// `None` means every font can be loaded.
    pub available_fonts: Option<Vec<FontRef>>,
    pub supports_direction: bool,
    /// Properties whose setter always fails, to mirror hosts that reject some writes.
    pub rejected_props: Vec<StyleProp>,
    loaded_fonts: HashSet<FontRef>,
}

impl MemoryTextNode {
    pub fn new(text: &str, style: StyleSignature) -> Self {
        Self {
            text: text.to_string(),
            styles: vec![style.clone(); char_len(text)],
            base: style,
            paragraph: ParagraphStyle::default(),
            available_fonts: None,
            supports_direction: true,
            rejected_props: Vec::new(),
            loaded_fonts: HashSet::new(),
        }
    }

    /// Overwrite `[start, end)` with `style`, clamped to the buffer.
    pub fn paint(&mut self, start: usize, end: usize, style: &StyleSignature) {
        let end = end.min(self.styles.len());
        for slot in self.styles.iter_mut().take(end).skip(start) {
            *slot = style.clone();
        }
    }

    pub fn style_at(&self, offset: usize) -> Option<&StyleSignature> {
        self.styles.get(offset)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn runs(&self) -> Vec<StyleRun> {
        let per_char = self
            .styles
            .iter()
            .enumerate()
            .map(|(i, s)| StyleRun {
                start: i,
                end: i + 1,
                style: s.clone(),
            })
            .collect();
        merge_adjacent_runs(per_char)
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), HostError> {
        let len = self.styles.len();
        if start > end || end > len {
            return Err(HostError::OutOfBounds { start, end, len });
        }
        Ok(())
    }
}

impl StyleReader for MemoryTextNode {
    fn characters(&self) -> String {
        self.text.clone()
    }

    fn range_style(
        &self,
        prop: StyleProp,
        start: usize,
        end: usize,
    ) -> Result<StyleValue, HostError> {
        self.check_range(start, end)?;
        let mut values = self.styles[start..end]
            .iter()
            .map(|s| StyleValue::of(s, prop));
        let first = values.next().ok_or(HostError::OutOfBounds {
            start,
            end,
            len: self.styles.len(),
        })?;
        if values.any(|v| v != first) {
            return Err(HostError::Mixed(prop));
        }
        Ok(first)
    }
}

impl StyleWriter for MemoryTextNode {
    fn set_characters(&mut self, text: &str) -> Result<(), HostError> {
        let lead = self.styles.first().cloned().unwrap_or_else(|| self.base.clone());
        if !self.loaded_fonts.contains(&lead.font) {
            return Err(HostError::FontNotLoaded(lead.font));
        }
        self.text = text.to_string();
        self.styles = vec![lead; char_len(text)];
        Ok(())
    }

    fn set_range_style(
        &mut self,
        start: usize,
        end: usize,
        value: StyleValue,
    ) -> Result<(), HostError> {
        self.check_range(start, end)?;
        let prop = value.prop();
        if self.rejected_props.contains(&prop) {
            return Err(HostError::Rejected {
                prop,
                reason: "not supported for this node".to_string(),
            });
        }
        match &value {
            StyleValue::FontName(font) if !self.loaded_fonts.contains(font) => {
                return Err(HostError::FontNotLoaded(font.clone()));
            }
            StyleValue::FontSize(size) if !size.is_finite() || *size < 1.0 => {
                return Err(HostError::Rejected {
                    prop,
                    reason: format!("font size {size}"),
                });
            }
            _ => {}
        }
        for slot in &mut self.styles[start..end] {
            value.clone().merge_into(slot);
        }
        Ok(())
    }

    fn load_font(&mut self, font: &FontRef) -> Result<(), HostError> {
        if let Some(available) = self.available_fonts.as_ref() {
            if !available.contains(font) {
                return Err(HostError::FontUnavailable(font.clone()));
            }
        }
        self.loaded_fonts.insert(font.clone());
        Ok(())
    }

    fn paragraph_spacing(&self) -> f32 {
        self.paragraph.spacing
    }

    fn set_paragraph(&mut self, prop: ParagraphProp) -> Result<(), HostError> {
        match prop {
            ParagraphProp::Align(align) => self.paragraph.align = align,
            ParagraphProp::Direction(_) if !self.supports_direction => {
                return Err(HostError::Unsupported("paragraph direction"));
            }
            ParagraphProp::Direction(direction) => self.paragraph.direction = direction,
            ParagraphProp::Spacing(spacing) => self.paragraph.spacing = spacing,
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TextNodeRepr {
    characters: String,
    #[serde(default)]
    runs: Vec<StyleRun>,
    #[serde(default)]
    paragraph: ParagraphStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    available_fonts: Option<Vec<FontRef>>,
    #[serde(default = "default_true")]
    supports_direction: bool,
}

fn default_true() -> bool {
    true
}

impl TryFrom<TextNodeRepr> for MemoryTextNode {
    type Error = String;

    fn try_from(repr: TextNodeRepr) -> Result<Self, Self::Error> {
        let len = char_len(&repr.characters);
        let base = repr
            .runs
            .first()
            .map(|r| r.style.clone())
            .unwrap_or_default();
        let mut node = MemoryTextNode::new(&repr.characters, base);
        for run in &repr.runs {
            if run.start > run.end || run.end > len {
                return Err(format!(
                    "run {}..{} outside text of {} chars",
                    run.start, run.end, len
                ));
            }
            node.paint(run.start, run.end, &run.style);
        }
        node.paragraph = repr.paragraph;
        node.available_fonts = repr.available_fonts;
        node.supports_direction = repr.supports_direction;
        Ok(node)
    }
}

impl From<MemoryTextNode> for TextNodeRepr {
    fn from(node: MemoryTextNode) -> Self {
        let runs = node.runs();
        TextNodeRepr {
            characters: node.text,
            runs,
            paragraph: node.paragraph,
            available_fonts: node.available_fonts,
            supports_direction: node.supports_direction,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<MemoryTextNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn container(id: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            text: None,
            children,
        }
    }

    pub fn text(id: impl Into<String>, text: MemoryTextNode) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            text: Some(text),
            children: Vec::new(),
        }
    }

    pub fn text_node_count(&self) -> usize {
        usize::from(self.text.is_some())
            + self
                .children
                .iter()
                .map(Node::text_node_count)
                .sum::<usize>()
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

pub fn load_tree(path: &Path) -> anyhow::Result<Node> {
    let bytes = fs::read(path).with_context(|| format!("read document: {}", path.display()))?;
    let node: Node = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse document json: {}", path.display()))?;
    Ok(node)
}

pub fn save_tree(path: &Path, node: &Node) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(node).context("serialize document")?;
    fs::write(path, json).with_context(|| format!("write document: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, Paint};

    fn accent() -> StyleSignature {
        StyleSignature {
            fills: vec![Paint::solid(Color::rgb(0.0, 0.4, 1.0))],
            ..StyleSignature::default()
        }
    }

    #[test]
    fn set_characters_requires_loaded_font() {
        let mut node = MemoryTextNode::new("hi", StyleSignature::default());
        assert!(matches!(
            node.set_characters("hola"),
            Err(HostError::FontNotLoaded(_))
        ));
        node.load_font(&FontRef::default()).expect("load");
        node.set_characters("hola").expect("set");
        assert_eq!(node.text(), "hola");
        assert_eq!(node.runs().len(), 1);
    }

    #[test]
    fn range_style_reports_mixed_values() {
        let mut node = MemoryTextNode::new("abcd", StyleSignature::default());
        node.paint(2, 4, &accent());
        assert!(matches!(
            node.range_style(StyleProp::Fills, 0, 4),
            Err(HostError::Mixed(StyleProp::Fills))
        ));
        assert_eq!(
            node.range_style(StyleProp::Fills, 2, 3).expect("read"),
            StyleValue::Fills(accent().fills)
        );
    }

    #[test]
    fn unavailable_font_fails_to_load() {
        let mut node = MemoryTextNode::new("x", StyleSignature::default());
        node.available_fonts = Some(vec![FontRef::default()]);
        assert!(node.load_font(&FontRef::new("Papyrus", "Regular")).is_err());
        assert!(node.load_font(&FontRef::default()).is_ok());
    }

    #[test]
    fn tree_json_keeps_runs_compressed() {
        let mut text = MemoryTextNode::new("Read more", StyleSignature::default());
        text.paint(5, 9, &accent());
        let tree = Node::container("root", vec![Node::text("t1", text.clone())]);

        let json = serde_json::to_string(&tree).expect("serialize");
        let back: Node = serde_json::from_str(&json).expect("deserialize");
        let restored = back.find("t1").and_then(|n| n.text.as_ref()).expect("text");
        assert_eq!(restored.runs(), text.runs());
        assert_eq!(restored.runs().len(), 2);
        assert_eq!(back.text_node_count(), 1);
    }

    #[test]
    fn out_of_range_run_is_rejected_on_load() {
        let json = r#"{"id":"t","text":{"characters":"ab","runs":[{"start":0,"end":5,"style":{"font":{"family":"Inter","style":"Regular"},"font_size":12.0}}]}}"#;
        assert!(serde_json::from_str::<Node>(json).is_err());
    }
}
