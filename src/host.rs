use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::style::{
    FontRef, LetterSpacing, LineHeight, Paint, StyleSignature, TextCase, TextDecoration,
};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("range {start}..{end} out of bounds (len {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("font not loaded: {0}")]
    FontNotLoaded(FontRef),

    #[error("font unavailable: {0}")]
    FontUnavailable(FontRef),

    #[error("mixed values for {0:?}")]
    Mixed(StyleProp),

    #[error("unsupported by host: {0}")]
    Unsupported(&'static str),

    #[error("rejected {prop:?}: {reason}")]
    Rejected { prop: StyleProp, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleProp {
    FontName,
    FontSize,
    Fills,
    LetterSpacing,
    LineHeight,
    TextCase,
    TextDecoration,
}

impl StyleProp {
    pub const ALL: [StyleProp; 7] = [
        StyleProp::FontName,
        StyleProp::FontSize,
        StyleProp::Fills,
        StyleProp::LetterSpacing,
        StyleProp::LineHeight,
        StyleProp::TextCase,
        StyleProp::TextDecoration,
    ];
}

#[derive(Clone, Debug, PartialEq)]
pub enum StyleValue {
    FontName(FontRef),
    FontSize(f32),
    Fills(Vec<Paint>),
    LetterSpacing(LetterSpacing),
    LineHeight(LineHeight),
    TextCase(TextCase),
    TextDecoration(TextDecoration),
}

impl StyleValue {
    pub fn prop(&self) -> StyleProp {
        match self {
            StyleValue::FontName(_) => StyleProp::FontName,
            StyleValue::FontSize(_) => StyleProp::FontSize,
            StyleValue::Fills(_) => StyleProp::Fills,
            StyleValue::LetterSpacing(_) => StyleProp::LetterSpacing,
            StyleValue::LineHeight(_) => StyleProp::LineHeight,
            StyleValue::TextCase(_) => StyleProp::TextCase,
            StyleValue::TextDecoration(_) => StyleProp::TextDecoration,
        }
    }

    pub fn of(style: &StyleSignature, prop: StyleProp) -> Self {
        match prop {
            StyleProp::FontName => StyleValue::FontName(style.font.clone()),
            StyleProp::FontSize => StyleValue::FontSize(style.font_size),
            StyleProp::Fills => StyleValue::Fills(style.fills.clone()),
            StyleProp::LetterSpacing => StyleValue::LetterSpacing(style.letter_spacing),
            StyleProp::LineHeight => StyleValue::LineHeight(style.line_height),
            StyleProp::TextCase => StyleValue::TextCase(style.text_case),
            StyleProp::TextDecoration => StyleValue::TextDecoration(style.text_decoration),
        }
    }

    /// Write this value into the matching field of `style`.
    pub fn merge_into(self, style: &mut StyleSignature) {
        match self {
            StyleValue::FontName(v) => style.font = v,
            StyleValue::FontSize(v) => style.font_size = v,
            StyleValue::Fills(v) => style.fills = v,
            StyleValue::LetterSpacing(v) => style.letter_spacing = v,
            StyleValue::LineHeight(v) => style.line_height = v,
            StyleValue::TextCase(v) => style.text_case = v,
            StyleValue::TextDecoration(v) => style.text_decoration = v,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParagraphProp {
    Align(TextAlign),
    Direction(Direction),
    Spacing(f32),
}

pub trait StyleReader {
    fn characters(&self) -> String;

    /// Style property over `[start, end)` in char offsets. Engine code only asks for one char.
    fn range_style(&self, prop: StyleProp, start: usize, end: usize)
        -> Result<StyleValue, HostError>;
}

pub trait StyleWriter {
    fn set_characters(&mut self, text: &str) -> Result<(), HostError>;

    fn set_range_style(
        &mut self,
        start: usize,
        end: usize,
        value: StyleValue,
    ) -> Result<(), HostError>;

    /// Must succeed before a font is written with [`StyleWriter::set_range_style`].
    fn load_font(&mut self, font: &FontRef) -> Result<(), HostError>;

    fn paragraph_spacing(&self) -> f32;

    fn set_paragraph(&mut self, prop: ParagraphProp) -> Result<(), HostError>;
}

pub trait TextHost: StyleReader + StyleWriter {}

impl<T: StyleReader + StyleWriter + ?Sized> TextHost for T {}

/// Read every property of the single char at `offset`.
pub fn read_signature<R: StyleReader + ?Sized>(
    reader: &R,
    offset: usize,
) -> Result<StyleSignature, HostError> {
    let mut sig = StyleSignature::default();
    for prop in StyleProp::ALL {
        reader
            .range_style(prop, offset, offset + 1)?
            .merge_into(&mut sig);
    }
    Ok(sig)
}
