use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontRef {
    pub family: String,
    /// Weight + style as one name, e.g. "Bold Italic".
    pub style: String,
}

impl FontRef {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl Default for FontRef {
    fn default() -> Self {
        Self::new("Inter", "Regular")
    }
}

impl std::fmt::Display for FontRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

/// Normalized RGB(A); channels are expected in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f32>,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: None }
    }

    /// Clamp every channel into [0, 1] and default a missing alpha to 1.
    #[must_use]
    pub fn normalized(self) -> Self {
        let clamp = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            r: clamp(self.r),
            g: clamp(self.g),
            b: clamp(self.b),
            a: Some(self.a.map(clamp).unwrap_or(1.0)),
        }
    }

    pub fn to_hex(self) -> String {
        let c = self.normalized();
        let byte = |v: f32| (v * 255.0).round() as u8;
        format!("#{}", hex::encode([byte(c.r), byte(c.g), byte(c.b)]))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Paint {
    Solid {
        color: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opacity: Option<f32>,
    },
    Gradient {
        kind: String,
    },
    Image,
}

impl Paint {
    pub fn solid(color: Color) -> Self {
        Paint::Solid {
            color,
            opacity: None,
        }
    }

    #[must_use]
    pub fn normalized(&self) -> Self {
        match self {
            Paint::Solid { color, opacity } => Paint::Solid {
                color: color.normalized(),
                opacity: opacity.map(|o| o.clamp(0.0, 1.0)),
            },
            other => other.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpacingUnit {
    Pixels,
    Percent,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LetterSpacing {
    pub value: f32,
    pub unit: SpacingUnit,
}

impl LetterSpacing {
    pub const ZERO: LetterSpacing = LetterSpacing {
        value: 0.0,
        unit: SpacingUnit::Pixels,
    };
}

impl Default for LetterSpacing {
    fn default() -> Self {
        Self::ZERO
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineHeight {
    #[default]
    Auto,
    Pixels(f32),
    Percent(f32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextCase {
    #[default]
    Original,
    Upper,
    Lower,
    Title,
    SmallCaps,
    SmallCapsForced,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    Strikethrough,
}

/// Everything that makes two characters look different. Equality is field-wise deep equality.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleSignature {
    pub font: FontRef,
    pub font_size: f32,
    #[serde(default)]
    pub fills: Vec<Paint>,
    #[serde(default)]
    pub letter_spacing: LetterSpacing,
    #[serde(default)]
    pub line_height: LineHeight,
    #[serde(default)]
    pub text_case: TextCase,
    #[serde(default)]
    pub text_decoration: TextDecoration,
}

impl Default for StyleSignature {
    fn default() -> Self {
        Self {
            font: FontRef::default(),
            font_size: 12.0,
            fills: vec![Paint::solid(Color::BLACK)],
            letter_spacing: LetterSpacing::default(),
            line_height: LineHeight::default(),
            text_case: TextCase::default(),
            text_decoration: TextDecoration::default(),
        }
    }
}

impl StyleSignature {
    pub fn primary_color(&self) -> Option<Color> {
        self.fills.iter().find_map(|p| match p {
            Paint::Solid { color, .. } => Some(*color),
            _ => None,
        })
    }

    pub fn describe_fill(&self) -> String {
        match self.primary_color() {
            Some(c) => c.to_hex(),
            None => "none".to_string(),
        }
    }
}

/// Half-open span over char offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn shifted(&self, by: usize) -> Self {
        Self::new(self.start + by, self.end + by)
    }

    pub fn clamped(&self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleRun {
    pub start: usize,
    pub end: usize,
    pub style: StyleSignature,
}

impl StyleRun {
    pub fn span(&self) -> TextSpan {
        TextSpan::new(self.start, self.end)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedRun {
    pub run: StyleRun,
    pub is_default: bool,
}

impl ClassifiedRun {
    pub fn is_special(&self) -> bool {
        !self.is_default
    }
}
