use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::host::{HostError, StyleProp, StyleValue, TextHost};
use crate::style::{FontRef, StyleSignature, TextSpan};
use crate::textutil::char_len;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanEntry {
    pub span: TextSpan,
    pub style: StyleSignature,
    /// What produced the entry ("default", "service_mapping", a remap rule name).
    pub origin: &'static str,
}

impl PlanEntry {
    pub fn new(span: TextSpan, style: StyleSignature, origin: &'static str) -> Self {
        Self {
            span,
            style,
            origin,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StyleApplicationPlan {
    entries: Vec<PlanEntry>,
}

impl StyleApplicationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PlanEntry) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = PlanEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub entries_applied: usize,
    pub entries_skipped: usize,
    pub prop_errors: usize,
    pub font_fallbacks: usize,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.prop_errors == 0 && self.font_fallbacks == 0 && self.entries_skipped == 0
    }
}

/// Applies plans in entry order; later entries win where spans overlap.
pub struct StyleApplier {
    script_fonts: Vec<FontRef>,
    fallback_font: FontRef,
}

impl StyleApplier {
    pub fn new(fallback_font: FontRef) -> Self {
        Self {
            script_fonts: Vec::new(),
            fallback_font,
        }
    }

    pub fn with_script_fonts(mut self, fonts: Vec<FontRef>) -> Self {
        self.script_fonts = fonts;
        self
    }

    /// Load `font`, else the first script font that loads, else the fallback font. `None`
    /// when nothing loads.
    pub fn resolve_font<W: TextHost + ?Sized>(
        &self,
        host: &mut W,
        font: &FontRef,
    ) -> Option<FontRef> {
        match host.load_font(font) {
            Ok(()) => return Some(font.clone()),
            Err(err) => warn!(font = %font, error = %err, "font load failed; trying fallbacks"),
        }
        let candidates = self
            .script_fonts
            .iter()
            .chain(std::iter::once(&self.fallback_font))
            .filter(|candidate| *candidate != font);
        for candidate in candidates {
            match host.load_font(candidate) {
                Ok(()) => return Some(candidate.clone()),
                Err(err) => debug!(font = %candidate, error = %err, "fallback font load failed"),
            }
        }
        warn!(font = %font, fallback = %self.fallback_font, "no fallback font could be loaded");
        None
    }

    pub fn apply<W: TextHost + ?Sized>(
        &self,
        host: &mut W,
        plan: &StyleApplicationPlan,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();
        let len = char_len(&host.characters());
        let mut fonts: HashMap<FontRef, Option<FontRef>> = HashMap::new();

        for entry in plan.entries() {
            let span = entry.span.clamped(len);
            if span.is_empty() {
                debug!(
                    origin = entry.origin,
                    start = entry.span.start,
                    end = entry.span.end,
                    "skip empty plan entry"
                );
                report.entries_skipped += 1;
                continue;
            }

            let resolved = match fonts.get(&entry.style.font) {
                Some(resolved) => resolved.clone(),
                None => {
                    let resolved = self.resolve_font(host, &entry.style.font);
                    if resolved.as_ref() != Some(&entry.style.font) {
                        report.font_fallbacks += 1;
                    }
                    fonts.insert(entry.style.font.clone(), resolved.clone());
                    resolved
                }
            };

            for value in values_for(&entry.style, resolved) {
                let prop = value.prop();
                if let Err(err) = host.set_range_style(span.start, span.end, value) {
                    report_prop_error(prop, span, &err);
                    report.prop_errors += 1;
                }
            }
            report.entries_applied += 1;
        }
        report
    }
}

// Font is left out when nothing could be loaded.
fn values_for(style: &StyleSignature, font: Option<FontRef>) -> Vec<StyleValue> {
    let mut values = Vec::with_capacity(StyleProp::ALL.len());
    if let Some(font) = font {
        values.push(StyleValue::FontName(font));
    }
    values.push(StyleValue::FontSize(style.font_size));
    values.push(StyleValue::Fills(
        style.fills.iter().map(|p| p.normalized()).collect(),
    ));
    values.push(StyleValue::TextDecoration(style.text_decoration));
    values.push(StyleValue::LetterSpacing(style.letter_spacing));
    values.push(StyleValue::LineHeight(style.line_height));
    values.push(StyleValue::TextCase(style.text_case));
    values
}

fn report_prop_error(prop: StyleProp, span: TextSpan, err: &HostError) {
    warn!(
        ?prop,
        start = span.start,
        end = span.end,
        error = %err,
        "style write failed"
    );
}
