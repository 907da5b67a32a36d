use tracing::{debug, warn};

use crate::host::{read_signature, StyleReader};
use crate::style::StyleRun;
use crate::textutil::char_len;

/// Read-only capture of a text node: its characters and their maximal style runs.
#[derive(Clone, Debug, PartialEq)]
pub struct TextSnapshot {
    pub text: String,
    pub runs: Vec<StyleRun>,
}

impl TextSnapshot {
    pub fn capture<R: StyleReader + ?Sized>(reader: &R) -> Self {
        let text = reader.characters();
        let runs = extract_runs_for(reader, &text);
        Self { text, runs }
    }
}

pub fn extract_style_runs<R: StyleReader + ?Sized>(reader: &R) -> Vec<StyleRun> {
    let text = reader.characters();
    extract_runs_for(reader, &text)
}

fn extract_runs_for<R: StyleReader + ?Sized>(reader: &R, text: &str) -> Vec<StyleRun> {
    let len = char_len(text);
    let mut runs: Vec<StyleRun> = Vec::new();
    let mut current: Option<StyleRun> = None;

    for (i, ch) in text.chars().enumerate() {
        let sig = match read_signature(reader, i) {
            Ok(sig) => sig,
            Err(err) => {
                debug!(offset = i, error = %err, "style read failed; offset joins current run");
                continue;
            }
        };
        match current.as_mut() {
            // Unreadable leading offsets belong to the first readable run.
            None => {
                current = Some(StyleRun {
                    start: 0,
                    end: len,
                    style: sig,
                })
            }
            Some(run) => {
                if run.style == sig || ch.is_whitespace() {
                    continue;
                }
                let mut closed = std::mem::replace(
                    run,
                    StyleRun {
                        start: i,
                        end: len,
                        style: sig,
                    },
                );
                closed.end = i;
                runs.push(closed);
            }
        }
    }

    match current {
        Some(run) => runs.push(run),
        None if len > 0 => warn!(len, "no readable style on any offset; no runs extracted"),
        None => {}
    }
    merge_adjacent_runs(runs)
}

/// Join neighbours that carry identical signatures.
pub fn merge_adjacent_runs(runs: Vec<StyleRun>) -> Vec<StyleRun> {
    let mut out: Vec<StyleRun> = Vec::with_capacity(runs.len());
    for run in runs {
        if run.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(prev) if prev.style == run.style && prev.end == run.start => prev.end = run.end,
            _ => out.push(run),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryTextNode;
    use crate::host::{HostError, StyleProp, StyleValue};
    use crate::style::{Color, Paint, StyleSignature};
    use proptest::prelude::*;

    fn accent() -> StyleSignature {
        StyleSignature {
            fills: vec![Paint::solid(Color::rgb(0.1, 0.3, 0.9))],
            ..StyleSignature::default()
        }
    }

    fn bold() -> StyleSignature {
        StyleSignature {
            font: crate::style::FontRef::new("Inter", "Bold"),
            ..StyleSignature::default()
        }
    }

    #[test]
    fn empty_buffer_has_no_runs() {
        let node = MemoryTextNode::new("", StyleSignature::default());
        assert!(extract_style_runs(&node).is_empty());
    }

    #[test]
    fn single_char_is_one_run() {
        let node = MemoryTextNode::new("x", accent());
        let runs = extract_style_runs(&node);
        assert_eq!(runs.len(), 1);
        assert_eq!((runs[0].start, runs[0].end), (0, 1));
    }

    #[test]
    fn accent_run_in_middle_is_split_out() {
        let mut node = MemoryTextNode::new("Open reading lists now", StyleSignature::default());
        node.paint(5, 18, &accent());
        let runs = extract_style_runs(&node);
        let spans: Vec<(usize, usize)> = runs.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(spans, vec![(0, 5), (5, 19), (19, 22)]);
        assert_eq!(runs[1].style, accent());
    }

    #[test]
    fn differently_styled_space_does_not_break_run() {
        let mut node = MemoryTextNode::new("ab cd", bold());
        node.paint(2, 3, &StyleSignature::default());
        let runs = extract_style_runs(&node);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].style, bold());
    }

    struct FlakyReader {
        inner: MemoryTextNode,
        broken: Vec<usize>,
    }

    impl StyleReader for FlakyReader {
        fn characters(&self) -> String {
            self.inner.characters()
        }

        fn range_style(
            &self,
            prop: StyleProp,
            start: usize,
            end: usize,
        ) -> Result<StyleValue, HostError> {
            if self.broken.contains(&start) {
                return Err(HostError::Unsupported("mixed"));
            }
            self.inner.range_style(prop, start, end)
        }
    }

    #[test]
    fn unreadable_offsets_are_skipped_not_fatal() {
        let mut inner = MemoryTextNode::new("abcdef", StyleSignature::default());
        inner.paint(3, 6, &accent());
        let reader = FlakyReader {
            inner,
            broken: vec![0, 4],
        };
        let runs = extract_style_runs(&reader);
        let spans: Vec<(usize, usize)> = runs.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(spans, vec![(0, 3), (3, 6)]);
    }

    fn palette() -> Vec<StyleSignature> {
        vec![StyleSignature::default(), accent(), bold()]
    }

    proptest! {
        #[test]
        fn runs_cover_text_and_reextract_identically(
            cells in proptest::collection::vec(
                (prop_oneof![Just('a'), Just('b'), Just(' ')], 0usize..3),
                0..40,
            )
        ) {
            let text: String = cells.iter().map(|(c, _)| *c).collect();
            let styles = palette();
            let mut node = MemoryTextNode::new(&text, styles[0].clone());
            for (i, (_, s)) in cells.iter().enumerate() {
                node.paint(i, i + 1, &styles[*s]);
            }

            let runs = extract_style_runs(&node);
            let mut cursor = 0usize;
            for run in &runs {
                prop_assert_eq!(run.start, cursor);
                prop_assert!(run.end > run.start);
                cursor = run.end;
            }
            prop_assert_eq!(cursor, cells.len());
            for pair in runs.windows(2) {
                prop_assert_ne!(&pair[0].style, &pair[1].style);
            }

            let mut rebuilt = MemoryTextNode::new(&text, styles[0].clone());
            for run in &runs {
                rebuilt.paint(run.start, run.end, &run.style);
            }
            prop_assert_eq!(extract_style_runs(&rebuilt), runs);
        }
    }
}
