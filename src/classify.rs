use crate::style::{ClassifiedRun, StyleRun, StyleSignature};

/// Mark the runs whose signature covers the most characters as default; every other run
/// is special. Ties keep the signature seen first.
pub fn classify_runs(runs: &[StyleRun]) -> Vec<ClassifiedRun> {
    let mut totals: Vec<(&StyleSignature, usize)> = Vec::new();
    for run in runs {
        match totals.iter_mut().find(|(sig, _)| **sig == run.style) {
            Some((_, total)) => *total += run.len(),
            None => totals.push((&run.style, run.len())),
        }
    }

    let mut default: Option<(&StyleSignature, usize)> = None;
    for (sig, total) in totals {
        if default.map_or(true, |(_, best)| total > best) {
            default = Some((sig, total));
        }
    }

    runs.iter()
        .map(|run| ClassifiedRun {
            is_default: default.is_some_and(|(sig, _)| *sig == run.style),
            run: run.clone(),
        })
        .collect()
}

pub fn default_style(classified: &[ClassifiedRun]) -> Option<&StyleSignature> {
    classified
        .iter()
        .find(|c| c.is_default)
        .or_else(|| classified.first())
        .map(|c| &c.run.style)
}

pub fn special_runs(classified: &[ClassifiedRun]) -> impl Iterator<Item = &ClassifiedRun> {
    classified.iter().filter(|c| c.is_special())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, Paint};

    fn sig(r: f32) -> StyleSignature {
        StyleSignature {
            fills: vec![Paint::solid(Color::rgb(r, 0.0, 0.0))],
            ..StyleSignature::default()
        }
    }

    fn run(start: usize, end: usize, style: StyleSignature) -> StyleRun {
        StyleRun { start, end, style }
    }

    #[test]
    fn dominant_signature_by_total_chars_wins() {
        // a: 3 + 3 = 6 chars, b: 5 chars in one run
        let runs = vec![
            run(0, 3, sig(0.1)),
            run(3, 8, sig(0.5)),
            run(8, 11, sig(0.1)),
        ];
        let out = classify_runs(&runs);
        assert!(out[0].is_default && out[2].is_default);
        assert!(out[1].is_special());
        assert_eq!(default_style(&out), Some(&sig(0.1)));
    }

    #[test]
    fn tie_goes_to_first_signature() {
        let runs = vec![run(0, 4, sig(0.2)), run(4, 8, sig(0.7))];
        let out = classify_runs(&runs);
        assert!(out[0].is_default);
        assert!(out[1].is_special());
    }

    #[test]
    fn single_signature_has_no_special_runs() {
        let runs = vec![run(0, 5, sig(0.3))];
        let out = classify_runs(&runs);
        assert_eq!(special_runs(&out).count(), 0);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(classify_runs(&[]).is_empty());
        assert_eq!(default_style(&[]), None);
    }
}
