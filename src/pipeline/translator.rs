use std::time::Instant;

use anyhow::{anyhow, Context};
use serde::Serialize;
use tracing::{debug, warn};

use crate::apply::{PlanEntry, StyleApplicationPlan, StyleApplier};
use crate::bullets::{detect_bullet_list, format_items, BulletList};
use crate::classify::{classify_runs, default_style, special_runs};
use crate::document::Node;
use crate::extract::TextSnapshot;
use crate::filter::SkipReason;
use crate::host::{StyleValue, TextHost};
use crate::layout::overflow_suspected;
use crate::progress::ConsoleProgress;
use crate::remap::{plan_from_style_mapping, PositionRemapper};
use crate::rtl::{adapt_paragraph, isolate_mixed_content};
use crate::service::{
    fallback_translation, style_hints, StyleHint, StyleMapping, TranslateRequest,
    TranslateResponse, TranslationService,
};
use crate::style::{ClassifiedRun, FontRef, StyleRun, StyleSignature, TextSpan};
use crate::textutil::{char_len, char_slice, preview, span_text};

use super::memory::TranslationMemory;
use super::trace::TraceWriter;
use super::PipelineConfig;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TranslateReport {
    pub nodes_seen: usize,
    pub nodes_translated: usize,
    pub nodes_skipped: usize,
    pub nodes_failed: usize,
    pub fallbacks: usize,
    pub memory_hits: usize,
    pub mapping_hits: usize,
    pub remap_hits: usize,
    pub remap_misses: usize,
    pub apply_errors: usize,
    pub font_fallbacks: usize,
    pub overflow_warnings: usize,
    pub timed_out: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeOutcome {
    Translated,
    Skipped(SkipReason),
}

pub struct TranslatorPipeline {
    cfg: PipelineConfig,
    service: Box<dyn TranslationService>,
    memory: TranslationMemory,
    applier: StyleApplier,
    progress: ConsoleProgress,
    trace: TraceWriter,
}

impl TranslatorPipeline {
    pub fn new(
        cfg: PipelineConfig,
        service: Box<dyn TranslationService>,
        progress: ConsoleProgress,
    ) -> anyhow::Result<Self> {
        let trace = TraceWriter::new(cfg.trace_dir.clone())?;
        Ok(Self {
            memory: TranslationMemory::new(cfg.memory_capacity),
            applier: StyleApplier::new(cfg.fallback_font.clone())
                .with_script_fonts(cfg.patterns.fallback_font_chain(&cfg.target_lang)),
            cfg,
            service,
            progress,
            trace,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    pub fn memory(&self) -> &TranslationMemory {
        &self.memory
    }

    /// Translate every text node under `root` in place, depth first. Node failures are
    /// counted and logged; the walk goes on. Once the timeout passes no further node is
    /// started.
    pub fn translate_tree(&mut self, root: &mut Node) -> anyhow::Result<TranslateReport> {
        let total = root.text_node_count();
        self.progress.info(format!(
            "Translate {total} text nodes -> {}",
            self.cfg.target_lang
        ));
        if self.cfg.force_retranslate {
            self.memory.clear(Some(&self.cfg.target_lang));
        }
        let deadline = self.cfg.timeout.map(|t| Instant::now() + t);
        let mut report = TranslateReport::default();
        self.walk(root, total, deadline, &mut report);

        if report.timed_out {
            self.progress.info(format!(
                "Timeout reached after {} of {total} nodes; the rest is untouched",
                report.nodes_seen
            ));
        }
        self.progress.info(format!(
            "Done. translated={} skipped={} failed={} fallbacks={}",
            report.nodes_translated, report.nodes_skipped, report.nodes_failed, report.fallbacks
        ));
        self.trace
            .write_json("report.json", &report)
            .context("write trace report")?;
        Ok(report)
    }

    pub fn translate_container(&mut self, root: &Node) -> anyhow::Result<(Node, TranslateReport)> {
        let mut copy = root.clone();
        let report = self.translate_tree(&mut copy)?;
        Ok((copy, report))
    }

    fn walk(
        &mut self,
        node: &mut Node,
        total: usize,
        deadline: Option<Instant>,
        report: &mut TranslateReport,
    ) {
        if report.timed_out {
            return;
        }
        if let Some(text) = node.text.as_mut() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(node = %node.id, "timeout reached; stopping");
                report.timed_out = true;
                return;
            }
            report.nodes_seen += 1;
            self.progress.node(report.nodes_seen, total, &node.name);
            match self.translate_text_node(&node.id, &node.name, text, report) {
                Ok(NodeOutcome::Translated) => report.nodes_translated += 1,
                Ok(NodeOutcome::Skipped(reason)) => {
                    debug!(node = %node.id, reason = reason.as_str(), "skip node");
                    report.nodes_skipped += 1;
                }
                Err(err) => {
                    warn!(node = %node.id, error = %format!("{err:#}"), "node failed");
                    report.nodes_failed += 1;
                }
            }
        }
        for child in &mut node.children {
            self.walk(child, total, deadline, report);
        }
    }

    /// Translate one text node and re-apply its styles. An `Err` leaves the node's text as
    /// it was.
    pub fn translate_text_node<H: TextHost + ?Sized>(
        &mut self,
        id: &str,
        name: &str,
        host: &mut H,
        report: &mut TranslateReport,
    ) -> anyhow::Result<NodeOutcome> {
        let snapshot = TextSnapshot::capture(&*host);
        let original = snapshot.text.as_str();
        if let Some(reason) = self.cfg.filter.skip_reason(name, original) {
            return Ok(NodeOutcome::Skipped(reason));
        }
        let Some(lead) = snapshot.runs.first() else {
            return Err(anyhow!("no style runs could be read"));
        };

        let classified = classify_runs(&snapshot.runs);
        let base = default_style(&classified)
            .cloned()
            .unwrap_or_else(|| lead.style.clone());

        let (translated, plan) = match detect_bullet_list(original) {
            Some(list) => self.translate_list(&list, &classified, &base, report),
            None => self.translate_whole(original, &classified, &base, report),
        };

        self.write_characters(host, &lead.style.font, &translated)
            .with_context(|| format!("write translated text for node {id}"))?;
        let applied = self.applier.apply(host, &plan);
        report.apply_errors += applied.prop_errors;
        report.font_fallbacks += applied.font_fallbacks;

        let lang = self.cfg.target_lang.as_str();
        if self.cfg.patterns.is_rtl(lang, &translated) {
            report.apply_errors += adapt_paragraph(host, lang, base.font_size);
        }
        if overflow_suspected(original, &translated, lang, self.cfg.overflow_tolerance) {
            warn!(
                node = id,
                original_chars = char_len(original),
                translated_chars = char_len(&translated),
                "translation may overflow its box"
            );
            report.overflow_warnings += 1;
        }

        self.trace_node(id, original, &translated, &plan);
        debug!(
            node = id,
            original = %preview(original, 60),
            translated = %preview(&translated, 60),
            entries = plan.len(),
            "node translated"
        );
        Ok(NodeOutcome::Translated)
    }

    fn translate_whole(
        &mut self,
        original: &str,
        classified: &[ClassifiedRun],
        base: &StyleSignature,
        report: &mut TranslateReport,
    ) -> (String, StyleApplicationPlan) {
        let hints = if self.cfg.preserve_styles && self.cfg.request_style_hints {
            style_hints(original, classified)
        } else {
            Vec::new()
        };
        let (response, fell_back) = self.translate_text(original, hints, report);
        let mut translated = response.translated_text;
        if !fell_back
            && self.cfg.isolate_mixed_content
            && self.cfg.patterns.is_rtl(&self.cfg.target_lang, &translated)
        {
            translated = isolate_mixed_content(&translated);
        }

        let mut plan = StyleApplicationPlan::new();
        plan.push(PlanEntry::new(
            TextSpan::new(0, char_len(&translated)),
            base.clone(),
            "default",
        ));
        if self.cfg.preserve_styles {
            let entries = self.plan_special_runs(
                original,
                classified,
                &translated,
                &response.style_mapping,
                report,
            );
            plan.extend(entries);
        }
        (translated, plan)
    }

    /// Items are translated one by one and re-joined with canonical bullets. Special runs are
    /// remapped inside their own item, then shifted to the item's place in the new text.
    fn translate_list(
        &mut self,
        list: &BulletList,
        classified: &[ClassifiedRun],
        base: &StyleSignature,
        report: &mut TranslateReport,
    ) -> (String, StyleApplicationPlan) {
        let mut translated_items = Vec::with_capacity(list.items.len());
        let mut mappings = Vec::with_capacity(list.items.len());
        let mut fallback_items = Vec::with_capacity(list.items.len());
        for item in &list.items {
            if item.clean.trim().is_empty() {
                translated_items.push(String::new());
                mappings.push(Vec::new());
                fallback_items.push(false);
                continue;
            }
            let (response, fell_back) = self.translate_text(&item.clean, Vec::new(), report);
            translated_items.push(response.translated_text);
            mappings.push(response.style_mapping);
            fallback_items.push(fell_back);
        }

        let lang = self.cfg.target_lang.as_str();
        let rtl = self.cfg.patterns.is_rtl(lang, &translated_items.join("\n"));
        if rtl && self.cfg.isolate_mixed_content {
            for (item, fell_back) in translated_items.iter_mut().zip(&fallback_items) {
                if !fell_back {
                    *item = isolate_mixed_content(item);
                }
            }
        }
        let formatted = format_items(&translated_items, rtl);

        let mut plan = StyleApplicationPlan::new();
        plan.push(PlanEntry::new(
            TextSpan::new(0, char_len(&formatted.text)),
            base.clone(),
            "default",
        ));
        if !self.cfg.preserve_styles {
            return (formatted.text, plan);
        }

        for ((item, at), item_mappings) in list
            .items
            .iter()
            .zip(&formatted.item_spans)
            .zip(&mappings)
        {
            let local = localize_runs(classified, item.clean_span);
            let item_text = span_text(&formatted.text, *at);
            let entries =
                self.plan_special_runs(&item.clean, &local, item_text, item_mappings, report);
            plan.extend(entries.into_iter().map(|entry| PlanEntry {
                span: entry.span.shifted(at.start),
                ..entry
            }));
        }
        (formatted.text, plan)
    }

    fn plan_special_runs(
        &self,
        original: &str,
        classified: &[ClassifiedRun],
        translated: &str,
        mappings: &[StyleMapping],
        report: &mut TranslateReport,
    ) -> Vec<PlanEntry> {
        if !mappings.is_empty() {
            let entries = plan_from_style_mapping(mappings, classified, original, translated);
            if !entries.is_empty() {
                report.mapping_hits += entries.len();
                return entries;
            }
            debug!(count = mappings.len(), "no style mapping resolved; using remap rules");
        }

        let remapper = PositionRemapper::new(
            original,
            translated,
            &self.cfg.target_lang,
            &self.cfg.patterns,
        );
        let mut entries = Vec::new();
        for special in special_runs(classified) {
            let run = special.run.span();
            if char_slice(original, run.start, run.end).trim().is_empty() {
                continue;
            }
            match remapper.remap(run) {
                Some(hit) => {
                    report.remap_hits += 1;
                    entries.push(PlanEntry::new(hit.span, special.run.style.clone(), hit.rule));
                }
                None => report.remap_misses += 1,
            }
        }
        entries
    }

    /// Memory, then the service, then the visible fallback. The flag is set for fallback
    /// text, which is never remembered.
    fn translate_text(
        &mut self,
        text: &str,
        hints: Vec<StyleHint>,
        report: &mut TranslateReport,
    ) -> (TranslateResponse, bool) {
        let lang = self.cfg.target_lang.clone();
        if !self.cfg.force_retranslate {
            if let Some(hit) = self.memory.get(&lang, text) {
                report.memory_hits += 1;
                return (hit.clone(), false);
            }
        }

        let req = TranslateRequest {
            text: text.to_string(),
            target_lang: lang.clone(),
            force_retranslate: self.cfg.force_retranslate,
            style_hints: hints,
        };
        match self.service.translate(&req) {
            Ok(resp) if !resp.translated_text.trim().is_empty() => {
                self.memory.insert(&lang, text, resp.clone());
                (resp, false)
            }
            Ok(_) => {
                warn!(
                    text = %preview(text, 60),
                    "service returned an empty translation; using fallback"
                );
                report.fallbacks += 1;
                (TranslateResponse::plain(fallback_translation(text, &lang)), true)
            }
            Err(err) => {
                warn!(
                    text = %preview(text, 60),
                    error = %err,
                    "translation failed; using fallback"
                );
                report.fallbacks += 1;
                (TranslateResponse::plain(fallback_translation(text, &lang)), true)
            }
        }
    }

    // On a refused write the whole node is switched to the resolved font, then retried.
    fn write_characters<H: TextHost + ?Sized>(
        &self,
        host: &mut H,
        lead_font: &FontRef,
        text: &str,
    ) -> anyhow::Result<()> {
        let Some(font) = self.applier.resolve_font(host, lead_font) else {
            return Err(anyhow!("neither {lead_font} nor any fallback font could be loaded"));
        };
        let first_err = match host.set_characters(text) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        debug!(error = %first_err, font = %font, "retry set_characters with resolved font");

        let len = char_len(&host.characters());
        if len > 0 {
            host.set_range_style(0, len, StyleValue::FontName(font))
                .context("switch node font")?;
        }
        host.set_characters(text)
            .with_context(|| format!("set characters (first attempt: {first_err})"))
    }

    fn trace_node(&self, id: &str, original: &str, translated: &str, plan: &StyleApplicationPlan) {
        if self.trace.dir().is_none() {
            return;
        }
        let writes = [
            self.trace.write_node_text(id, "original", original),
            self.trace.write_node_text(id, "translated", translated),
            self.trace.write_node_json(id, "plan", plan),
        ];
        for err in writes.into_iter().filter_map(Result::err) {
            warn!(node = id, error = %format!("{err:#}"), "trace write failed");
        }
    }
}

/// Runs clipped to `span` and rebased so `span.start` becomes 0.
fn localize_runs(classified: &[ClassifiedRun], span: TextSpan) -> Vec<ClassifiedRun> {
    classified
        .iter()
        .filter_map(|c| {
            let start = c.run.start.max(span.start);
            let end = c.run.end.min(span.end);
            (start < end).then(|| ClassifiedRun {
                run: StyleRun {
                    start: start - span.start,
                    end: end - span.start,
                    style: c.run.style.clone(),
                },
                is_default: c.is_default,
            })
        })
        .collect()
}
