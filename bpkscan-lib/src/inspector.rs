//! Long-lived inspection session over one document.
//!
//! The inspector keeps the only state that survives between scans: the
//! first-seen inline style of every flagged element, and the latest results.
//! Remediation effects are always recomputed from that snapshot, so turning
//! every effect off restores the element's original `style` attribute exactly.

use crate::config::ScanConfig;
use crate::dom::dom_tree::{Document, ElementId, NodeRef};
use crate::error::ScanError;
use crate::events::{ListenerResult, Listeners};
use crate::scan::coordinator::{ScanResult, Scanner};
use crate::watch::ChangeWatcher;
use std::collections::HashMap;
use std::time::Instant;

/// Inline style of an element as first observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSnapshot {
    pub inline_style: Option<String>,
}

impl StyleSnapshot {
    fn capture(element: &NodeRef) -> Self {
        StyleSnapshot {
            inline_style: element
                .borrow()
                .as_element()
                .and_then(|elem| elem.inline_style())
                .map(str::to_string),
        }
    }
}

pub struct Inspector {
    scanner: Scanner,
    highlight_outline: String,
    snapshots: HashMap<ElementId, StyleSnapshot>,
    results: Vec<ScanResult>,
    highlighting: bool,
    forcing: bool,
    listeners: Listeners<[ScanResult]>,
    watcher: ChangeWatcher,
    scan_count: u64,
    last_failures: Vec<ScanError>,
}

impl Inspector {
    pub fn new(scanner: Scanner, config: &ScanConfig) -> Self {
        Inspector {
            scanner,
            highlight_outline: config.highlight_outline.clone(),
            snapshots: HashMap::new(),
            results: Vec::new(),
            highlighting: false,
            forcing: false,
            listeners: Listeners::new(),
            watcher: ChangeWatcher::new(config.settle_delay),
            scan_count: 0,
            last_failures: Vec::new(),
        }
    }

    /// Registers a presenter notified with the results of every scan.
    pub fn subscribe(
        &mut self,
        name: impl Into<String>,
        listener: impl FnMut(&[ScanResult]) -> ListenerResult + 'static,
    ) {
        self.listeners.subscribe(name, listener);
    }

    pub fn unsubscribe(&mut self, name: &str) -> usize {
        self.listeners.unsubscribe(name)
    }

    /// Runs a full scan and replaces the current results.
    pub fn rescan(&mut self, document: &Document) -> &[ScanResult] {
        let results = self.scanner.scan(document);
        for result in &results {
            self.snapshots
                .entry(result.element_id)
                .or_insert_with(|| StyleSnapshot::capture(&result.element));
        }
        let previous = std::mem::replace(&mut self.results, results);
        self.scan_count += 1;

        if self.highlighting || self.forcing {
            for dropped in previous
                .iter()
                .filter(|old| !self.results.iter().any(|r| r.element_id == old.element_id))
            {
                self.restyle(document, dropped, false);
            }
            for result in &self.results {
                self.restyle(document, result, true);
            }
        }

        self.last_failures = self.listeners.emit(&self.results);
        &self.results
    }

    /// Toggles the outline on flagged elements. Returns the new state.
    pub fn toggle_highlight(&mut self, document: &Document) -> bool {
        self.highlighting = !self.highlighting;
        self.restyle_all(document);
        self.highlighting
    }

    /// Toggles forcing every overridden property back to its intended value. Returns the new state.
    pub fn toggle_force_intended(&mut self, document: &Document) -> bool {
        self.forcing = !self.forcing;
        self.restyle_all(document);
        self.forcing
    }

    /// Feeds queued DOM mutations to the watcher and rescans once it fires.
    /// Returns true if a scan ran.
    pub fn pump(&mut self, document: &Document, now: Instant) -> bool {
        let mutations = document.take_mutations();
        if self.watcher.observe(&mutations, now) {
            log::trace!("re-scan armed by {} mutation record(s)", mutations.len());
        }
        self.run_if_due(document, now)
    }

    /// Signals a change coming from outside the document's own mutation feed.
    pub fn signal_change(&mut self, now: Instant) {
        self.watcher.signal(now);
    }

    /// Rescans if the watcher's settle delay has elapsed.
    pub fn run_if_due(&mut self, document: &Document, now: Instant) -> bool {
        if !self.watcher.poll(now) {
            return false;
        }
        self.rescan(document);
        true
    }

    pub fn results(&self) -> &[ScanResult] {
        &self.results
    }

    pub fn snapshot(&self, id: ElementId) -> Option<&StyleSnapshot> {
        self.snapshots.get(&id)
    }

    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    pub fn is_highlighting(&self) -> bool {
        self.highlighting
    }

    pub fn is_forcing(&self) -> bool {
        self.forcing
    }

    pub fn watcher(&self) -> &ChangeWatcher {
        &self.watcher
    }

    /// Listener failures from the most recent scan.
    pub fn last_failures(&self) -> &[ScanError] {
        &self.last_failures
    }

    fn restyle_all(&self, document: &Document) {
        for result in &self.results {
            self.restyle(document, result, true);
        }
    }

    /// Rewrites the inline style as snapshot + active effects (or just the snapshot).
    fn restyle(&self, document: &Document, result: &ScanResult, flagged: bool) {
        let Some(snapshot) = self.snapshots.get(&result.element_id) else {
            return;
        };
        let mut extra = Vec::new();
        if flagged && self.highlighting {
            extra.push(("outline".to_string(), self.highlight_outline.clone()));
        }
        if flagged && self.forcing {
            for o in &result.overrides {
                extra.push((o.property.clone(), o.intended.clone()));
            }
        }
        match compose_inline_style(snapshot.inline_style.as_deref(), &extra) {
            Some(style) => document.set_attribute(&result.element, "style", &style),
            None => document.remove_attribute(&result.element, "style"),
        }
    }
}

/// Appends `extra` declarations after the original inline style so they take precedence.
fn compose_inline_style(original: Option<&str>, extra: &[(String, String)]) -> Option<String> {
    if extra.is_empty() {
        return original.map(str::to_string);
    }
    let mut parts = Vec::with_capacity(extra.len() + 1);
    if let Some(original) = original {
        let trimmed = original.trim().trim_end_matches(';').trim_end();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
    parts.extend(extra.iter().map(|(property, value)| format!("{}: {}", property, value)));
    Some(parts.join("; "))
}
