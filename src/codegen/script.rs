use std::fmt::{self, Write};

/// JavaScript predicates evaluated against a single element in the page.
/// Each returns `false` for a missing element so pollers keep waiting.
pub const STABLE_PREDICATE: &str = "(el) => { if (!el) return false; const r = el.getBoundingClientRect(); const prev = el.__lastRect; el.__lastRect = r; return !!prev && prev.x === r.x && prev.y === r.y && prev.width === r.width && prev.height === r.height; }";

pub const ANIMATION_PREDICATE: &str =
    "(el) => !!el && el.getAnimations().every((a) => a.playState !== 'running')";

pub const ENABLED_PREDICATE: &str = "(el) => !!el && !el.disabled";

/// Validates the form owning `el`, or `el` itself when it is not inside one
pub const FORM_VALID_PREDICATE: &str = "(el) => { if (!el) return false; const form = el.form || el.closest('form') || el; return typeof form.checkValidity !== 'function' || form.checkValidity(); }";

/// Resource timing entries all finished; the closest page-side view of network idle
pub const NETWORK_IDLE_CHECK: &str =
    "performance.getEntriesByType('resource').every((r) => r.responseEnd > 0)";

/// Indentation-aware text buffer for emitted scripts
pub struct ScriptWriter {
    buffer: String,
    depth: usize,
    unit: &'static str,
}

impl ScriptWriter {
    pub fn new(unit: &'static str) -> Self {
        Self {
            buffer: String::with_capacity(4096),
            depth: 0,
            unit,
        }
    }

    pub fn line(&mut self, text: impl fmt::Display) -> fmt::Result {
        for _ in 0..self.depth {
            self.buffer.push_str(self.unit);
        }
        writeln!(self.buffer, "{}", text)
    }

    pub fn blank(&mut self) -> fmt::Result {
        writeln!(self.buffer)
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Open a block: write `opener` then indent
    pub fn open(&mut self, opener: impl fmt::Display) -> fmt::Result {
        self.line(opener)?;
        self.indent();
        Ok(())
    }

    /// Close a block: dedent then write `closer`
    pub fn close(&mut self, closer: impl fmt::Display) -> fmt::Result {
        self.dedent();
        self.line(closer)
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

/// Milliseconds as a Python seconds literal
pub fn seconds(ms: u64) -> String {
    if ms % 1000 == 0 {
        (ms / 1000).to_string()
    } else {
        format!("{:.1}", ms as f64 / 1000.0)
    }
}

/// Identifier-safe snake_case form of a test name
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "recorded".to_string()
    } else {
        trimmed.to_string()
    }
}
