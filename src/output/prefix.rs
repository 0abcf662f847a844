// src/output/prefix.rs

//! Per-line prefix templating for log output.
//!
//! Supported placeholders:
//! - `%timestamp` / `%ts`: write time, RFC 3339 with milliseconds
//! - `%tag` / `%t`: the job tag (empty when unset)

use std::io::{self, Write};
use std::sync::LazyLock;

use chrono::{DateTime, Local, SecondsFormat};
use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    // Longer tokens first: alternation is leftmost-first.
    Regex::new(r"%(timestamp|tag|ts|t)").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixTemplate {
    template: String,
    tag: String,
}

impl PrefixTemplate {
    pub fn new(template: impl Into<String>, tag: Option<&str>) -> Self {
        Self {
            template: template.into(),
            tag: tag.unwrap_or_default().to_string(),
        }
    }

    pub fn expand(&self) -> String {
        self.expand_at(Local::now())
    }

    pub fn expand_at(&self, now: DateTime<Local>) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures<'_>| match &caps[1] {
                "timestamp" | "ts" => now.to_rfc3339_opts(SecondsFormat::Millis, true),
                _ => self.tag.clone(),
            })
            .into_owned()
    }
}

/// Inserts the expanded prefix before the first byte of every line.
///
/// State carries across writes, so a line split over several chunks is
/// prefixed exactly once.
#[derive(Debug)]
pub struct LinePrefixer<W> {
    inner: W,
    template: PrefixTemplate,
    mid_of_line: bool,
}

impl<W: Write> LinePrefixer<W> {
    pub fn new(inner: W, template: PrefixTemplate) -> Self {
        Self {
            inner,
            template,
            mid_of_line: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for LinePrefixer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = Vec::with_capacity(buf.len() + 32);
        for line in buf.split_inclusive(|b| *b == b'\n') {
            if !self.mid_of_line {
                out.extend_from_slice(self.template.expand().as_bytes());
            }
            out.extend_from_slice(line);
            self.mid_of_line = line.last() != Some(&b'\n');
        }
        self.inner.write_all(&out)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
