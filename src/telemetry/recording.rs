//! In-memory tracer for tests and diagnostics
//!
//! Keeps every finished span in memory so a test, or a one-off debugging
//! session, can inspect what the transport records without running a
//! collector. It is not a production tracer: nothing is exported, and
//! finished spans accumulate until [`RecordingTracer::take_finished_spans`]
//! drains them. Use [`OtelTracer`](super::OtelTracer) in services.

use super::tracer::{TraceSpan, Tracer};
use opentelemetry::trace::SpanKind;
use opentelemetry::Context;
use parking_lot::Mutex;
use std::sync::Arc;

/// A span as recorded by [`RecordingTracer`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSpan {
    pub name: String,
    pub kind: SpanKind,
    /// Tags in the order they were set
    pub tags: Vec<(String, String)>,
    /// Number of times `finish` was called
    pub finish_count: usize,
}

impl RecordedSpan {
    /// Last value set for `key`
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tag(key).is_some()
    }
}

#[derive(Debug, Default)]
struct Recorder {
    started: usize,
    finished: Vec<RecordedSpan>,
    /// Start index of each finished span
    finished_ids: Vec<usize>,
}

/// [`Tracer`] recording finished spans in memory, for tests and diagnostics
#[derive(Debug, Clone)]
pub struct RecordingTracer {
    sampled: bool,
    recorder: Arc<Mutex<Recorder>>,
}

impl RecordingTracer {
    /// A tracer that samples every request
    pub fn new() -> Self {
        Self {
            sampled: true,
            recorder: Arc::default(),
        }
    }

    /// A tracer that samples nothing
    pub fn unsampled() -> Self {
        Self {
            sampled: false,
            recorder: Arc::default(),
        }
    }

    /// Number of spans started so far
    pub fn started(&self) -> usize {
        self.recorder.lock().started
    }

    /// Spans finished so far, in finishing order
    pub fn finished_spans(&self) -> Vec<RecordedSpan> {
        self.recorder.lock().finished.clone()
    }

    /// Remove and return the spans finished so far
    pub fn take_finished_spans(&self) -> Vec<RecordedSpan> {
        let mut recorder = self.recorder.lock();
        recorder.finished_ids.clear();
        std::mem::take(&mut recorder.finished)
    }

    /// The only finished span
    ///
    /// # Panics
    ///
    /// Panics unless exactly one span was finished.
    pub fn single_span(&self) -> RecordedSpan {
        let mut spans = self.finished_spans();
        assert_eq!(spans.len(), 1, "expected exactly one span, got {:?}", spans);
        spans.remove(0)
    }
}

impl Default for RecordingTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for RecordingTracer {
    fn start_span(
        &self,
        _parent: &Context,
        name: String,
        kind: SpanKind,
    ) -> Option<Box<dyn TraceSpan>> {
        if !self.sampled {
            return None;
        }

        let id = {
            let mut recorder = self.recorder.lock();
            recorder.started += 1;
            recorder.started
        };
        Some(Box::new(RecordingSpan {
            id,
            span: RecordedSpan {
                name,
                kind,
                tags: Vec::new(),
                finish_count: 0,
            },
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

struct RecordingSpan {
    id: usize,
    span: RecordedSpan,
    recorder: Arc<Mutex<Recorder>>,
}

impl TraceSpan for RecordingSpan {
    fn set_name(&mut self, name: String) {
        self.span.name = name;
    }

    fn tag(&mut self, key: &str, value: String) {
        self.span.tags.push((key.to_owned(), value));
    }

    fn finish(&mut self) {
        self.span.finish_count += 1;
        let mut recorder = self.recorder.lock();
        // A repeated finish updates the existing record instead of adding one
        match recorder.finished_ids.iter().position(|id| *id == self.id) {
            Some(slot) => recorder.finished[slot] = self.span.clone(),
            None => {
                recorder.finished_ids.push(self.id);
                recorder.finished.push(self.span.clone());
            }
        }
    }
}
