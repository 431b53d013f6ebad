//! ObservationScope for begin/complete logging around a unit of work
//!
//! - `{name}_BEGIN` on creation (TRACE)
//! - `{name}_COMPLETE` on `complete` (INFO) with elapsed milliseconds
//! - `{name}_FAILED` on `fail` (WARN)
//! - `{name}_INCOMPLETE` on drop if neither was called (WARN)

use std::time::Instant;

use super::logger::Logger;

/// Logs the lifecycle of one unit of work
pub struct ObservationScope {
    name: String,
    started: Instant,
    finished: bool,
    fields: Vec<(&'static str, String)>,
}

impl ObservationScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_fields(name, Vec::new())
    }

    /// Creates a scope whose fields are repeated on every line it logs
    pub fn with_fields(name: impl Into<String>, fields: Vec<(&'static str, String)>) -> Self {
        let scope = Self {
            name: name.into(),
            started: Instant::now(),
            finished: false,
            fields,
        };
        Logger::trace(&format!("{}_BEGIN", scope.name), &scope.field_refs(&[]));
        scope
    }

    /// Elapsed time since creation in whole milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    pub fn complete_with_fields(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_ms().to_string();
        let mut extra_fields = extra.to_vec();
        extra_fields.push(("elapsed_ms", elapsed.as_str()));
        Logger::info(
            &format!("{}_COMPLETE", self.name),
            &self.field_refs(&extra_fields),
        );
    }

    pub fn fail(mut self, code: &str, reason: &str) {
        self.finished = true;
        Logger::warn(
            &format!("{}_FAILED", self.name),
            &self.field_refs(&[("code", code), ("reason", reason)]),
        );
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn field_refs<'a>(&'a self, extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        self.fields
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .chain(extra.iter().copied())
            .collect()
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &self.field_refs(&[("reason", "scope dropped without completion")]),
            );
        }
    }
}
