// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logging for executions and buffer transitions.

use cachebuf_backend::Failure;

use crate::{Operation, buffer::CommitReport};

/// Logs one direct execution: `debug` on success, `warn` on failure.
pub(crate) fn record_execution<V>(operation: &Operation<V>, failure: Option<&Failure>) {
    let op = operation.kind().as_str();
    let target = operation.target();
    let mutable = operation.is_mutable();

    // One expansion per level; the fields are shared.
    macro_rules! emit_event {
        ($level:ident, $($failure:tt)*) => {
            tracing::$level!(
                cache.operation = op,
                cache.keys = %target,
                cache.mutable = mutable,
                $($failure)*
                "cache.query"
            )
        };
    }

    match failure {
        Some(failure) => emit_event!(warn, cache.failure = %failure,),
        None => emit_event!(debug,),
    }
}

pub(crate) fn record_begin() {
    tracing::info!(cache.buffer = "begin", "cache.buffer");
}

pub(crate) fn record_commit(report: CommitReport) {
    tracing::info!(
        cache.buffer = "commit",
        cache.replayed = report.replayed(),
        cache.failed = report.failed(),
        "cache.buffer"
    );
}

pub(crate) fn record_rollback(discarded: usize) {
    tracing::info!(cache.buffer = "rollback", cache.discarded = discarded, "cache.buffer");
}

/// Logs a commit or rollback requested while no session was active.
pub(crate) fn record_idle(action: &'static str) {
    tracing::debug!(cache.buffer = action, "cache.buffer.idle");
}

pub(crate) fn record_close(failure: Option<&Failure>) {
    match failure {
        Some(failure) => tracing::warn!(cache.failure = %failure, "cache.close"),
        None => tracing::debug!("cache.close"),
    }
}
