// Copyright (C) 2022-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-journal.
//
// tracing-journal is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// tracing-journal is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with tracing-journal.  If
// not, see <http://www.gnu.org/licenses/>.

//! [tracing-journal](crate) [`Layer`] implementation.
//!
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! [`Layer`] turns each [`tracing`] [`Event`] into a [`Record`] & hands it to a [`Handler`]:
//!
//! - the event's `message` field becomes `MESSAGE`
//! - its [`tracing::Level`] becomes a [`Severity`] (and so a `PRIORITY`)
//! - its file, line & module path become `CODE_FILE`, `CODE_LINE` & `CODE_FUNC`
//! - all its other fields become attributes, with their types preserved where [`tracing`] lets us
//!   see them
//!
//! Optionally, each span in the event's scope contributes a group, named after the span, holding
//! that span's fields.
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html

use crate::{
    error::Result,
    handler::{Handler, Options, OptionsBuilder},
    priority::Severity,
    record::{Attr, CodeLocation, Record, Value},
    sanitize,
    transport::{JournalSocket, Transport},
};

use chrono::prelude::*;
use tracing::{
    field::{Field, Visit},
    span, Event,
};
use tracing_subscriber::{
    layer::Context,
    registry::{ExtensionsMut, LookupSpan},
};

use std::sync::atomic::{AtomicU64, Ordering};

// When the tracing-log feature is enabled, use NormalizeEvent to extract file/line metadata from
// events that originated from the `log` crate.
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

/// Events from this crate are never forwarded to the journal; we log through the global dispatcher
/// from inside `on_event`, so doing so could recurse.
const OWN_TARGET: &str = "tracing_journal";

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with("::"))
}

/// Distinguishes the span fields stashed by one [`Layer`] from those stashed by another on the same
/// subscriber.
static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(0);

/// [`Options`] as [`Layer::try_default`] configures them: `tracing` field names & span names are
/// run through [`sanitize::field_name`].
pub fn default_options() -> OptionsBuilder {
    Options::builder()
        .replace_attr(sanitize::replace_attr)
        .replace_group(sanitize::replace_group)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        field collection                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Gathers an event's (or a span's) fields as [`Attr`]s, setting the `message` field aside.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    attrs: Vec<Attr>,
    skip_log_fields: bool,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: Value) {
        if self.skip_log_fields && field.name().starts_with("log.") {
            return;
        }
        self.attrs.push(Attr::new(field.name(), value));
    }
    /// The fields as attributes, with any `message` put back in among them.
    fn into_attrs(mut self) -> Vec<Attr> {
        if let Some(message) = self.message.take() {
            self.attrs.insert(0, Attr::new("message", message));
        }
        self.attrs
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            // The tracing macros "pre-format" `message`, so `value` is really a
            // `std::fmt::Arguments` & will print without enclosing double-quotes.
            self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, Value::Str(format!("{:?}", value)));
        }
    }
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push(field, Value::from(value));
        }
    }
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::I64(value));
    }
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::U64(value));
    }
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::F64(value));
    }
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::Bool(value));
    }
    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::Str(value.to_string()));
    }
}

/// A span's fields, stashed in its extensions, per [`Layer`].
#[derive(Default)]
struct SpanFields(Vec<(u64, Vec<Attr>)>);

impl SpanFields {
    fn get(&self, layer: u64) -> Option<&Vec<Attr>> {
        self.0
            .iter()
            .find(|(id, _)| *id == layer)
            .map(|(_, attrs)| attrs)
    }
    fn get_mut(&mut self, layer: u64) -> &mut Vec<Attr> {
        let idx = match self.0.iter().position(|(id, _)| *id == layer) {
            Some(idx) => idx,
            None => {
                self.0.push((layer, Vec::new()));
                self.0.len() - 1
            }
        };
        &mut self.0[idx].1
    }
}

/// Append `attrs` to `layer`'s fields for a span, creating the extension if need be.
fn stash_span_fields(extensions: &mut ExtensionsMut<'_>, layer: u64, attrs: Vec<Attr>) {
    match extensions.get_mut::<SpanFields>() {
        Some(fields) => fields.get_mut(layer).extend(attrs),
        None => {
            let mut fields = SpanFields::default();
            fields.get_mut(layer).extend(attrs);
            extensions.insert(fields);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Layer                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that will send [`Event`]s to the
/// journal.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
pub struct Layer<T: Transport = JournalSocket> {
    handler: Handler<T>,
    span_groups: bool,
    id: u64,
}

impl Layer<JournalSocket> {
    /// Construct a Layer that sends to journald with [`default_options`].
    pub fn try_default() -> Result<Self> {
        Layer::new(default_options().build())
    }
    pub fn new(opts: Options) -> Result<Self> {
        Ok(Layer::with_handler(Handler::new(opts)?))
    }
}

impl<T: Transport> Layer<T> {
    /// Construct a Layer that hands records to `handler`; this is also how to attach attributes
    /// (via [`Handler::with_attrs`]) to everything the Layer sends.
    pub fn with_handler(handler: Handler<T>) -> Self {
        Layer {
            handler,
            span_groups: false,
            id: NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
    /// Include the fields of each span in an event's scope, grouped under the span's name.
    pub fn with_span_groups(mut self, span_groups: bool) -> Self {
        self.span_groups = span_groups;
        self
    }
    pub fn handler(&self) -> &Handler<T> {
        &self.handler
    }

    fn span_attrs<S>(&self, event: &Event<'_>, ctx: &Context<'_, S>) -> Vec<Attr>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        let mut groups = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span
                    .extensions()
                    .get::<SpanFields>()
                    .and_then(|fields| fields.get(self.id))
                {
                    groups.push(Attr::group(span.name(), fields.clone()));
                }
            }
        }
        groups
    }
}

impl<S, T> tracing_subscriber::layer::Layer<S> for Layer<T>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    T: Transport + Send + Sync + 'static,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if !self.span_groups {
            return;
        }
        if let Some(span) = ctx.span(id) {
            let mut visitor = FieldVisitor::default();
            attrs.record(&mut visitor);
            // Another layer may already have stashed its own copy here.
            stash_span_fields(&mut span.extensions_mut(), self.id, visitor.into_attrs());
        }
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        if !self.span_groups {
            return;
        }
        if let Some(span) = ctx.span(id) {
            let mut visitor = FieldVisitor::default();
            values.record(&mut visitor);
            stash_span_fields(&mut span.extensions_mut(), self.id, visitor.into_attrs());
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        if is_own_target(event.metadata().target()) {
            return;
        }

        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        let severity = Severity::from(*meta.level());
        if !self.handler.enabled(severity) {
            return;
        }

        let mut visitor = FieldVisitor {
            #[cfg(feature = "tracing-log")]
            skip_log_fields: event.is_log(),
            ..Default::default()
        };
        event.record(&mut visitor);

        let mut record = Record::new(severity, visitor.message.take().unwrap_or_default())
            .with_timestamp(Utc::now());
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            record = record.with_code_location(CodeLocation {
                file: file.to_string(),
                function: meta.module_path().unwrap_or_default().to_string(),
                line,
            });
        }
        if self.span_groups {
            record = record.add_attrs(self.span_attrs(event, &ctx));
        }
        record = record.add_attrs(visitor.attrs);

        if let Err(err) = self.handler.handle(&record) {
            ::tracing::error!("tracing-journal failed to send an event: {}", err);
        }
    }
}
