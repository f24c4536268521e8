use std::collections::HashMap;
use std::io::BufRead;

use tracing::{debug, info};

use crate::{ElementRecord, PlyError, PlyReader};

pub type ElementHandler<'h, C> =
    Box<dyn FnMut(&mut C, &ElementRecord<'_>) -> Result<(), PlyError> + 'h>;

/// Dispatch table from element name to the function that consumes its
/// records. `C` is the state the handlers share for one import, typically the
/// host mesh being built.
pub struct ElementHandlers<'h, C> {
    handlers: HashMap<String, ElementHandler<'h, C>>,
}

impl<'h, C> ElementHandlers<'h, C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for records of `element`, replacing any previous
    /// handler for that name.
    pub fn on<F>(&mut self, element: impl Into<String>, handler: F) -> &mut Self
    where
        F: FnMut(&mut C, &ElementRecord<'_>) -> Result<(), PlyError> + 'h,
    {
        self.handlers.insert(element.into(), Box::new(handler));
        self
    }

    pub fn handles(&self, element: &str) -> bool {
        self.handlers.contains_key(element)
    }

    /// Returns `Ok(false)` when no handler is registered for the record.
    fn dispatch(&mut self, context: &mut C, record: &ElementRecord<'_>) -> Result<bool, PlyError> {
        match self.handlers.get_mut(record.name()) {
            Some(handler) => {
                handler(context, record)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<C> Default for ElementHandlers<'_, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress reporting for long imports. Purely observational, an import
/// cannot be interrupted through it.
pub trait ImportMonitor {
    /// A new element with `total` records starts.
    fn begin(&mut self, _element: &str, _total: usize) {}

    fn advance(&mut self, _count: usize) {}
}

impl ImportMonitor for () {}

/// Record counts of a finished import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records handed to a handler.
    pub delivered: usize,
    /// Records decoded and dropped because no handler wanted them.
    pub skipped: usize,
}

/// Decodes every record of `reader` and hands each one to the handler
/// registered for its element.
///
/// Records of elements without a handler are still decoded, to keep the
/// stream in step, then dropped. The first decode or handler error aborts the
/// import; records already delivered are not rolled back.
pub fn import<R, C>(
    reader: PlyReader<R>,
    handlers: &mut ElementHandlers<'_, C>,
    context: &mut C,
) -> Result<ImportSummary, PlyError>
where
    R: BufRead,
{
    import_with_monitor(reader, handlers, context, &mut ())
}

pub fn import_with_monitor<R, C, M>(
    mut reader: PlyReader<R>,
    handlers: &mut ElementHandlers<'_, C>,
    context: &mut C,
    monitor: &mut M,
) -> Result<ImportSummary, PlyError>
where
    R: BufRead,
    M: ImportMonitor + ?Sized,
{
    let mut summary = ImportSummary::default();
    let elements: Vec<(String, usize)> = reader
        .header()
        .elements
        .iter()
        .map(|e| (e.name.clone(), e.count))
        .collect();

    // Records arrive in declaration order, so walking the declared elements
    // also announces the empty ones.
    for (name, count) in &elements {
        if handlers.handles(name) {
            info!(element = name.as_str(), count, "importing element");
        } else {
            debug!(element = name.as_str(), count, "no handler, skipping element");
        }
        monitor.begin(name, *count);

        for _ in 0..*count {
            let record = reader.decode_next_element()?.ok_or_else(|| {
                PlyError::truncated(format!("element '{name}' ended early"))
            })?;
            if handlers.dispatch(context, &record)? {
                summary.delivered += 1;
            } else {
                summary.skipped += 1;
            }
            monitor.advance(1);
        }
    }

    reader.close();
    info!(
        delivered = summary.delivered,
        skipped = summary.skipped,
        "PLY import finished"
    );
    Ok(summary)
}
