// Conversion worker: owns the single office-engine instance and serves the
// coordinator's command loop, one command at a time in arrival order.

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::traits::{DocumentHandle, EngineError, ExportOptions, LoadOptions, OfficeEngine};
use crate::detect::doc_type::DocumentFamily;
use crate::protocol::{decode_command, WorkerCommand, WorkerEvent};

/// Builds the engine instance inside the worker's execution context, so
/// initialization failures surface on the worker side as `error` events.
pub type EngineFactory =
    Box<dyn FnOnce() -> Result<Box<dyn OfficeEngine>, EngineError> + Send + 'static>;

/// Long-lived worker state: the engine, the at-most-one open document
/// handle, and the property options prepared once at startup.
pub struct ConvertWorker {
    engine: Box<dyn OfficeEngine>,
    open_doc: Option<Box<dyn DocumentHandle>>,
    load_options: LoadOptions,
    overwrite_on_export: bool,
    events: mpsc::Sender<WorkerEvent>,
}

impl ConvertWorker {
    /// Run the worker loop until the command channel closes.
    ///
    /// `ready` is emitted exactly once, after the engine and its property
    /// options are initialized. If the factory fails, the failure is
    /// reported as an `error` event and the loop never starts.
    pub async fn run(
        factory: EngineFactory,
        mut commands: mpsc::Receiver<Value>,
        events: mpsc::Sender<WorkerEvent>,
    ) {
        let engine = match factory() {
            Ok(engine) => engine,
            Err(err) => {
                warn!("engine initialization failed: {}", err);
                let _ = events
                    .send(WorkerEvent::Error {
                        error: format!("Failed to initialize office engine: {}", err),
                        file_name: None,
                        stack: None,
                    })
                    .await;
                return;
            }
        };

        let mut worker = Self {
            engine,
            open_doc: None,
            load_options: LoadOptions { hidden: true },
            overwrite_on_export: true,
            events,
        };

        if worker.emit(WorkerEvent::Ready).await.is_err() {
            return;
        }
        debug!("conversion worker ready");

        while let Some(raw) = commands.recv().await {
            // Top-level catch: a failing command must never kill the loop.
            if let Err(err) = worker.handle_message(raw).await {
                warn!("worker message handling failed: {:#}", err);
                let _ = worker
                    .events
                    .send(WorkerEvent::Error {
                        error: err.to_string(),
                        file_name: None,
                        stack: Some(format!("{:#}", err)),
                    })
                    .await;
            }
        }

        // Command channel closed: the session is gone, release the document.
        worker.close_open_document().await;
        debug!("conversion worker shut down");
    }

    /// Validate and dispatch a single raw message.
    async fn handle_message(&mut self, raw: Value) -> Result<()> {
        let command = match decode_command(raw) {
            Ok(command) => command,
            Err(err) => {
                warn!("rejected command: {}", err);
                return self.emit_error(err.to_string(), None).await;
            }
        };

        match command {
            WorkerCommand::Convert {
                file_name,
                from,
                to,
            } => self.handle_convert(file_name, from, to).await,
            WorkerCommand::Cleanup => self.handle_cleanup().await,
        }
    }

    async fn handle_convert(&mut self, file_name: String, from: String, to: String) -> Result<()> {
        // A previous request may have left its document open. Close it
        // before loading the next one; a close failure must not block the
        // new load.
        self.close_open_document().await;

        let family = DocumentFamily::from_file_name(&file_name);
        let filter = family.pdf_export_filter();
        debug!("loading {} ({:?}) from {}", file_name, family, from);

        let loaded = match self.engine.load_document(&from, self.load_options).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                return self
                    .emit_error("Failed to load document".to_owned(), Some(file_name))
                    .await;
            }
            Err(err) => {
                let message = describe_engine_error(err);
                warn!("load failed for {}: {}", file_name, message);
                return self.emit_error(message, Some(file_name)).await;
            }
        };
        self.open_doc = Some(loaded);

        let options = ExportOptions {
            overwrite: self.overwrite_on_export,
            filter: filter.to_owned(),
        };
        debug!("exporting {} to {} with filter {}", file_name, to, filter);

        if let Some(doc) = self.open_doc.as_mut() {
            if let Err(err) = doc.export_pdf(&to, &options).await {
                let message = describe_engine_error(err);
                warn!("export failed for {}: {}", file_name, message);
                return self.emit_error(message, Some(file_name)).await;
            }
        }

        debug!("converted {} -> {}", file_name, to);
        self.emit(WorkerEvent::Converted {
            file_name,
            from,
            to,
        })
        .await
    }

    async fn handle_cleanup(&mut self) -> Result<()> {
        self.close_open_document().await;
        self.emit(WorkerEvent::Cleaned).await
    }

    /// Close and drop the open document handle, if any. Close failures are
    /// logged and swallowed.
    async fn close_open_document(&mut self) {
        if let Some(mut doc) = self.open_doc.take() {
            if let Err(err) = doc.close().await {
                warn!("failed to close open document: {}", err);
            }
        }
    }

    async fn emit(&self, event: WorkerEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .context("worker event channel closed")
    }

    async fn emit_error(&self, error: String, file_name: Option<String>) -> Result<()> {
        self.emit(WorkerEvent::Error {
            error,
            file_name,
            stack: None,
        })
        .await
    }
}

/// Translate an engine failure into the user-facing message, preferring the
/// engine's own exception message when it raised one.
fn describe_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Raised(message) => message,
        other => other.to_string(),
    }
}
