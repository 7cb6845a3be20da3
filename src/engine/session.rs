// Conversion session state machine: owns the request lifecycle, session
// readiness, and the staged-file handoff for reading back results.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::vfs::StagingFs;
use super::worker::{ConvertWorker, EngineFactory};
use crate::config::{SessionConfig, GENERIC_CONVERSION_ERROR};
use crate::detect::doc_type;
use crate::protocol::{WorkerCommand, WorkerEvent};

/// Session-level readiness: whether the engine has finished initializing.
/// `Failed` is terminal; there is no retry path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Idle,
    Warming,
    Ready,
    Failed,
}

/// Lifecycle of the single in-flight conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    None,
    Converting,
    Success,
    Error,
}

/// A user-supplied source document.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    /// Declared content type, checked against the conversion allow-list.
    pub content_type: String,
    pub bytes: Bytes,
}

/// The produced PDF, ready for a client-side save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDownload {
    /// Source stem with the extension replaced by `.pdf`.
    pub file_name: String,
    pub bytes: Bytes,
}

/// Observable state for UI rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub readiness: Readiness,
    pub request: RequestState,
    /// User-facing message for the error state.
    pub error: Option<String>,
    /// Source file name of the current request.
    pub file_name: Option<String>,
}

/// Rejection returned by [`ConversionSession::submit`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The declared content type is not in the conversion allow-list.
    #[error("Please select a Word, Excel, PowerPoint, or OpenDocument file")]
    UnsupportedContentType { content_type: String },
}

#[derive(Default)]
struct RequestSlot {
    state: RequestState,
    file_name: Option<String>,
    input_path: Option<String>,
    output_path: Option<String>,
    /// Converted PDF bytes, present in the success state.
    pdf: Option<Bytes>,
    /// User-facing message, present in the error state.
    error: Option<String>,
}

/// One conversion session per page load: a worker with one engine instance,
/// a shared staging filesystem, and a single-slot request state machine.
pub struct ConversionSession {
    config: SessionConfig,
    fs: Arc<StagingFs>,
    readiness: Mutex<Readiness>,
    request: Mutex<RequestSlot>,
    commands: Mutex<Option<mpsc::Sender<Value>>>,
}

impl ConversionSession {
    pub fn new(config: SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            fs: Arc::new(StagingFs::new()),
            readiness: Mutex::new(Readiness::Idle),
            request: Mutex::new(RequestSlot::default()),
            commands: Mutex::new(None),
        })
    }

    /// The staging filesystem shared with the worker and the engine.
    pub fn staging_fs(&self) -> Arc<StagingFs> {
        Arc::clone(&self.fs)
    }

    /// Start the worker and the engine. Idempotent: a session that is
    /// already warming, ready, or failed is left untouched.
    pub fn initialize(self: &Arc<Self>, factory: EngineFactory) {
        {
            let mut readiness = self.readiness.lock();
            if *readiness != Readiness::Idle {
                debug!("initialize ignored: session is {:?}", *readiness);
                return;
            }
            *readiness = Readiness::Warming;
        }
        info!("initializing office engine");

        let (cmd_tx, cmd_rx) = mpsc::channel(self.config.command_capacity);
        let (evt_tx, mut evt_rx) = mpsc::channel(self.config.event_capacity);
        *self.commands.lock() = Some(cmd_tx);

        tokio::spawn(ConvertWorker::run(factory, cmd_rx, evt_tx));

        // The event consumer holds only a weak reference: dropping the last
        // session handle closes the command channel, which unwinds the
        // worker and then this task.
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = evt_rx.recv().await {
                match weak.upgrade() {
                    Some(session) => session.handle_event(event),
                    None => break,
                }
            }
            debug!("session event channel closed");
        });
    }

    /// Stage `file` and dispatch a convert command to the worker.
    ///
    /// Returns a validation error for an unsupported content type, before
    /// any staging happens. Submissions while the session is not ready, or
    /// while a request is still converting, are silent no-ops.
    pub async fn submit(&self, file: SourceFile) -> Result<(), SubmitError> {
        if !doc_type::is_allowed_content_type(&file.content_type) {
            return Err(SubmitError::UnsupportedContentType {
                content_type: file.content_type,
            });
        }

        {
            let readiness = self.readiness.lock();
            if *readiness != Readiness::Ready {
                debug!("submit ignored: session is {:?}", *readiness);
                return Ok(());
            }
        }

        let (file_name, input_path, output_path) = {
            let mut request = self.request.lock();
            if request.state == RequestState::Converting {
                debug!("submit ignored: a conversion is already in flight");
                return Ok(());
            }

            let extension = doc_type::file_extension(&file.name);
            let input_path = self.config.staged_input_path(extension);
            let output_path = self.config.staged_output_path();
            *request = RequestSlot {
                state: RequestState::Converting,
                file_name: Some(file.name.clone()),
                input_path: Some(input_path.clone()),
                output_path: Some(output_path.clone()),
                pdf: None,
                error: None,
            };
            (file.name, input_path, output_path)
        };

        self.fs.write_file(&input_path, file.bytes);
        info!("submitted {} for conversion", file_name);

        self.dispatch(WorkerCommand::Convert {
            file_name,
            from: input_path,
            to: output_path,
        })
        .await;
        Ok(())
    }

    /// Ask the worker to close whatever document it still holds open.
    pub async fn cleanup(&self) {
        self.dispatch(WorkerCommand::Cleanup).await;
    }

    /// The produced PDF, if the current request succeeded.
    pub fn download(&self) -> Option<PdfDownload> {
        let request = self.request.lock();
        if request.state != RequestState::Success {
            return None;
        }
        let bytes = request.pdf.clone()?;
        let name = request.file_name.as_deref().unwrap_or("converted");
        Some(PdfDownload {
            file_name: format!("{}.pdf", doc_type::file_stem(name)),
            bytes,
        })
    }

    /// Discard a finished request, releasing the held PDF buffer, and
    /// return to accepting submissions. A no-op outside success/error.
    pub fn reset(&self) {
        let mut request = self.request.lock();
        match request.state {
            RequestState::Success | RequestState::Error => {
                *request = RequestSlot::default();
                debug!("session reset");
            }
            state => debug!("reset ignored in state {:?}", state),
        }
    }

    pub fn readiness(&self) -> Readiness {
        *self.readiness.lock()
    }

    pub fn request_state(&self) -> RequestState {
        self.request.lock().state
    }

    /// Observable state for UI rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        let readiness = *self.readiness.lock();
        let request = self.request.lock();
        SessionSnapshot {
            readiness,
            request: request.state,
            error: request.error.clone(),
            file_name: request.file_name.clone(),
        }
    }

    async fn dispatch(&self, command: WorkerCommand) {
        let sender = self.commands.lock().clone();
        match sender {
            Some(tx) => {
                if tx.send(command.to_wire()).await.is_err() {
                    warn!("worker command channel closed; command dropped");
                }
            }
            None => warn!("command dispatched before initialize"),
        }
    }

    fn handle_event(&self, event: WorkerEvent) {
        match event {
            WorkerEvent::Ready => {
                let mut readiness = self.readiness.lock();
                if *readiness == Readiness::Warming {
                    *readiness = Readiness::Ready;
                    info!("office engine ready for conversion");
                }
            }
            WorkerEvent::Converted {
                file_name,
                from,
                to,
            } => self.finish_converted(file_name, from, to),
            WorkerEvent::Error {
                error, file_name, ..
            } => self.finish_error(error, file_name),
            WorkerEvent::Cleaned => debug!("worker finished cleanup"),
        }
    }

    /// Apply a `converted` event: unstage both files no matter how the
    /// read-back goes, then land in success or the post-processing error.
    fn finish_converted(&self, file_name: String, from: String, to: String) {
        self.unstage(&from);
        let read_back = self.fs.read_file(&to);
        self.unstage(&to);

        let mut request = self.request.lock();
        if request.state != RequestState::Converting {
            debug!("stale converted event for {}", file_name);
            return;
        }

        match read_back {
            Ok(bytes) => {
                request.pdf = Some(bytes);
                request.state = RequestState::Success;
                info!("conversion completed: {}", file_name);
            }
            Err(err) => {
                warn!("failed to read converted output {}: {}", to, err);
                request.error = Some("Failed to process converted PDF".to_owned());
                request.state = RequestState::Error;
            }
        }
    }

    /// Apply an `error` event. During warmup this is an initialization
    /// failure and marks the session failed for good; afterwards the error
    /// belongs to the in-flight request, whose staged files are removed.
    fn finish_error(&self, error: String, file_name: Option<String>) {
        {
            let mut readiness = self.readiness.lock();
            if *readiness == Readiness::Warming {
                *readiness = Readiness::Failed;
                warn!("engine initialization failed: {}", error);
                return;
            }
        }

        let message = if error.is_empty() {
            GENERIC_CONVERSION_ERROR.to_owned()
        } else {
            error
        };

        let mut request = self.request.lock();
        if request.state != RequestState::Converting {
            warn!("worker error outside of a request: {}", message);
            return;
        }

        if let Some(path) = request.input_path.take() {
            self.unstage(&path);
        }
        if let Some(path) = request.output_path.take() {
            self.unstage(&path);
        }

        warn!(
            "conversion failed for {}: {}",
            file_name.as_deref().unwrap_or("<unknown>"),
            message
        );
        request.error = Some(message);
        request.state = RequestState::Error;
    }

    /// Best-effort staged-file removal; failures are logged, never surfaced.
    fn unstage(&self, path: &str) {
        if let Err(err) = self.fs.unlink(path) {
            debug!("failed to unlink staged file {}: {}", path, err);
        }
    }
}
