// Seam for the embedded office engine. The engine itself is an opaque
// capability; the worker only needs load, export, and close.

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by the embedded office engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine raised a structured exception carrying its own message.
    #[error("{0}")]
    Raised(String),
    /// The engine failed without a structured exception.
    #[error("Engine error: {0}")]
    Internal(String),
}

/// Options applied when loading a document.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Load without opening a visible frame.
    pub hidden: bool,
}

/// Options applied when exporting a loaded document.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Replace an existing file at the output path.
    pub overwrite: bool,
    /// Engine filter name selected from the document family.
    pub filter: String,
}

/// The embedded document-processing runtime.
///
/// A load that completes without producing a handle is a legal engine
/// outcome and is reported as `Ok(None)`; the worker turns it into a load
/// error toward the coordinator.
#[async_trait]
pub trait OfficeEngine: Send + Sync {
    /// Load the document staged at `path`, returning a handle to the open
    /// document model.
    async fn load_document(
        &mut self,
        path: &str,
        options: LoadOptions,
    ) -> Result<Option<Box<dyn DocumentHandle>>, EngineError>;
}

/// An open document model inside the engine. At most one exists per worker;
/// the worker closes the previous handle before every new load.
#[async_trait]
pub trait DocumentHandle: Send + Sync {
    /// Export the document as PDF to `path` in the shared filesystem.
    async fn export_pdf(&mut self, path: &str, options: &ExportOptions) -> Result<(), EngineError>;

    /// Close the document without saving.
    async fn close(&mut self) -> Result<(), EngineError>;
}
