// Shared test doubles: a scriptable office engine backed by the staging
// filesystem, plus polling helpers for the asynchronous state machine.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use doc_convert_engine::engine::traits::{
    DocumentHandle, EngineError, ExportOptions, LoadOptions, OfficeEngine,
};
use doc_convert_engine::engine::vfs::StagingFs;
use doc_convert_engine::engine::worker::EngineFactory;

/// What the mock engine does with the next request.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Wrap the staged input bytes into a fake PDF at the export path.
    Succeed,
    /// Load completes but yields no handle.
    LoadReturnsNone,
    /// Load raises a structured engine exception.
    LoadRaises(String),
    /// Export raises a structured engine exception.
    ExportRaises(String),
    /// Export reports success without writing anything.
    ExportWritesNothing,
    /// Load never completes, keeping the request in flight.
    HangOnLoad,
}

/// Everything the tests observe about engine usage.
#[derive(Debug, Default)]
pub struct MockLog {
    /// Paths passed to load, in order.
    pub loads: Vec<String>,
    /// Filters used on export, in order.
    pub filters: Vec<String>,
    /// Number of close calls.
    pub closes: usize,
    /// Currently open document handles.
    pub open_documents: i64,
    /// High-water mark of concurrently open handles.
    pub max_open_documents: i64,
}

pub struct MockEngine {
    fs: Arc<StagingFs>,
    behavior: Arc<Mutex<MockBehavior>>,
    log: Arc<Mutex<MockLog>>,
}

#[async_trait]
impl OfficeEngine for MockEngine {
    async fn load_document(
        &mut self,
        path: &str,
        options: LoadOptions,
    ) -> Result<Option<Box<dyn DocumentHandle>>, EngineError> {
        assert!(options.hidden, "documents must be loaded hidden");
        self.log.lock().loads.push(path.to_owned());

        let behavior = self.behavior.lock().clone();
        match behavior {
            MockBehavior::LoadReturnsNone => return Ok(None),
            MockBehavior::LoadRaises(message) => return Err(EngineError::Raised(message)),
            MockBehavior::HangOnLoad => std::future::pending::<()>().await,
            _ => {}
        }

        let bytes = self
            .fs
            .read_file(path)
            .map_err(|err| EngineError::Raised(format!("LibreOffice Error: {}", err)))?;

        {
            let mut log = self.log.lock();
            log.open_documents += 1;
            log.max_open_documents = log.max_open_documents.max(log.open_documents);
        }

        Ok(Some(Box::new(MockDocument {
            fs: Arc::clone(&self.fs),
            bytes,
            behavior: Arc::clone(&self.behavior),
            log: Arc::clone(&self.log),
        })))
    }
}

pub struct MockDocument {
    fs: Arc<StagingFs>,
    bytes: Bytes,
    behavior: Arc<Mutex<MockBehavior>>,
    log: Arc<Mutex<MockLog>>,
}

#[async_trait]
impl DocumentHandle for MockDocument {
    async fn export_pdf(&mut self, path: &str, options: &ExportOptions) -> Result<(), EngineError> {
        assert!(options.overwrite, "exports must overwrite");
        self.log.lock().filters.push(options.filter.clone());

        let behavior = self.behavior.lock().clone();
        match behavior {
            MockBehavior::ExportRaises(message) => Err(EngineError::Raised(message)),
            MockBehavior::ExportWritesNothing => Ok(()),
            _ => {
                let mut pdf = b"%PDF-1.7\n".to_vec();
                pdf.extend_from_slice(&self.bytes);
                self.fs.write_file(path, Bytes::from(pdf));
                Ok(())
            }
        }
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        let mut log = self.log.lock();
        log.closes += 1;
        log.open_documents -= 1;
        Ok(())
    }
}

/// A factory producing a mock engine over `fs`, plus the shared log.
pub fn mock_factory(
    fs: Arc<StagingFs>,
    behavior: MockBehavior,
) -> (EngineFactory, Arc<Mutex<MockLog>>) {
    let log = Arc::new(Mutex::new(MockLog::default()));
    let behavior = Arc::new(Mutex::new(behavior));
    let factory_log = Arc::clone(&log);
    let factory: EngineFactory = Box::new(move || {
        Ok(Box::new(MockEngine {
            fs,
            behavior,
            log: factory_log,
        }))
    });
    (factory, log)
}

/// A factory whose engine construction fails outright.
pub fn failing_factory(message: &str) -> EngineFactory {
    let message = message.to_owned();
    Box::new(move || Err(EngineError::Internal(message)))
}

/// Poll `cond` until it holds, panicking after roughly one second.
pub async fn wait_for(what: &str, cond: impl Fn() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for: {}", what);
}
