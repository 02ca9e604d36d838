use std::{
    any::Any,
    fs,
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use super::protocol::{CancellationToken, FileInput, FileOutput, WorkRequest, WorkResponse};
use crate::core::{
    error::{ExtractError, ParseFault, WorkerFault},
    parsers::{Extract, ParserRegistry},
};

/// Orchestrator side of one long-lived worker thread.
pub(super) struct WorkerHandle {
    index: usize,
    requests: Option<Sender<WorkRequest>>,
    responses: Receiver<WorkResponse>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(super) fn spawn(index: usize, registry: ParserRegistry) -> Result<Self, ExtractError> {
        let (request_tx, request_rx) = mpsc::channel::<WorkRequest>();
        let (response_tx, response_rx) = mpsc::channel::<WorkResponse>();

        let thread = thread::Builder::new()
            .name(format!("extract-worker-{index}"))
            .spawn(move || run(index, registry, request_rx, response_tx))
            .map_err(|source| ExtractError::Spawn { index, source })?;

        Ok(Self {
            index,
            requests: Some(request_tx),
            responses: response_rx,
            thread: Some(thread),
        })
    }

    pub(super) fn send(&self, request: WorkRequest) -> Result<(), WorkerFault> {
        let file = request.input.file_path().to_string();
        let exited = || WorkerFault::Exited {
            worker: self.index,
            file: file.clone(),
        };
        let sender = self.requests.as_ref().ok_or_else(exited)?;
        sender.send(request).map_err(|_| exited())
    }

    /// Wait for the response to request `id`. Responses to older requests are discarded.
    pub(super) fn receive(
        &self,
        id: u64,
        file: &str,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<FileOutput, WorkerFault> {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.responses.recv_timeout(remaining) {
                Ok(response) if response.id == id => return response.outcome,
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(WorkerFault::Timeout {
                        worker: self.index,
                        file: file.to_string(),
                        timeout,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(WorkerFault::Exited {
                        worker: self.index,
                        file: file.to_string(),
                    });
                }
            }
        }
    }

    /// Close the request channel and wait for the thread to finish.
    pub(super) fn join(mut self) {
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        // Never joins: a worker stuck on a file must not block the caller.
        self.requests.take();
    }
}

fn run(
    index: usize,
    mut registry: ParserRegistry,
    requests: Receiver<WorkRequest>,
    responses: Sender<WorkResponse>,
) {
    for request in requests {
        if let Some(marker) = &request.custom_marker {
            registry.use_custom_marker(marker);
        }
        let outcome = process(index, &registry, request.input, &request.cancel);
        let response = WorkResponse {
            id: request.id,
            outcome,
        };
        if responses.send(response).is_err() {
            break;
        }
    }
}

/// Run every parser on one file. A failing parser becomes a [`ParseFault`]; the
/// others still contribute.
fn process(
    worker: usize,
    registry: &ParserRegistry,
    input: FileInput,
    cancel: &CancellationToken,
) -> Result<FileOutput, WorkerFault> {
    let (file_path, content) = match input {
        FileInput::Content { file_path, content } => (file_path, content),
        FileInput::Path { file_path } => match fs::read(&file_path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes).into_owned();
                (file_path, content)
            }
            Err(e) => {
                return Err(WorkerFault::Read {
                    worker,
                    file: file_path,
                    message: e.to_string(),
                });
            }
        },
    };

    let mut output = FileOutput::default();
    for parser in registry.iter() {
        if cancel.is_cancelled() {
            return Err(WorkerFault::Cancelled {
                worker,
                file: file_path,
            });
        }
        let result = panic::catch_unwind(AssertUnwindSafe(|| parser.extract(&content, &file_path)));
        let message = match result {
            Ok(Ok(collection)) => {
                if !collection.is_empty() {
                    output.translations.push(collection.into_map());
                }
                continue;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };
        output.parse_faults.push(ParseFault {
            parser: parser.name().to_string(),
            file: file_path.clone(),
            message,
        });
    }
    Ok(output)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
