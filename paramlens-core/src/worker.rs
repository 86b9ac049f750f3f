//! Background load worker — file reads and parsing run off the caller's thread.
//!
//! Communication is via `mpsc` channels. Each request carries the
//! [`LoadTicket`] issued by the session, and the response echoes it back so
//! [`Session::complete_load`](crate::session::Session::complete_load) can
//! discard stale completions.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::loader::{load_file, Dataset, LoadError};
use crate::session::LoadTicket;

/// Commands sent to the worker.
#[derive(Debug)]
pub enum LoadCommand {
    /// Read and parse a file from disk.
    Load { ticket: LoadTicket, path: PathBuf },
    /// Parse text that is already in memory.
    Parse { ticket: LoadTicket, text: String },
    Shutdown,
}

/// A finished load, tagged with the ticket it was issued under.
#[derive(Debug)]
pub struct LoadResponse {
    pub ticket: LoadTicket,
    pub result: Result<Dataset, LoadError>,
}

/// Handle to a running load worker. Dropping it shuts the thread down.
pub struct LoadWorker {
    commands: Sender<LoadCommand>,
    responses: Receiver<LoadResponse>,
    handle: Option<JoinHandle<()>>,
}

impl LoadWorker {
    pub fn spawn() -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("paramlens-loader".into())
            .spawn(move || worker_loop(cmd_rx, resp_tx))?;
        Ok(Self {
            commands: cmd_tx,
            responses: resp_rx,
            handle: Some(handle),
        })
    }

    /// Queue a file load. Returns false if the worker has exited.
    pub fn load(&self, ticket: LoadTicket, path: PathBuf) -> bool {
        self.commands.send(LoadCommand::Load { ticket, path }).is_ok()
    }

    /// Queue parsing of in-memory text. Returns false if the worker has exited.
    pub fn parse(&self, ticket: LoadTicket, text: String) -> bool {
        self.commands.send(LoadCommand::Parse { ticket, text }).is_ok()
    }

    /// Completed loads, without blocking.
    pub fn try_responses(&self) -> Vec<LoadResponse> {
        self.responses.try_iter().collect()
    }

    /// Wait up to `timeout` for the next completed load.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<LoadResponse> {
        match self.responses.recv_timeout(timeout) {
            Ok(resp) => Some(resp),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for LoadWorker {
    fn drop(&mut self) {
        let _ = self.commands.send(LoadCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(rx: Receiver<LoadCommand>, tx: Sender<LoadResponse>) {
    loop {
        let (ticket, result) = match rx.recv() {
            Ok(LoadCommand::Shutdown) | Err(_) => break,
            Ok(LoadCommand::Load { ticket, path }) => {
                debug!(%ticket, path = %path.display(), "worker loading file");
                (ticket, load_file(&path))
            }
            Ok(LoadCommand::Parse { ticket, text }) => {
                debug!(%ticket, bytes = text.len(), "worker parsing text");
                (ticket, Dataset::from_text(&text).map_err(LoadError::from))
            }
        };
        if tx.send(LoadResponse { ticket, result }).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn worker_shutdown_on_drop() {
        let worker = LoadWorker::spawn().unwrap();
        drop(worker);
    }

    #[test]
    fn parse_round_trip_echoes_ticket() {
        let worker = LoadWorker::spawn().unwrap();
        assert!(worker.parse(LoadTicket(7), r#"{"strategies": []}"#.into()));

        let resp = worker.recv_timeout(TIMEOUT).expect("worker should respond");
        assert_eq!(resp.ticket, LoadTicket(7));
        assert!(resp.result.unwrap().is_empty());
    }

    #[test]
    fn parse_failure_is_reported() {
        let worker = LoadWorker::spawn().unwrap();
        worker.parse(LoadTicket(1), "nope".into());
        let resp = worker.recv_timeout(TIMEOUT).unwrap();
        assert!(matches!(resp.result, Err(LoadError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let worker = LoadWorker::spawn().unwrap();
        worker.load(LoadTicket(1), PathBuf::from("/nonexistent/paramlens.json"));
        let resp = worker.recv_timeout(TIMEOUT).unwrap();
        assert!(matches!(resp.result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn responses_arrive_in_request_order() {
        let worker = LoadWorker::spawn().unwrap();
        for i in 1..=3 {
            worker.parse(LoadTicket(i), "{}".into());
        }
        let tickets: Vec<u64> = (0..3)
            .map(|_| worker.recv_timeout(TIMEOUT).unwrap().ticket.0)
            .collect();
        assert_eq!(tickets, vec![1, 2, 3]);
    }
}
