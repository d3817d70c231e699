use crate::error::{Result, TdError};
use crate::parser::Task;
use crate::writer;

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Completion report for one submitted snapshot.
#[derive(Debug)]
enum Outcome {
    Written(u64),
    Failed(u64, TdError),
}

/// Background writer for the task file.
///
/// Snapshots are written one at a time in submission order, so the file
/// always ends up holding the latest submitted list.
pub struct WriteBack {
    jobs: Option<Sender<(u64, Vec<Task>)>>,
    outcomes: Receiver<Outcome>,
    handle: Option<JoinHandle<()>>,
    submitted: u64,
    completed: u64,
}

impl WriteBack {
    pub fn spawn(path: PathBuf) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<(u64, Vec<Task>)>();
        let (outcome_tx, outcome_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            for (seq, tasks) in job_rx {
                let outcome = match writer::write_tasks(&tasks, &path) {
                    Ok(()) => Outcome::Written(seq),
                    Err(e) => {
                        error!(seq, path = %path.display(), "write-back failed: {}", e);
                        Outcome::Failed(seq, e)
                    }
                };
                if outcome_tx.send(outcome).is_err() {
                    break;
                }
            }
            debug!("write-back worker stopped");
        });

        Self {
            jobs: Some(job_tx),
            outcomes: outcome_rx,
            handle: Some(handle),
            submitted: 0,
            completed: 0,
        }
    }

    /// Queue a snapshot. Never waits for the disk.
    pub fn submit(&mut self, tasks: Vec<Task>) -> Result<()> {
        let jobs = self.jobs.as_ref().ok_or(TdError::WorkerGone)?;
        self.submitted += 1;
        jobs.send((self.submitted, tasks))
            .map_err(|_| TdError::WorkerGone)
    }

    #[cfg(test)]
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    pub fn pending(&self) -> u64 {
        self.submitted - self.completed
    }

    /// Collect finished writes without blocking. Returns the first failure.
    pub fn poll(&mut self) -> Result<()> {
        loop {
            match self.outcomes.try_recv() {
                Ok(outcome) => self.record(outcome)?,
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    return if self.pending() > 0 {
                        Err(TdError::WorkerGone)
                    } else {
                        Ok(())
                    };
                }
            }
        }
    }

    /// Block until every submitted snapshot has been written.
    pub fn flush(&mut self) -> Result<()> {
        while self.pending() > 0 {
            let outcome = self.outcomes.recv().map_err(|_| TdError::WorkerGone)?;
            self.record(outcome)?;
        }
        Ok(())
    }

    /// Flush, then stop the worker thread.
    pub fn shutdown(mut self) -> Result<()> {
        let result = self.flush();
        self.stop();
        result
    }

    fn record(&mut self, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::Written(seq) => {
                self.completed = seq;
                Ok(())
            }
            Outcome::Failed(seq, e) => {
                self.completed = seq;
                Err(e)
            }
        }
    }

    fn stop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WriteBack {
    fn drop(&mut self) {
        self.stop();
    }
}
