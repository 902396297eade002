use std::{
    io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use log::{debug, warn};

use crate::PitwallError;

use super::{ParticipantId, SessionSnapshot};

/// A source of session data for the dashboard.
///
/// The provider owns everything about where session data comes from (remote timing feeds,
/// on-disk caches, recorded files). The dashboard only ever asks for a complete snapshot once per
/// refresh tick and never mutates what it receives.
///
/// # Errors
///
/// Any call may fail, e.g. because the session is unreachable or has not been loaded yet. The
/// dashboard treats a failed `snapshot()` as "no data this tick" and simply asks again on the
/// next one.
pub trait SessionProvider {
    /// Retrieve the full current state of the session.
    fn snapshot(&mut self) -> Result<SessionSnapshot, PitwallError>;

    /// List the participants of the session in the provider's reported order.
    fn list_participants(&mut self) -> Result<Vec<ParticipantId>, PitwallError> {
        Ok(self.snapshot()?.participants)
    }
}

impl<P: SessionProvider + ?Sized> SessionProvider for Box<P> {
    fn snapshot(&mut self) -> Result<SessionSnapshot, PitwallError> {
        (**self).snapshot()
    }

    fn list_participants(&mut self) -> Result<Vec<ParticipantId>, PitwallError> {
        (**self).list_participants()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderMode {
    /// Re-read the file on every call and return its last snapshot. A fetcher appending to the
    /// file turns it into a live source.
    Latest,
    /// Step through the file one snapshot per call, holding the last one once exhausted.
    Replay,
}

/// Reads session snapshots from a JSON Lines file, one `SessionSnapshot` per line.
pub struct FileSessionProvider {
    path: PathBuf,
    mode: ProviderMode,
    replay: Option<Vec<SessionSnapshot>>,
    cursor: usize,
}

impl FileSessionProvider {
    pub fn new(path: impl AsRef<Path>, mode: ProviderMode) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode,
            replay: None,
            cursor: 0,
        }
    }

    /// Every snapshot in the file that parses. A fetcher appending to the file can leave a torn
    /// last line, so malformed lines are skipped; the read only fails if none of them parse.
    fn read_all(&self) -> Result<Vec<SessionSnapshot>, PitwallError> {
        let lines = serde_jsonlines::json_lines::<SessionSnapshot, _>(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                PitwallError::ProviderUnavailable {
                    reason: format!("session file {:?} does not exist", self.path),
                }
            } else {
                PitwallError::SessionFileError { source: e }
            }
        })?;

        let mut snapshots = Vec::new();
        let mut last_malformed = None;
        for (idx, line) in lines.enumerate() {
            match line {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) if is_malformed(&e) => {
                    warn!(
                        "Skipping malformed snapshot on line {} of {:?}: {}",
                        idx + 1,
                        self.path,
                        e
                    );
                    last_malformed = Some(e);
                }
                Err(e) => return Err(PitwallError::SessionFileError { source: e }),
            }
        }
        match last_malformed {
            Some(e) if snapshots.is_empty() => Err(line_error(e)),
            _ => Ok(snapshots),
        }
    }
}

impl SessionProvider for FileSessionProvider {
    fn snapshot(&mut self) -> Result<SessionSnapshot, PitwallError> {
        match self.mode {
            ProviderMode::Latest => {
                let snapshot = self
                    .read_all()?
                    .pop()
                    .ok_or(PitwallError::SessionNotLoaded)?;
                debug!(
                    "Read latest snapshot from {:?} with {} participants",
                    self.path,
                    snapshot.participants.len()
                );
                Ok(snapshot)
            }
            ProviderMode::Replay => {
                if self.replay.is_none() {
                    let snapshots = self.read_all()?;
                    debug!(
                        "Loaded {} snapshots for replay from {:?}",
                        snapshots.len(),
                        self.path
                    );
                    self.replay = Some(snapshots);
                }
                let snapshots = self.replay.as_deref().unwrap_or_default();
                if snapshots.is_empty() {
                    return Err(PitwallError::SessionNotLoaded);
                }
                let idx = self.cursor.min(snapshots.len() - 1);
                if self.cursor + 1 == snapshots.len() {
                    warn!("Replay reached its last snapshot, holding it from now on");
                }
                self.cursor = (self.cursor + 1).min(snapshots.len());
                Ok(snapshots[idx].clone())
            }
        }
    }
}

/// Scripted provider used by tests and benchmarks.
///
/// Each call to `snapshot()` returns the next scripted outcome; once the script is exhausted the
/// last outcome repeats forever. `Err` entries hold the reason reported as
/// `PitwallError::ProviderUnavailable`.
pub struct MockSessionProvider {
    script: Vec<Result<SessionSnapshot, String>>,
    cursor: usize,
    calls: Arc<AtomicUsize>,
}

impl MockSessionProvider {
    pub fn new(script: Vec<Result<SessionSnapshot, String>>) -> Self {
        Self {
            script,
            cursor: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn always(snapshot: SessionSnapshot) -> Self {
        Self::new(vec![Ok(snapshot)])
    }

    /// Shared counter of `snapshot()` calls, readable after the provider moved into a task.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SessionProvider for MockSessionProvider {
    fn snapshot(&mut self) -> Result<SessionSnapshot, PitwallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(outcome) = self
            .script
            .get(self.cursor)
            .or_else(|| self.script.last())
        else {
            return Err(PitwallError::SessionNotLoaded);
        };
        self.cursor += 1;
        outcome
            .clone()
            .map_err(|reason| PitwallError::ProviderUnavailable { reason })
    }
}
