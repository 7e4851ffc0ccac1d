use super::tshark::Tshark;
use crate::error::{ListenerError, Result};
use crate::help::get_timestamp;
use crate::kerberos::{format_hash, parse_asreq_line, HashMode};
use crate::output::OutputSink;
use log::{debug, error, warn};
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, Command, ExitStatus};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Running,
    Draining,
    Stopped,
}

/// Cloneable side of a session that other threads use to stop it.
///
/// The flag is only ever set. The process group id is published once the
/// decoder is spawned; signalling the group is what unblocks a pending read.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    pgid: Arc<AtomicI32>,
}

impl ShutdownHandle {
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Never blocks, safe from any thread, and can be called repeatedly.
    pub fn shutdown(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.signal_group();
    }

    /// Decoder process group still being tracked, if any.
    pub fn process_group(&self) -> Option<i32> {
        Some(self.pgid.load(Ordering::SeqCst)).filter(|pgid| *pgid > 0)
    }

    fn publish_group(&self, pgid: i32) {
        self.pgid.store(pgid, Ordering::SeqCst);
    }

    fn signal_group(&self) {
        let pgid = self.pgid.load(Ordering::SeqCst);
        if pgid <= 0 {
            return;
        }
        // Once every member has exited the id may be handed to an unrelated group.
        if unsafe { libc::killpg(pgid, 0) } != 0 {
            debug!("process group {} is gone", pgid);
            let _ = self
                .pgid
                .compare_exchange(pgid, 0, Ordering::SeqCst, Ordering::SeqCst);
            return;
        }
        // ESRCH here means the group exited since the check above.
        if unsafe { libc::killpg(pgid, libc::SIGTERM) } != 0 {
            debug!(
                "killpg({}) failed: {}",
                pgid,
                io::Error::last_os_error()
            );
        }
    }
}

/// Counters reported when the listener stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub lines_read: u64,
    pub captured: u64,
    pub persist_failures: u64,
}

pub struct CaptureSession {
    mode: HashMode,
    sink: OutputSink,
    state: SessionState,
    shutdown: ShutdownHandle,
    child: Option<Child>,
    exit_status: Option<ExitStatus>,
}

impl CaptureSession {
    pub fn new(mode: HashMode, sink: OutputSink) -> Self {
        Self {
            mode,
            sink,
            state: SessionState::Idle,
            shutdown: ShutdownHandle::default(),
            child: None,
            exit_status: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Exit status of the decoder once it has been reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Spawns tshark capturing AS-REQ fields on `interface`.
    pub fn start(&mut self, tshark: &Tshark, interface: &str) -> Result<u32> {
        self.start_command(tshark.capture_command(interface))
    }

    /// Spawns `command` as the line source. It must pipe stdout and should
    /// lead its own process group, see [`super::tshark::into_process_group`].
    pub fn start_command(&mut self, mut command: Command) -> Result<u32> {
        self.state = SessionState::Starting;

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.state = SessionState::Stopped;
                return Err(ListenerError::Spawn(e));
            }
        };

        let pid = child.id();
        self.shutdown.publish_group(pid as i32);
        self.child = Some(child);
        debug!("decoder spawned with pid {}", pid);

        // A request that raced with the spawn saw no group to signal yet.
        if self.shutdown.is_requested() {
            self.shutdown.signal_group();
        }

        Ok(pid)
    }

    /// Streams the decoder output to the console and the sink until the
    /// decoder exits or a shutdown is requested, then reaps the decoder.
    pub fn run(&mut self) -> Result<CaptureStats> {
        let stdout = self
            .child
            .as_mut()
            .and_then(|child| child.stdout.take())
            .ok_or(ListenerError::MissingStdout)?;

        self.state = SessionState::Running;
        let stats = self.process_lines(BufReader::new(stdout), &mut io::stdout());
        self.drain();
        Ok(stats)
    }

    /// Handles every line of `reader` in order. Only checks the shutdown
    /// flag between lines; it does not interrupt a pending read.
    pub fn process_lines<R: BufRead, W: Write>(&self, mut reader: R, console: &mut W) -> CaptureStats {
        let mut stats = CaptureStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("reading decoder output failed: {}", e);
                    break;
                }
            }

            if self.shutdown.is_requested() {
                debug!("shutdown requested, leaving capture loop");
                break;
            }
            stats.lines_read += 1;

            // A principal or realm that is not UTF-8 cannot make a valid crack string.
            let Ok(line) = std::str::from_utf8(&buf) else {
                debug!("skipping decoder line that is not valid UTF-8");
                continue;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(record) = parse_asreq_line(line) else {
                continue;
            };

            let hash = format_hash(&record, self.mode);
            stats.captured += 1;

            if let Err(e) = writeln!(
                console,
                "[+] {} - Captured AS-REQ for {}\n{}",
                get_timestamp(),
                record.identity(),
                hash
            )
            .and_then(|_| console.flush())
            {
                warn!("console write failed: {}", e);
            }

            if let Err(e) = self.sink.append(&record, &hash) {
                stats.persist_failures += 1;
                error!("failed to persist hash for {}: {}", record.identity(), e);
                eprintln!("[!] Failed to save hash for {}: {}", record.identity(), e);
            }
        }

        stats
    }

    fn drain(&mut self) {
        self.state = SessionState::Draining;

        let Some(mut child) = self.child.take() else {
            return;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("decoder already exited: {}", status);
                self.exit_status = Some(status);
                return;
            }
            Ok(None) => {
                // Ask the lead process only; the group is handled by shutdown().
                if unsafe { libc::kill(child.id() as i32, libc::SIGTERM) } != 0 {
                    debug!("kill({}) failed: {}", child.id(), io::Error::last_os_error());
                }
            }
            Err(e) => warn!("unable to poll decoder: {}", e),
        }

        match child.wait() {
            Ok(status) => {
                debug!("decoder exited: {}", status);
                self.exit_status = Some(status);
            }
            Err(e) => warn!("unable to reap decoder: {}", e),
        }
    }

    /// Requests shutdown and signals the decoder's process group.
    /// Idempotent; reaps the decoder if `run` never did.
    pub fn shutdown(&mut self) {
        self.shutdown.shutdown();
        if self.child.is_some() {
            self.drain();
        }
        self.state = SessionState::Stopped;
    }
}
