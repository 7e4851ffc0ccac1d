//! Invocations of the tshark binary: availability probe, interface listing
//! and the AS-REQ field capture.

use crate::error::{ListenerError, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const DEFAULT_TSHARK_PATH: &str = "/usr/bin/tshark";

/// AS-REQ messages that carry a client name, a realm and a PA-ENC-TIMESTAMP cipher.
pub const ASREQ_DISPLAY_FILTER: &str =
    "kerberos.msg_type == 10 && kerberos.CNameString && kerberos.realm && kerberos.cipher";

pub const ASREQ_FIELDS: [&str; 3] = [
    "kerberos.CNameString",
    "kerberos.realm",
    "kerberos.cipher",
];

/// One row of `tshark -D`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEntry {
    pub index: String,
    pub name: String,
    pub description: Option<String>,
}

impl InterfaceEntry {
    pub fn label(&self) -> String {
        match &self.description {
            Some(desc) => format!("{}. {} ({})", self.index, self.name, desc),
            None => format!("{}. {}", self.index, self.name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tshark {
    path: PathBuf,
}

impl Tshark {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fails unless the binary exists and `tshark -v` exits successfully.
    pub fn check(&self) -> Result<()> {
        if !self.path.exists() {
            return Err(ListenerError::DecoderNotFound(self.path.clone()));
        }

        let status = Command::new(&self.path)
            .arg("-v")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| ListenerError::DecoderUnusable {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(ListenerError::DecoderUnusable {
                path: self.path.clone(),
                reason: format!("`-v` exited with {}", status),
            });
        }

        debug!("tshark available at {}", self.path.display());
        Ok(())
    }

    pub fn list_interfaces(&self) -> Result<Vec<InterfaceEntry>> {
        let output = Command::new(&self.path)
            .arg("-D")
            .stderr(Stdio::null())
            .output()
            .map_err(|e| ListenerError::InterfaceListing(e.to_string()))?;

        if !output.status.success() {
            return Err(ListenerError::InterfaceListing(format!(
                "tshark -D exited with {}",
                output.status
            )));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        let interfaces = parse_interface_listing(&listing);
        if interfaces.is_empty() {
            return Err(ListenerError::NoInterfaces);
        }
        Ok(interfaces)
    }

    /// The capture command for `interface`. The child leads its own process
    /// group so one signal also reaches the dumpcap helper tshark spawns.
    pub fn capture_command(&self, interface: &str) -> Command {
        let mut command = Command::new(&self.path);
        command
            .args(capture_args(interface))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        into_process_group(&mut command);
        command
    }
}

/// `-Q` quiet, `-n` no name resolution, `-l` line-buffered stdout.
pub fn capture_args(interface: &str) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-Q".into(),
        "-n".into(),
        "-i".into(),
        interface.into(),
        "-Y".into(),
        ASREQ_DISPLAY_FILTER.into(),
        "-T".into(),
        "fields".into(),
    ];
    for field in ASREQ_FIELDS {
        args.push("-e".into());
        args.push(field.into());
    }
    args.push("-E".into());
    args.push("separator=$".into());
    args.push("-l".into());
    args
}

pub fn into_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

/// Parses `tshark -D` output, e.g. `1. eth0` or `5. any (Pseudo-device)`.
pub fn parse_interface_listing(listing: &str) -> Vec<InterfaceEntry> {
    listing
        .lines()
        .filter_map(|line| {
            let (index, rest) = line.trim().split_once(". ")?;
            if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }

            let rest = rest.trim();
            let (name, description) = match rest.find(" (") {
                Some(pos) if rest.ends_with(')') => (
                    &rest[..pos],
                    Some(rest[pos + 2..rest.len() - 1].to_string()),
                ),
                _ => (rest, None),
            };
            if name.is_empty() {
                return None;
            }

            Some(InterfaceEntry {
                index: index.to_string(),
                name: name.to_string(),
                description,
            })
        })
        .collect()
}
