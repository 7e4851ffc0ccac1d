use crate::error::{ListenerError, Result};
use crate::kerberos::{CaptureRecord, FormattedHash, HashMode};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where captured hashes are persisted, if anywhere.
#[derive(Debug, Clone)]
pub enum OutputSink {
    Disabled,
    Directory { dir: PathBuf, mode: HashMode },
}

impl OutputSink {
    pub fn new(dir: PathBuf, mode: HashMode, no_files: bool) -> Self {
        if no_files {
            OutputSink::Disabled
        } else {
            OutputSink::Directory { dir, mode }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, OutputSink::Directory { .. })
    }

    /// Creates the output directory. Does nothing when persistence is off.
    pub fn prepare(&self) -> Result<()> {
        if let OutputSink::Directory { dir, .. } = self {
            fs::create_dir_all(dir).map_err(|e| ListenerError::io(dir, e))?;
        }
        Ok(())
    }

    /// `<principal>_<realm>.txt` inside the output directory. Both fields
    /// come off the wire, so separators are flattened to keep the file there.
    pub fn identity_file(&self, record: &CaptureRecord) -> Option<PathBuf> {
        match self {
            OutputSink::Disabled => None,
            OutputSink::Directory { dir, .. } => Some(dir.join(format!(
                "{}_{}.txt",
                file_name_part(record.principal_name()),
                file_name_part(record.realm())
            ))),
        }
    }

    pub fn aggregate_file(&self) -> Option<PathBuf> {
        match self {
            OutputSink::Disabled => None,
            OutputSink::Directory { dir, mode } => {
                Some(dir.join(format!("all_hashes_{}.txt", mode.as_str())))
            }
        }
    }

    /// Appends `hash` to the per-identity file and to the aggregate file.
    ///
    /// Files are opened and closed on every call so other readers see each
    /// record as soon as it is written. Identical hashes are appended again.
    pub fn append(&self, record: &CaptureRecord, hash: &FormattedHash) -> Result<()> {
        let (Some(identity), Some(aggregate)) = (self.identity_file(record), self.aggregate_file())
        else {
            return Ok(());
        };

        append_line(&identity, hash.as_str())?;
        append_line(&aggregate, hash.as_str())
    }
}

fn file_name_part(field: &str) -> String {
    field
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ListenerError::io(path, e))?;
    writeln!(file, "{}", line).map_err(|e| ListenerError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kerberos::{format_hash, parse_asreq_line};

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_append_writes_identity_and_aggregate() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = OutputSink::new(tmp.path().to_path_buf(), HashMode::Hashcat, false);
        let record = parse_asreq_line("alice$EXAMPLE.COM$deadbeef").unwrap();
        let hash = format_hash(&record, HashMode::Hashcat);

        sink.append(&record, &hash).unwrap();

        let identity = tmp.path().join("alice_EXAMPLE.COM.txt");
        let aggregate = tmp.path().join("all_hashes_hashcat.txt");
        assert_eq!(read_lines(&identity), vec!["$krb5pa$18$alice$EXAMPLE.COM$deadbeef"]);
        assert_eq!(read_lines(&aggregate), vec!["$krb5pa$18$alice$EXAMPLE.COM$deadbeef"]);
    }

    #[test]
    fn test_identity_file_stays_in_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("captures");
        let sink = OutputSink::new(out_dir.clone(), HashMode::Hashcat, false);
        sink.prepare().unwrap();

        let escape = parse_asreq_line("../escaped$CORP$aa").unwrap();
        sink.append(&escape, &format_hash(&escape, HashMode::Hashcat)).unwrap();
        assert!(!tmp.path().join("escaped_CORP.txt").exists());
        assert_eq!(
            read_lines(&out_dir.join(".._escaped_CORP.txt")),
            vec!["$krb5pa$18$../escaped$CORP$aa"]
        );

        let service = parse_asreq_line("host/ws01$CORP\\LAB$bb").unwrap();
        sink.append(&service, &format_hash(&service, HashMode::Hashcat)).unwrap();
        assert_eq!(
            sink.identity_file(&service),
            Some(out_dir.join("host_ws01_CORP_LAB.txt"))
        );
        assert_eq!(read_lines(&out_dir.join("host_ws01_CORP_LAB.txt")).len(), 1);
        assert_eq!(read_lines(&out_dir.join("all_hashes_hashcat.txt")).len(), 2);
    }

    #[test]
    fn test_duplicates_are_appended() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = OutputSink::new(tmp.path().to_path_buf(), HashMode::John, false);
        let alice = parse_asreq_line("alice$EXAMPLE.COM$deadbeef").unwrap();
        let bob = parse_asreq_line("bob$EXAMPLE.COM$cafe").unwrap();

        for record in [&alice, &alice, &bob] {
            sink.append(record, &format_hash(record, HashMode::John)).unwrap();
        }

        assert_eq!(read_lines(&tmp.path().join("alice_EXAMPLE.COM.txt")).len(), 2);
        assert_eq!(read_lines(&tmp.path().join("bob_EXAMPLE.COM.txt")).len(), 1);
        assert_eq!(
            read_lines(&tmp.path().join("all_hashes_john.txt")),
            vec![
                "$krb5pa$18$alice$EXAMPLE.COM$$deadbeef",
                "$krb5pa$18$alice$EXAMPLE.COM$$deadbeef",
                "$krb5pa$18$bob$EXAMPLE.COM$$cafe",
            ]
        );
    }

    #[test]
    fn test_disabled_sink_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("captures");
        let sink = OutputSink::new(out_dir.clone(), HashMode::Hashcat, true);
        let record = parse_asreq_line("alice$EXAMPLE.COM$deadbeef").unwrap();

        sink.prepare().unwrap();
        sink.append(&record, &format_hash(&record, HashMode::Hashcat)).unwrap();

        assert!(!sink.is_enabled());
        assert!(sink.aggregate_file().is_none());
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_append_reports_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = OutputSink::new(tmp.path().join("missing"), HashMode::Hashcat, false);
        let record = parse_asreq_line("alice$EXAMPLE.COM$deadbeef").unwrap();

        let err = sink
            .append(&record, &format_hash(&record, HashMode::Hashcat))
            .unwrap_err();
        assert!(matches!(err, ListenerError::Io { .. }));
    }

    #[test]
    fn test_prepare_creates_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("a").join("b");
        let sink = OutputSink::new(out_dir.clone(), HashMode::Hashcat, false);

        sink.prepare().unwrap();
        assert!(out_dir.is_dir());
    }
}
