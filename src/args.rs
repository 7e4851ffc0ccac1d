// src/args.rs
use crate::capture::tshark::DEFAULT_TSHARK_PATH;
use crate::capture::{InterfaceEntry, Tshark};
use crate::error::{ListenerError, Result};
use crate::help::show_interfaces;
use crate::kerberos::HashMode;
use crate::output::OutputSink;
use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "./kerberos_captures";

#[derive(Parser, Debug)]
#[command(name = "asreqroast")]
#[command(version)]
#[command(about = "Live Kerberos AS-REQ listener")]
pub struct Args {
    /// Interface number or name (as tshark -D shows). If omitted, you will be prompted.
    #[arg(short, long, env = "ASREQ_INTERFACE")]
    pub interface: Option<String>,

    /// Directory to write output files
    #[arg(short, long, env = "ASREQ_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: String,

    /// Hash output format
    #[arg(short, long, env = "ASREQ_FORMAT", value_enum, default_value_t = HashMode::Hashcat)]
    pub format: HashMode,

    /// Do not create output files
    #[arg(short, long, env = "ASREQ_NO_FILES")]
    pub no_files: bool,

    /// Path to the tshark binary
    #[arg(long = "tshark", env = "ASREQ_TSHARK", default_value = DEFAULT_TSHARK_PATH)]
    pub tshark_path: PathBuf,

    /// Print the interfaces tshark can capture on and exit
    #[arg(long)]
    pub list_interfaces: bool,

    /// Increase message verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Resolved runtime settings for one listener run.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub interface: Option<String>,
    pub output_dir: PathBuf,
    pub mode: HashMode,
    pub no_files: bool,
    pub tshark: Tshark,
}

impl ListenerConfig {
    pub fn from_args(args: &Args) -> Self {
        ListenerConfig {
            interface: args
                .interface
                .as_ref()
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty()),
            output_dir: expand_home(&args.output_dir),
            mode: args.format,
            no_files: args.no_files,
            tshark: Tshark::new(&args.tshark_path),
        }
    }

    pub fn output_sink(&self) -> OutputSink {
        OutputSink::new(self.output_dir.clone(), self.mode, self.no_files)
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let home_relative = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };

    match (home_relative, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => Path::new(path).to_path_buf(),
    }
}

/// Lists tshark's interfaces and asks which one to capture on.
/// Returns the interface number, which tshark accepts for `-i`.
pub fn prompt_interface(tshark: &Tshark) -> Result<String> {
    let interfaces = tshark.list_interfaces()?;
    show_interfaces(&interfaces);
    select_interface(&interfaces)
}

fn select_interface(interfaces: &[InterfaceEntry]) -> Result<String> {
    let labels: Vec<String> = interfaces.iter().map(InterfaceEntry::label).collect();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select capture interface")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(ListenerError::Prompt)?;

    interfaces
        .get(selection)
        .map(|entry| entry.index.clone())
        .ok_or_else(|| ListenerError::InvalidSelection(selection.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["asreqroast"]).unwrap();
        let config = ListenerConfig::from_args(&args);

        assert_eq!(config.interface, None);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.mode, HashMode::Hashcat);
        assert!(!config.no_files);
        assert_eq!(config.tshark.path(), Path::new(DEFAULT_TSHARK_PATH));
        assert!(config.output_sink().is_enabled());
    }

    #[test]
    fn test_full_command_line() {
        let args = Args::try_parse_from([
            "asreqroast",
            "-i",
            "eth0",
            "-o",
            "/tmp/caps",
            "-f",
            "john",
            "--no-files",
            "--tshark",
            "/opt/wireshark/tshark",
            "-vv",
        ])
        .unwrap();
        let config = ListenerConfig::from_args(&args);

        assert_eq!(config.interface.as_deref(), Some("eth0"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/caps"));
        assert_eq!(config.mode, HashMode::John);
        assert!(config.no_files);
        assert!(!config.output_sink().is_enabled());
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Args::try_parse_from(["asreqroast", "-f", "rc4"]).is_err());
    }

    #[test]
    fn test_blank_interface_means_prompt() {
        let args = Args::try_parse_from(["asreqroast", "-i", "  "]).unwrap();
        assert_eq!(ListenerConfig::from_args(&args).interface, None);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("./out"), PathBuf::from("./out"));
        assert_eq!(expand_home("/abs/out"), PathBuf::from("/abs/out"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/caps"), home.join("caps"));
            assert_eq!(expand_home("~"), home.join(""));
        }
    }
}
