use crate::capture::InterfaceEntry;
use crate::kerberos::HashMode;
use chrono::Local;
use std::path::Path;

pub const BANNER: &str = "=== Kerberos AS-REQ Live Listener ===";

pub fn add_terminal_spacing(lines: u8) {
    for _ in 0..lines {
        println!();
    }
}

pub fn get_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn show_interfaces(interfaces: &[InterfaceEntry]) {
    println!("[*] Available network interfaces:");
    for entry in interfaces {
        println!("\t{}", entry.label());
    }
    add_terminal_spacing(1);
}

pub fn show_listener_status(output_dir: Option<&Path>, mode: HashMode, interface: &str) {
    println!("\nPress Ctrl+C to stop the listener at any time\n");
    println!("{}", BANNER);
    match output_dir {
        Some(dir) => println!("[*] Output directory: {}", dir.display()),
        None => println!("[*] No output files will be created"),
    }
    println!("[*] Hash format: {}", mode);
    println!("[*] Starting capture on interface: {}", interface);
    println!("[*] Listening for Kerberos AS-REQ packets...\n");
}
