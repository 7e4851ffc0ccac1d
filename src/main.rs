use asreqroast::args::{prompt_interface, Args, ListenerConfig};
use asreqroast::capture::tshark::capture_args;
use asreqroast::capture::CaptureSession;
use asreqroast::debug::{debug_log, set_verbosity};
use asreqroast::error::Result;
use asreqroast::help::{show_interfaces, show_listener_status};
use asreqroast::lifecycle::install_signal_handler;
use clap::Parser;
use std::process;

fn main() {
    let args = Args::parse();
    set_verbosity(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("[!] {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = ListenerConfig::from_args(args);
    config.tshark.check()?;

    if args.list_interfaces {
        show_interfaces(&config.tshark.list_interfaces()?);
        return Ok(());
    }

    let interface = match &config.interface {
        Some(interface) => interface.clone(),
        None => prompt_interface(&config.tshark)?,
    };

    let sink = config.output_sink();
    sink.prepare()?;
    if sink.is_enabled() {
        println!("[+] Using output directory: {}", config.output_dir.display());
    } else {
        println!("[*] No output files will be created");
    }

    let mut session = CaptureSession::new(config.mode, sink);
    install_signal_handler(session.shutdown_handle())?;

    show_listener_status(
        (!config.no_files).then_some(config.output_dir.as_path()),
        config.mode,
        &interface,
    );
    debug_log(
        1,
        format!(
            "{} {}",
            config.tshark.path().display(),
            capture_args(&interface).join(" ")
        ),
    );

    let result = session
        .start(&config.tshark, &interface)
        .and_then(|pid| {
            println!("[+] Tshark started (PID: {})", pid);
            session.run()
        });
    session.shutdown();
    let stats = result?;

    println!(
        "[+] Listener stopped. {} hash(es) captured from {} line(s)",
        stats.captured, stats.lines_read
    );
    if stats.persist_failures > 0 {
        eprintln!(
            "[!] {} hash(es) could not be written to disk",
            stats.persist_failures
        );
    }
    if !config.no_files {
        println!("[+] Check output files in: {}", config.output_dir.display());
    }

    Ok(())
}
