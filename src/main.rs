//! CLI entry point (C9): argument parsing, wiring of C1–C8, SIGINT-driven
//! graceful shutdown.

use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Parser;
use log::LevelFilter;

use serial_gateway::config::{self, GatewayConfig};
use serial_gateway::control::GatewayControl;
use serial_gateway::error::FatalInitError;
use serial_gateway::forwarder;
use serial_gateway::net::{NetMgr, UdpEndpoint};
use serial_gateway::uart::UartMgr;
use serial_gateway::{admin, logging};

/// `serial_server <uart_config_path>` (§6).
#[derive(Parser, Debug)]
#[command(name = "serial_server", version, about = "RS-232/RS-485-to-TCP gateway with Modbus translation")]
struct Cli {
    /// Path to the YAML UART configuration file.
    config: std::path::PathBuf,

    /// Overrides the config file's log level.
    #[arg(long)]
    log_level: Option<String>,

    /// Overrides the config file's TCP listen port.
    #[arg(long)]
    tcp_port: Option<u16>,

    /// Overrides the config file's UDP listen port.
    #[arg(long)]
    udp_port: Option<u16>,

    /// Skip starting the stdin admin command surface.
    #[arg(long)]
    no_admin: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("serial_server: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FatalInitError> {
    let mut gw_config: GatewayConfig = config::load_config(&cli.config)?;
    if let Some(port) = cli.tcp_port {
        gw_config.tcp_port = port;
    }
    if let Some(port) = cli.udp_port {
        gw_config.udp_port = port;
    }
    if let Some(level) = &cli.log_level {
        gw_config.log_level = level.clone();
    }

    let level = logging::parse_level(&gw_config.log_level).unwrap_or(LevelFilter::Info);
    logging::init(&gw_config.log_path, level, true)
        .map_err(FatalInitError::Logger)?;

    log::info!("starting serial_server with config {}", cli.config.display());

    let uart_mgr = Arc::new(UartMgr::new(&gw_config.uart_list)?);
    let net_mgr = Arc::new(NetMgr::new_tcp_server(gw_config.tcp_port)?);

    // UDP is an optional listener (§6); unlike the TCP server it is not
    // load-bearing for the forwarder, so a bind failure is logged and
    // skipped rather than aborting startup.
    let _udp_endpoint = match UdpEndpoint::bind(gw_config.udp_port) {
        Ok(endpoint) => Some(endpoint),
        Err(e) => {
            log::warn!("udp listener on port {} not started: {e}", gw_config.udp_port);
            None
        }
    };

    let control = Arc::new(GatewayControl::new(uart_mgr, net_mgr));

    install_sigint_handler(Arc::clone(&control))?;

    let serial_handle = {
        let control = Arc::clone(&control);
        std::thread::spawn(move || forwarder::run_serial_to_network(&control))
    };
    let acceptor_handle = {
        let control = Arc::clone(&control);
        std::thread::spawn(move || control.net_mgr.run_acceptor(control.running_flag()))
    };
    let reaper_handle = {
        let control = Arc::clone(&control);
        std::thread::spawn(move || control.net_mgr.run_reaper(control.running_flag()))
    };
    let forwarder_handle = {
        let control = Arc::clone(&control);
        std::thread::spawn(move || forwarder::run_network_to_serial(&control))
    };

    if !cli.no_admin {
        admin::run(Arc::clone(&control));
        control.stop();
    }

    // Reverse-dependency order per §5: forwarder, reaper, acceptor, serial.
    let _ = forwarder_handle.join();
    let _ = reaper_handle.join();
    let _ = acceptor_handle.join();
    let _ = serial_handle.join();

    log::info!("serial_server shut down cleanly");
    Ok(())
}

fn install_sigint_handler(control: Arc<GatewayControl>) -> Result<(), FatalInitError> {
    let flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&flag))
        .map_err(FatalInitError::SignalHandler)?;

    std::thread::spawn(move || loop {
        if flag.load(Ordering::Relaxed) {
            log::warn!("received SIGINT, shutting down");
            control.stop();
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    Ok(())
}
