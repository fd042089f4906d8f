//! Command-line monitor for the WEART middleware.
//!
//! Connects to a running middleware, prints the protocol traffic, and can
//! drive calibration and raw-data streaming for quick hardware checks.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::Receiver;

use weart_client::{ClientConfig, ClientEvent, Direction, WeartClient};
use weart_protocol::{Message, DEFAULT_MIDDLEWARE_PORT};

#[derive(Parser)]
#[command(name = "weartctl", about = "Monitor and control a WEART middleware instance")]
struct Cli {
    /// Middleware host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Middleware TCP port.
    #[arg(long, default_value_t = DEFAULT_MIDDLEWARE_PORT)]
    port: u16,

    /// Seconds to wait for the first connection.
    #[arg(long, default_value_t = 10)]
    connect_wait: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream all protocol traffic to stdout.
    Monitor,
    /// Request middleware and devices status, print both, and exit.
    Status,
    /// Run the hand-tracking calibration procedure and report the result.
    Calibrate,
    /// Toggle raw sensor data streaming (streams samples while on).
    RawData {
        /// Desired streaming state.
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = ClientConfig::default().with_host(cli.host).with_port(cli.port);
    let client = WeartClient::new(config);
    let events = client.subscribe();
    client.start();

    if !wait_for_connection(&events, Duration::from_secs(cli.connect_wait)) {
        eprintln!("no middleware reachable on port {} (is it running?)", cli.port);
        client.stop();
        return ExitCode::FAILURE;
    }

    let outcome = match cli.command {
        Command::Monitor => run_monitor(&events),
        Command::Status => run_status(&client, &events),
        Command::Calibrate => run_calibrate(&client, &events),
        Command::RawData { state } => run_raw_data(&client, &events, state),
    };

    client.stop();
    outcome
}

fn wait_for_connection(events: &Receiver<ClientEvent>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(ClientEvent::ConnectionChanged(true)) => return true,
            Ok(ClientEvent::Error(e)) => log::warn!("{e}"),
            Ok(_) => continue,
            Err(_) => return false,
        }
    }
}

fn run_monitor(events: &Receiver<ClientEvent>) -> ExitCode {
    println!("connected; streaming protocol traffic (Ctrl-C to quit)");
    for event in events.iter() {
        match event {
            ClientEvent::Text { direction, text } => {
                let arrow = match direction {
                    Direction::Received => "<-",
                    Direction::Sent => "->",
                };
                println!("{arrow} {text}");
            }
            ClientEvent::ConnectionChanged(up) => {
                println!("[connection {}]", if up { "up" } else { "down" });
            }
            ClientEvent::Error(e) => eprintln!("[error] {e}"),
            _ => {}
        }
    }
    ExitCode::SUCCESS
}

fn run_status(client: &WeartClient, events: &Receiver<ClientEvent>) -> ExitCode {
    client.get_middleware_status();
    client.get_devices_status();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut got_middleware = false;
    let mut got_devices = false;
    while !(got_middleware && got_devices) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let Ok(event) = events.recv_timeout(remaining) else {
            eprintln!("middleware did not answer the status request");
            return ExitCode::FAILURE;
        };
        match event {
            ClientEvent::Message { direction: Direction::Received, message } => match message {
                Message::MiddlewareStatus { status, version, status_code, error_desc, .. } => {
                    println!("middleware: {status:?} (version {version}, code {status_code})");
                    if !error_desc.is_empty() {
                        println!("  error: {error_desc}");
                    }
                    got_middleware = true;
                }
                Message::DevicesStatus { devices } => {
                    println!("devices: {}", devices.len());
                    for dev in devices {
                        println!(
                            "  {} {:?} battery {}%{}",
                            dev.mac_address,
                            dev.hand_side,
                            dev.battery_level,
                            if dev.charging { " (charging)" } else { "" },
                        );
                    }
                    got_devices = true;
                }
                _ => {}
            },
            ClientEvent::Error(e) => log::warn!("{e}"),
            _ => {}
        }
    }
    ExitCode::SUCCESS
}

fn run_calibrate(client: &WeartClient, events: &Receiver<ClientEvent>) -> ExitCode {
    println!("starting calibration; keep hands still");
    client.start_calibration();

    let deadline = Instant::now() + Duration::from_secs(60);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let Ok(event) = events.recv_timeout(remaining) else {
            eprintln!("calibration timed out");
            return ExitCode::FAILURE;
        };
        match event {
            ClientEvent::Message { direction: Direction::Received, message } => match message {
                Message::TrackingCalibrationStatus { hand, status } => {
                    println!("{hand:?}: {status:?}");
                }
                Message::TrackingCalibrationResult { hand, success } => {
                    println!("{hand:?}: {}", if success { "calibrated" } else { "failed" });
                    if success {
                        client.mark_calibration_valid();
                    }
                    return if success { ExitCode::SUCCESS } else { ExitCode::FAILURE };
                }
                _ => {}
            },
            ClientEvent::Error(e) => log::warn!("{e}"),
            _ => {}
        }
    }
}

fn run_raw_data(
    client: &WeartClient,
    events: &Receiver<ClientEvent>,
    state: Toggle,
) -> ExitCode {
    match state {
        Toggle::Off => {
            client.stop_raw_data();
            ExitCode::SUCCESS
        }
        Toggle::On => {
            client.start_raw_data();
            println!("streaming raw sensor data (Ctrl-C to quit)");
            for event in events.iter() {
                if let ClientEvent::Message {
                    direction: Direction::Received,
                    message:
                        Message::RawSensorData { hand, point, accelerometer, gyroscope, time_of_flight },
                } = event
                {
                    println!(
                        "{hand:?}/{point:?} acc=({:.2},{:.2},{:.2}) gyro=({:.2},{:.2},{:.2}) tof={time_of_flight:.1}",
                        accelerometer.x,
                        accelerometer.y,
                        accelerometer.z,
                        gyroscope.x,
                        gyroscope.y,
                        gyroscope.z,
                    );
                }
            }
            ExitCode::SUCCESS
        }
    }
}
