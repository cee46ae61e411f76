mod config;
mod error;
mod pacer;
mod payload;
mod report;
mod socket;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use bytes::Bytes;
use clap::{value_parser, Arg, ArgMatches, Command};
use config::Config;
use error::{Error, Result};
use log::{error, info, warn};
use pacer::{Pacer, BURST_INTERVAL};
use payload::PayloadMode;
use report::Progress;
use socket::UdpSender;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    let config = match config_from_matches(&matches) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    info!("Running with config: {:#?}", config);
    if let Err(err) = run(config) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn cli() -> Command {
    clap::command!()
        .arg_required_else_help(true)
        .about("Send UDP traffic at a target packet rate for a fixed duration")
        .arg(
            Arg::new("target")
                .long("target")
                .short('t')
                .help("Destination hostname or IP address")
                .required(true),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .help("Destination UDP port")
                .required(true)
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("pps")
                .long("pps")
                .help("Packets per second to send, sent in bursts every 10ms")
                .default_value("60000")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("duration")
                .long("duration")
                .short('d')
                .help("Run length in seconds")
                .default_value("600")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .short('s')
                .help("Payload size in bytes")
                .default_value("512")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("payload")
                .long("payload")
                .help("How the payload is generated, once before sending starts")
                .default_value("fixed")
                .value_parser(value_parser!(PayloadMode)),
        )
        .arg(
            Arg::new("send-buffer")
                .long("send-buffer")
                .help("Socket send buffer size in bytes, 0 keeps the system default")
                .default_value("4194304")
                .value_parser(value_parser!(usize)),
        )
}

fn arg<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Result<T> {
    matches
        .get_one::<T>(id)
        .cloned()
        .ok_or_else(|| Error::Config(format!("--{id} is missing")))
}

fn config_from_matches(matches: &ArgMatches) -> Result<Config> {
    Config::new(
        arg(matches, "target")?,
        arg(matches, "port")?,
        arg(matches, "pps")?,
        arg(matches, "duration")?,
        arg(matches, "size")?,
        arg(matches, "payload")?,
        arg(matches, "send-buffer")?,
    )
}

/// Resolves the destination and opens the socket. Runs with the default
/// SIGINT disposition so Ctrl-C during a slow lookup ends the process.
fn prepare(config: &Config) -> Result<(UdpSender, Bytes)> {
    let remote = socket::resolve(&config.host, config.port)?;
    let sender = UdpSender::new(remote, config.send_buffer)?;
    info!("Sending to {}", sender.remote());

    Ok((
        sender,
        payload::generate(config.payload_mode, config.payload_size),
    ))
}

fn interrupt_flag() -> Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            warn!("Interrupt already requested, still stopping");
        }
    })?;
    Ok(interrupted)
}

fn run(config: Config) -> Result<()> {
    let (sender, payload) = prepare(&config)?;
    let interrupted = interrupt_flag()?;
    let mut pacer = Pacer::new(sender, payload, config.pps, config.duration, interrupted);

    println!(
        "Starting: {} pps -> {} pkts/{}ms bursts for {}s",
        config.pps,
        pacer.burst_size(),
        BURST_INTERVAL.as_millis(),
        config.duration.as_secs_f64()
    );

    let summary = pacer.run(&mut |progress: &Progress| println!("{progress}"));
    if summary.interrupted {
        println!("\nInterrupted by user");
    }
    println!("{summary}");
    info!(
        "Run started at {} lasted {:.3}s over {} bursts",
        summary.started_at.format("%H:%M:%S%.f"),
        summary.elapsed.as_secs_f64(),
        summary.bursts
    );

    Ok(())
}
