mod commands;

use attlink::{
    uuid_name, AddressType, AttStream, BdAddr, BtSocket, ChannelConfig, DiscoveryMode, GattClient,
    HandleRange, TransportMode,
};
use clap::Parser;
use commands::{parse_commands, Command, CommandError};
use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::time::Duration;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "attlink", about = "Talk ATT/GATT to a Bluetooth LE device")]
struct Cli {
    /// Local adapter address
    #[arg(long, default_value = "00:00:00:00:00:00")]
    src: BdAddr,

    /// Peer address
    #[arg(long)]
    dst: BdAddr,

    /// Local address type (0 = BR/EDR, 1 = LE public, 2 = LE random)
    #[arg(long, default_value_t = 1)]
    stype: u8,

    /// Peer address type (0 = BR/EDR, 1 = LE public, 2 = LE random)
    #[arg(long, default_value_t = 1)]
    dtype: u8,

    /// 0 = quiet, 1 = discovery details, 2 = PDU dumps
    #[arg(long, default_value_t = 0)]
    verbose: u8,

    /// Receive timeout in milliseconds; negative waits forever
    #[arg(long, default_value_t = 1000, allow_hyphen_values = true)]
    timeout: i64,

    /// Connect to this RFCOMM channel instead of the ATT fixed channel
    #[arg(long)]
    rfcomm: Option<u8>,

    /// Commands, run left to right
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    commands: Vec<String>,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("invalid address type {0}")]
    AddressType(u8),

    #[error("connect failed: {0}")]
    Connect(std::io::Error),

    #[error(transparent)]
    Link(#[from] attlink::Error),
}

fn log_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// The logger itself passes everything down to Debug; the `verbose` command
/// moves the global max level at run time.
fn init_logging(verbose: u8) {
    let config = Config::default();
    if TermLogger::init(LevelFilter::Debug, config, TerminalMode::Stderr, ColorChoice::Auto)
        .is_err()
    {
        eprintln!("logger already initialized");
    }
    log::set_max_level(log_level(verbose));
}

fn timeout_from_ms(millis: i64) -> Option<Duration> {
    u64::try_from(millis).ok().map(Duration::from_millis)
}

fn list<S: AttStream>(client: &mut GattClient<S>, mode: DiscoveryMode) -> Result<(), CliError> {
    let verbose = client.channel().verbosity() >= 1;
    let discovery = client.discover(HandleRange::full(), mode)?;
    for record in &discovery {
        println!("{}", record);
        if verbose {
            if let Some(name) = uuid_name(record.uuid()) {
                println!("info: {}", name);
            }
        }
    }
    if !discovery.outcome.is_complete() {
        log::warn!("{} listing incomplete", mode);
    }
    Ok(())
}

fn watch<S: AttStream>(
    client: &mut GattClient<S>,
    service: u16,
    characteristic: u16,
) -> Result<(), CliError> {
    let subscription = client.subscribe_characteristic(service, characteristic)?;
    info!(
        "notifications from 0x{:04x} (CCCD 0x{:04x})",
        subscription.value_handle, subscription.cccd_handle
    );

    while let Some(pdu) = client.channel_mut().receive()? {
        println!("{}", hex::encode(&pdu));
    }
    Ok(())
}

fn execute<S: AttStream>(client: &mut GattClient<S>, command: &Command) -> Result<(), CliError> {
    match command {
        Command::Primary => list(client, DiscoveryMode::PrimaryService)?,
        Command::Chars => list(client, DiscoveryMode::Characteristic)?,
        Command::CharDesc => list(client, DiscoveryMode::Descriptor)?,
        Command::BatLevel => {
            if let Some((_, level)) = client.battery_level()? {
                println!("Battery Level = {}%", level);
            }
        }
        Command::Timeout(millis) => client.channel_mut().set_timeout(timeout_from_ms(*millis)),
        Command::Verbose(level) => {
            client.channel_mut().set_verbosity(*level);
            log::set_max_level(log_level(*level));
        }
        Command::Watch {
            service,
            characteristic,
        } => watch(client, *service, *characteristic)?,
        Command::Send(bytes) => client.channel_mut().send(bytes)?,
        Command::Recv => match client.channel_mut().receive()? {
            Some(pdu) => println!("{}", hex::encode(&pdu)),
            None => info!("no data"),
        },
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mode = if cli.rfcomm.is_some() {
        TransportMode::Raw
    } else {
        TransportMode::Att
    };
    let commands = parse_commands(&cli.commands, mode)?;

    let socket = match cli.rfcomm {
        Some(channel) => BtSocket::connect_rfcomm(&cli.dst, channel),
        None => {
            let src_type = AddressType::try_from(cli.stype).map_err(CliError::AddressType)?;
            let dst_type = AddressType::try_from(cli.dtype).map_err(CliError::AddressType)?;
            BtSocket::connect_att(&cli.src, src_type, &cli.dst, dst_type)
        }
    }
    .map_err(CliError::Connect)?;
    info!("connected to {}", cli.dst);

    let config = ChannelConfig {
        timeout: timeout_from_ms(cli.timeout),
        verbosity: cli.verbose,
        mode,
        ..ChannelConfig::default()
    };
    let mut client = GattClient::new(socket, config);

    for command in &commands {
        execute(&mut client, command)?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
