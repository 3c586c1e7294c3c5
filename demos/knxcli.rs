//! Command-line demo driving the `knx` crate end to end: gateway discovery,
//! a monitor loop printing inbound telegrams, and one-shot group writes.
//!
//! ```bash
//! cargo run --features cli --bin knxcli -- scan
//! cargo run --features cli --bin knxcli -- monitor --config knx.yaml
//! cargo run --features cli --bin knxcli -- write --config knx.yaml 1/2/3 01
//! ```

use anyhow::{bail, Context, Result};
use knx::addressing::GroupAddress;
use knx::config::Config;
use knx::connection_manager::ConnectionState;
use knx::orchestrator::KnxOrchestrator;
use knx::queue::Dispatcher;
use knx::scanner::{self, ScanOptions};
use knx::state_updater::StateUpdater;
use knx::telegram::Telegram;
use std::time::Duration;

fn load_config(path: Option<&str>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let yaml = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            Config::from_yaml(&yaml)?
        }
        None => Config::default(),
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

async fn cmd_scan() -> Result<()> {
    let options = ScanOptions { timeout: Duration::from_secs(3), ..ScanOptions::default() };
    let gateways = scanner::scan(&options).await?;
    if gateways.is_empty() {
        println!("no gateways responded");
        return Ok(());
    }
    for gateway in gateways {
        println!(
            "{name} at {ip}:{port} (core v{version}, tunnelling={tun} tcp={tcp} routing={routing} secure={secure})",
            name = gateway.name,
            ip = gateway.ip,
            port = gateway.port,
            version = gateway.core_version,
            tun = gateway.supports_tunnelling,
            tcp = gateway.supports_tunnelling_tcp,
            routing = gateway.supports_routing,
            secure = gateway.supports_secure,
        );
    }
    Ok(())
}

async fn cmd_monitor(config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;

    let mut dispatcher = Dispatcher::new();
    dispatcher.register_callback(knx::AddressFilter::parse("*/*/*")?, |telegram| {
        println!("{telegram:?}");
    });

    let orchestrator = KnxOrchestrator::start(config, dispatcher, StateUpdater::new()).await?;
    println!("connected, state = {:?}", orchestrator.connection_state());

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    orchestrator.stop().await;
    Ok(())
}

async fn cmd_write(config_path: Option<&str>, group: &str, hex: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let destination: GroupAddress = group.parse()?;
    let value = parse_hex(hex)?;

    let orchestrator = KnxOrchestrator::start(config.clone(), Dispatcher::new(), StateUpdater::new()).await?;
    if orchestrator.connection_state() != ConnectionState::Connected {
        bail!("not connected");
    }

    let telegram = Telegram::group_write(config.general.own_address, destination, value);
    orchestrator.queue().send_outbound(telegram).await?;

    tokio::time::sleep(Duration::from_millis(200)).await; // let the rate limiter drain before tearing down
    orchestrator.stop().await;
    Ok(())
}

fn parse_hex(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        bail!("hex payload must have an even number of digits");
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).with_context(|| format!("invalid hex byte at offset {i}")))
        .collect()
}

fn find_flag<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).map(String::as_str)
}

/// `args` with `--config <path>` (if present) stripped out, leaving only
/// positional arguments.
fn strip_flag<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
    let mut out = Vec::with_capacity(args.len());
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == flag {
            skip_next = true;
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = find_flag(&args, "--config");

    match args.first().map(String::as_str) {
        Some("scan") => cmd_scan().await,
        Some("monitor") => cmd_monitor(config_path).await,
        Some("write") => {
            let positional = strip_flag(&args[1..], "--config");
            let [group, hex] = positional[..] else {
                bail!("usage: knxcli write <group> <hex> [--config path]");
            };
            cmd_write(config_path, group, hex).await
        }
        _ => {
            eprintln!("usage: knxcli <scan|monitor|write> [--config path] [group hex]");
            Ok(())
        }
    }
}
