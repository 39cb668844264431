use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use zap_gateway::ble::BleAdapter;
use zap_gateway::sim::{NullBle, SimWifi};
use zap_gateway::telemetry::{self, JWT_INTERVAL};
use zap_gateway::{identity, Gateway, GatewayState, Identity};
use zap_mcu::Wifi;

/// Fixed bound on the association wait: the device must come back to
/// accepting configuration input on failure, never block forever.
const CONNECT_ATTEMPTS: u32 = 30;
const CONNECT_DELAY: Duration = Duration::from_millis(500);

const WIFI_CHECK_INTERVAL: Duration = Duration::from_secs(5);

#[derive(clap::Parser)]
#[command(name = "zap-gateway")]
#[command(about = "Zap gateway daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create a new device signing key
    CreateKey,
    /// Run the gateway
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Address for the local HTTP server
    #[arg(long, default_value = "0.0.0.0:8080")]
    http_addr: String,
    /// Telemetry endpoint for the periodic signed JWT
    #[arg(long, default_value = "http://127.0.0.1:9100/gw/data/")]
    data_url: String,
    /// Advertised device name
    #[arg(long, default_value = "Zap Gateway")]
    device_name: String,
    /// Disable the BLE transport
    #[arg(long)]
    no_ble: bool,
}

#[tokio::main]
async fn main() {
    let cli: Cli = clap::Parser::parse();
    let home = identity::zap_home();

    match cli.command {
        Commands::CreateKey => identity::create_key(&home),
        Commands::Run(args) => run(home, args).await,
    }
}

async fn run(home: PathBuf, args: RunArgs) {
    let key = match identity::read_key(&home) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Failed to read key: {e}");
            eprintln!("Run `zap-gateway create-key` first");
            std::process::exit(1);
        }
    };

    let identity = Identity::new(identity::hardware_seed(), Some(key));
    println!("Device id: {}", identity.device_id);
    println!("Public key: {}", identity.public_key_hex());

    let gateway = Gateway::new(
        GatewayState::new(),
        SimWifi::new(),
        identity,
        args.device_name.clone(),
    );
    let shared = Arc::new(tokio::sync::Mutex::new(gateway));

    {
        let shared = shared.clone();
        let addr = args.http_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = zap_gateway::http::run_server(addr, shared).await {
                eprintln!("HTTP server failed: {e}");
                std::process::exit(1);
            }
        });
    }

    let mut ble = if args.no_ble {
        None
    } else {
        let mut adapter = BleAdapter::new(NullBle);
        if let Err(e) = adapter.start(&args.device_name) {
            eprintln!("BLE start failed: {e}");
        }
        Some(adapter)
    };

    // One cooperative loop owns all shared state transitions; the HTTP
    // adapter only ever touches the gateway through the same mutex.
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    let mut last_wifi_check = Instant::now();
    let mut last_jwt = Instant::now();
    let mut was_connected = false;

    loop {
        tick.tick().await;
        let now = Instant::now();
        let mut gw = shared.lock().await;

        if let Some(adapter) = ble.as_mut() {
            adapter.tick(&mut gw);
            if gw.state.take_due_ble_shutdown(now) {
                println!("Executing scheduled BLE shutdown");
                adapter.stop();
            }
        }

        if let Some((ssid, password)) = gw.state.take_pending_connect() {
            connect_to_wifi(&mut gw, ssid, password).await;
        }

        if now.duration_since(last_wifi_check) >= WIFI_CHECK_INTERVAL {
            last_wifi_check = now;
            let connected = gw.wifi.is_connected();
            if connected && !was_connected {
                let ip = gw.wifi.ip_info().map(|i| i.ip_str()).unwrap_or_default();
                println!("WiFi connected, IP address: {ip}");
            } else if !connected && was_connected {
                println!("WiFi connection lost!");
            }
            was_connected = connected;
        }

        let ble_active = ble.as_ref().map(|a| a.is_active()).unwrap_or(false);
        if gw.wifi.is_connected()
            && !ble_active
            && now.duration_since(last_jwt) >= JWT_INTERVAL
        {
            last_jwt = now;
            let jwt = telemetry::telemetry_jwt(&gw.identity, gw.state.uptime_ms());
            drop(gw); // do not hold the gateway across the network call
            match telemetry::send_jwt(&args.data_url, jwt).await {
                Ok(status) => println!("Telemetry POST ok: {status}"),
                Err(e) => eprintln!("Telemetry POST failed: {e}"),
            }
        }
    }
}

/// Bounded association attempt: connect, then poll the link for a
/// fixed number of attempts before giving up.
async fn connect_to_wifi<W: Wifi>(gw: &mut Gateway<W>, ssid: String, password: String) {
    println!("Connecting to WiFi: {ssid}");

    if let Err(e) = gw.wifi.connect(&ssid, &password) {
        eprintln!("WiFi connect failed: {e}");
        return;
    }

    for _ in 0..CONNECT_ATTEMPTS {
        if gw.wifi.is_connected() {
            let ip = gw.wifi.ip_info().map(|i| i.ip_str()).unwrap_or_default();
            println!("WiFi connected, IP address: {ip}");
            gw.state.mark_provisioned(ssid, password);
            return;
        }
        tokio::time::sleep(CONNECT_DELAY).await;
    }

    eprintln!("WiFi connection timed out");
    if let Err(e) = gw.wifi.disconnect() {
        eprintln!("WiFi disconnect failed: {e}");
    }
}
