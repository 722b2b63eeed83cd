// CLI entry point for the gridduel relay.
//
// Starts a standalone relay server that duel clients connect to. The relay
// seats the first two connections, referees their game, and relays chat.
// See `server.rs` for the networking architecture and `session.rs` for the
// session state.
//
// Usage:
//   relay [OPTIONS]
//     --port <PORT>             Listen port (default: 4000)
//     --reset-delay-ms <MS>     Pause before the board resets after a
//                               concluded game (default: 3000)

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gridduel_relay::server::{RelayConfig, start_relay};

fn main() {
    let config = parse_args();

    let (handle, addr) = match start_relay(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start relay: {e}");
            std::process::exit(1);
        }
    };

    println!("Relay listening on {addr}");
    println!("Press Ctrl+C to stop.");

    // Block until the process is killed. The process exits on SIGINT/SIGTERM
    // by default, which is fine for a relay — there is no state to flush.
    // If graceful shutdown is needed later, add the `ctrlc` crate and flip
    // this flag from its hook so `stop()` can join the server thread.
    let running = Arc::new(AtomicBool::new(true));
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    println!("\nShutting down...");
    handle.stop();
}

/// Parse command-line arguments into a `RelayConfig`. Uses simple
/// `std::env::args()` matching — no clap dependency.
fn parse_args() -> RelayConfig {
    let mut config = RelayConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                config.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--reset-delay-ms" => {
                i += 1;
                let ms: u64 = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--reset-delay-ms requires a valid number");
                    std::process::exit(1);
                });
                config.reset_delay = Duration::from_millis(ms);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn print_usage() {
    println!("Usage: relay [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --port <PORT>           Listen port (default: 4000)");
    println!("  --reset-delay-ms <MS>   Post-game reset delay (default: 3000)");
    println!("  --help, -h              Show this help");
}
