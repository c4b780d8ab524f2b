use bastion_gateway::PaperGateway;
use bastion_runner::{EngineConfig, MarketInput, TradingEngine};
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

fn print_help() {
    eprintln!(
        r#"Bastion - cascade-aware trading engine (paper execution)

USAGE:
    bastion [OPTIONS] < feed.jsonl

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

INPUT:
    One JSON object per line on stdin, tagged by "kind":
    {{"kind":"bar","symbol":"BTC-USD","timestamp":"...","open":"...",...}}
    {{"kind":"liquidation",...}}
    {{"kind":"funding",...}}

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter

EXAMPLES:
    # Replay a feed with the default configuration
    bastion < feed.jsonl

    # Replay with strategies from a config file
    RUST_LOG=info bastion --config bastion.json < feed.jsonl
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            EngineConfig::from_file(&path)?
        }
        None => {
            log::info!("Using default configuration");
            EngineConfig::default()
        }
    };

    // Read the whole feed up front; the first input opens the trading day
    let mut inputs = Vec::new();
    for (n, line) in std::io::stdin().lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match MarketInput::from_json_line(&line) {
            Ok(input) => inputs.push(input),
            Err(e) => log::warn!("Skipping line {}: {}", n + 1, e),
        }
    }
    let Some(start) = inputs.first().map(MarketInput::timestamp) else {
        eprintln!("No market input on stdin");
        return Ok(());
    };

    let gateway = Arc::new(PaperGateway::new(config.paper_fee_rate));
    let capacity = config.channel_capacity;
    let engine = TradingEngine::new(config, gateway, start)?;
    let desk = engine.desk();
    let mut alerts = engine.subscribe_alerts();

    let printer = tokio::spawn(async move {
        loop {
            match alerts.recv().await {
                Ok(alert) => println!("{}", serde_json::to_string(&alert).unwrap_or_default()),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("Alert printer lagged, {} alerts dropped", n)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let (tx, rx) = mpsc::channel(capacity);
    let feeder = tokio::spawn(async move {
        for input in inputs {
            if tx.send(input).await.is_err() {
                break;
            }
        }
    });

    let stats = engine.run(rx).await;
    feeder.await?;

    let account = desk.snapshot().await;
    // Last sender goes with the desk
    drop(desk);
    printer.await?;

    println!(
        "{}",
        serde_json::json!({
            "bars": stats.bars,
            "cascade_events": stats.cascade_events,
            "intents": stats.intents,
            "approved": stats.approved,
            "rejected": stats.rejected,
            "filled": stats.filled,
            "failed": stats.failed,
            "equity": account.equity,
            "balance": account.balance,
            "drawdown": account.drawdown,
            "open_notional": account.open_notional,
        })
    );

    Ok(())
}
