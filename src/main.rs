//! TX Sentinel - pre-signing transaction risk analysis
//!
//! Reads a transaction intent as JSON (the same body `POST
//! /v1/analyze/transaction` accepts) and prints the threat assessment.
//!
//!   tx_sentinel analyze tx.json
//!   cat tx.json | tx_sentinel analyze --report
//!   tx_sentinel check-address 0x...

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tx_sentinel::api::{AddressCheckData, AnalyzeTransactionRequest};
use tx_sentinel::core::classifier::UNKNOWN_PROTOCOL;
use tx_sentinel::{build_collector, EngineConfig, TransactionAnalyzer, TransactionClassifier};

#[derive(Parser)]
#[command(name = "tx_sentinel", version, about = "Pre-signing transaction risk analysis")]
struct Cli {
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a transaction intent read from FILE, or stdin when FILE is `-`
    Analyze {
        #[arg(default_value = "-")]
        file: PathBuf,

        /// Print the full internal report next to the assessment
        #[arg(long)]
        report: bool,

        /// Skip the configured network oracles
        #[arg(long)]
        offline: bool,
    },
    /// Look up the reputation of an address
    CheckAddress { address: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = EngineConfig::from_env();

    match cli.command {
        Command::Analyze {
            file,
            report,
            offline,
        } => {
            let input = read_input(&file)?;
            let request: AnalyzeTransactionRequest =
                serde_json::from_str(&input).wrap_err("Invalid transaction JSON")?;

            let mut analyzer = TransactionAnalyzer::new(&config);
            if !offline {
                analyzer = analyzer.with_collector(build_collector(&config.oracle));
            }

            let result = analyzer
                .analyze_raw(&request.transaction, request.risk_factors)
                .await;
            info!(
                "{} {} scored {}",
                result.risk.level.emoji(),
                result.analysis.tx_type,
                result.risk.score
            );

            let output = if report || request.include_report {
                serde_json::json!({
                    "assessment": result.to_assessment(),
                    "report": result,
                })
            } else {
                serde_json::to_value(result.to_assessment())?
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::CheckAddress { address } => {
            let parsed = Address::from_str(address.trim())
                .map_err(|e| eyre::eyre!("Invalid address '{}': {}", address, e))?;
            let protocol = TransactionClassifier::detect_protocol(&parsed);

            let data = AddressCheckData {
                address: parsed.to_checksum(None),
                reputation: TransactionAnalyzer::new(&config).check_address(&address),
                protocol: (protocol != UNKNOWN_PROTOCOL).then(|| protocol.to_string()),
            };
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }

    Ok(())
}

fn read_input(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .wrap_err("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).wrap_err_with(|| format!("Failed to read {}", file.display()))
    }
}
