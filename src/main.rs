mod config;
mod contract;
mod deployment;
mod indexer;
mod session;
mod transaction;
mod utils;
mod wallet;

#[cfg(test)]
mod test_utils;

use std::process::ExitCode;
use tracing::{error, info};

use crate::config::ClientConfig;
use crate::contract::ContractRegistry;
use crate::session::Session;
use crate::utils::format_token_amount;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	dotenvy::dotenv().ok();

	// Logs go to stderr; stdout belongs to the menu.
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	let config = match ClientConfig::from_env() {
		Ok(config) => config,
		Err(e) => {
			error!("Invalid configuration: {}", e);
			return ExitCode::FAILURE;
		}
	};

	println!("Midnight contract CLI ({})\n", config.contract_name);
	info!("Connecting to Midnight {}...", config.network_id);

	let session = match Session::start(config, &ContractRegistry::with_builtin_contracts()).await {
		Ok(session) => session,
		Err(e) => {
			error!("Failed to start session: {}", e);
			return ExitCode::FAILURE;
		}
	};

	info!(
		"Wallet balance: {} tDUST",
		format_token_amount(
			session.wallet_state().balance,
			transaction::MIDNIGHT_TOKEN_DECIMALS
		)
	);
	println!("Connected to contract {}\n", session.contract_address());

	let stdin = tokio::io::BufReader::new(tokio::io::stdin());
	if let Err(e) = session.run(stdin, tokio::io::stdout()).await {
		error!("Session ended with an error: {}", e);
		return ExitCode::FAILURE;
	}
	ExitCode::SUCCESS
}
