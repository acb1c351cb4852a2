//! One run of the client: startup sequencing, the menu loop and shutdown.

pub mod menu;

use crate::config::{ClientConfig, ConfigError};
use crate::contract::{ContractError, ContractRegistry, DeployedContract, ReadError};
use crate::deployment::{Deployment, DeploymentError};
use crate::indexer::{IndexerError, MidnightIndexerClient};
use crate::transaction::builder::TransactionError;
use crate::transaction::generator::midnight::{RemoteProofServer, Sender, SubmissionError};
use crate::transaction::types::NetworkIds;
use crate::wallet::{
	MidnightWallet, WalletBuildError, WalletProvider, WalletState, WalletSyncError,
	await_sync_within,
};
use menu::Menu;

use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info, warn};

/// Errors that end the session before the menu starts.
#[derive(Error, Debug)]
pub enum StartupError {
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Deployment(#[from] DeploymentError),

	#[error(transparent)]
	Contract(#[from] ContractError),

	#[error("Failed to build wallet: {0}")]
	Wallet(#[from] WalletBuildError),

	#[error("Wallet sync failed: {0}")]
	WalletSync(#[from] WalletSyncError),

	#[error("Indexer error: {0}")]
	Indexer(#[from] IndexerError),

	#[error("Failed to connect to node: {0}")]
	Node(#[from] subxt::Error),

	#[error("Failed to create HTTP client: {0}")]
	Http(#[from] reqwest::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

/// Errors of a single menu operation. The menu reports them and carries on.
#[derive(Error, Debug)]
pub enum OperationError {
	#[error(transparent)]
	Transaction(#[from] TransactionError),

	#[error(transparent)]
	Submission(#[from] SubmissionError),

	#[error(transparent)]
	Read(#[from] ReadError),

	#[error(transparent)]
	Contract(#[from] ContractError),

	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("Another operation is still in flight")]
	OperationInFlight,
}

pub struct Session {
	provider: Arc<WalletProvider>,
	contract: DeployedContract,
	wallet_state: WalletState,
}

impl Session {
	/// Connects every collaborator, waits for the wallet to sync and binds the contract.
	///
	/// The deployment descriptor and contract name are checked before anything touches the
	/// network.
	pub async fn start(
		config: ClientConfig,
		registry: &ContractRegistry,
	) -> Result<Self, StartupError> {
		let deployment = Deployment::load(&config.deployment_file)?;
		let contract_name = deployment.contract_name_or(&config.contract_name);
		let binding = registry.resolve(contract_name)?;
		info!(
			"Using {} contract at {}",
			binding.name(),
			deployment.contract_address
		);

		let network_id = config.network_id;
		let indexer = MidnightIndexerClient::new(
			config.network.indexer_url.clone(),
			config.network.indexer_ws_url.clone(),
		)?;
		let prover = RemoteProofServer::new(config.network.proof_server_url.clone(), network_id)?
			.with_max_elapsed(config.proof_server_max_elapsed);
		let sender = Sender::connect(network_id, &config.network.node_url).await?;

		let wallet = MidnightWallet::builder()
			.with_seed(config.wallet_seed.clone())
			.with_network_ids(NetworkIds::uniform(network_id))
			.with_proof_provider(Box::new(prover))
			.with_submitter(Box::new(sender))
			.with_indexer(indexer.clone())
			.build()?;
		let provider = Arc::new(WalletProvider::new(wallet, NetworkIds::uniform(network_id)));

		info!("Waiting for wallet to sync...");
		let synced = match provider.state().await {
			Ok(states) => await_sync_within(states, config.sync_timeout).await,
			Err(e) => Err(e),
		};
		let wallet_state = match synced {
			Ok(state) => state,
			Err(e) => {
				close_quietly(&provider).await;
				return Err(e.into());
			}
		};
		debug!(
			"Wallet keys: {:?}, {:?}",
			provider.coin_public_key(),
			provider.encryption_public_key()
		);

		let contract = match DeployedContract::find(
			&deployment.contract_address,
			binding,
			provider.clone(),
			Arc::new(indexer),
			config.secret_key,
		)
		.await
		{
			Ok(contract) => contract,
			Err(e) => {
				close_quietly(&provider).await;
				return Err(e.into());
			}
		};

		Ok(Self {
			provider,
			contract,
			wallet_state,
		})
	}

	pub fn wallet_state(&self) -> &WalletState {
		&self.wallet_state
	}

	pub fn contract_address(&self) -> &str {
		self.contract.address()
	}

	/// Runs the menu until the user exits, then releases the wallet.
	pub async fn run<R, W>(self, input: R, output: W) -> Result<(), StartupError>
	where
		R: AsyncBufRead + Unpin,
		W: AsyncWrite + Unpin,
	{
		let result = Menu::new(input, output).run(&self.contract).await;
		close_quietly(&self.provider).await;
		Ok(result?)
	}
}

async fn close_quietly(provider: &WalletProvider) {
	if let Err(e) = provider.close().await {
		warn!("Failed to close wallet: {}", e);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const SEED: &str = "2e347e236daa04faad881f1dc5dc3b8a9b4e8e4429e9d0728aad78ada199b66b";

	/// Endpoints point at a closed port so any network access would fail loudly.
	fn config_with_deployment(contents: Option<&str>) -> (ClientConfig, tempfile::TempDir) {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("deployment.json");
		if let Some(contents) = contents {
			let mut file = std::fs::File::create(&path).unwrap();
			file.write_all(contents.as_bytes()).unwrap();
		}
		let path = path.to_string_lossy().to_string();

		let config = ClientConfig::from_lookup(|name| match name {
			"WALLET_SEED" => Some(SEED.to_string()),
			"NETWORK_ID" => Some("undeployed".to_string()),
			"NODE_URL" => Some("ws://127.0.0.1:1".to_string()),
			"INDEXER_URL" => Some("http://127.0.0.1:1/api/v1/graphql".to_string()),
			"INDEXER_WS_URL" => Some("ws://127.0.0.1:1/api/v1/graphql/ws".to_string()),
			"PROOF_SERVER_URL" => Some("http://127.0.0.1:1".to_string()),
			"DEPLOYMENT_FILE" => Some(path.clone()),
			_ => None,
		})
		.unwrap();
		(config, dir)
	}

	#[tokio::test]
	async fn missing_deployment_file_is_fatal() {
		let (config, _dir) = config_with_deployment(None);
		let err = Session::start(config, &ContractRegistry::with_builtin_contracts())
			.await
			.err();
		assert!(matches!(
			err,
			Some(StartupError::Deployment(DeploymentError::NotFound(_)))
		));
	}

	#[tokio::test]
	async fn descriptor_without_address_is_fatal() {
		let (config, _dir) = config_with_deployment(Some(r#"{"contractName":"health"}"#));
		let err = Session::start(config, &ContractRegistry::with_builtin_contracts())
			.await
			.err();
		assert!(matches!(
			err,
			Some(StartupError::Deployment(DeploymentError::MissingAddress))
		));
	}

	#[tokio::test]
	async fn unknown_contract_is_fatal() {
		let (config, _dir) =
			config_with_deployment(Some(r#"{"contractAddress":"0200aa","contractName":"voting"}"#));
		let err = Session::start(config, &ContractRegistry::with_builtin_contracts())
			.await
			.err();
		assert!(matches!(
			err,
			Some(StartupError::Contract(ContractError::UnknownContract(name))) if name == "voting"
		));
	}

	#[tokio::test]
	async fn unreachable_node_is_fatal() {
		let (config, _dir) = config_with_deployment(Some(r#"{"contractAddress":"0200aa"}"#));
		let err = Session::start(config, &ContractRegistry::with_builtin_contracts())
			.await
			.err();
		assert!(matches!(err, Some(StartupError::Node(_))));
	}
}
