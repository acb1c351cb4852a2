//!
//! GraphQL client for Midnight blockchain indexer with session management.
//!
//! This module provides an async client for interacting with the Midnight GraphQL indexer.
//! It supports wallet session management, the wallet subscription used for syncing, and
//! contract state queries. All methods are async and designed for use with Tokio.

use super::types::*;
use futures_util::{SinkExt, Stream, StreamExt};
use reqwest::Client;
use serde_json::json;
use std::pin::Pin;
use std::time::Duration;
use tokio_tungstenite::{
	MaybeTlsStream, WebSocketStream, connect_async,
	tungstenite::{Message, client::IntoClientRequest},
};
use tracing::{debug, error, info};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Stream of wallet events received over the subscription.
pub type WalletEventStream =
	Pin<Box<dyn Stream<Item = Result<WalletSyncEvent, IndexerError>> + Send>>;

/// Midnight GraphQL indexer client
#[derive(Clone)]
pub struct MidnightIndexerClient {
	/// The underlying HTTP client for GraphQL queries.
	http_client: Client,
	/// The base URL for the indexer GraphQL HTTP endpoint.
	indexer_url: String,
	/// The WebSocket URL for real-time subscriptions.
	ws_url: String,
}

impl MidnightIndexerClient {
	/// Create a new indexer client.
	///
	/// # Arguments
	/// * `indexer_url` - The HTTP endpoint for GraphQL queries.
	/// * `ws_url` - The WebSocket endpoint for subscriptions.
	pub fn new(indexer_url: String, ws_url: String) -> Result<Self, IndexerError> {
		let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;

		Ok(Self {
			http_client,
			indexer_url,
			ws_url,
		})
	}

	/// Establish wallet session with viewing key.
	///
	/// # Returns
	/// The session ID as a string, or an `IndexerError` if the connection fails.
	pub async fn connect_wallet(
		&self,
		viewing_key: &ViewingKeyFormat,
	) -> Result<String, IndexerError> {
		// The viewing key itself is secret material; only its prefix goes to the log.
		info!(
			"Connecting wallet with viewing key {}...",
			viewing_key.as_str().split('1').next().unwrap_or_default()
		);

		let query = r#"
            mutation ConnectWallet($viewingKey: ViewingKey!) {
                connect(viewingKey: $viewingKey)
            }
        "#;

		let variables = json!({
			"viewingKey": viewing_key.as_str()
		});

		let response = self.execute_query(query, Some(variables)).await?;

		let session_id = response
			.get("data")
			.and_then(|data| data.get("connect"))
			.and_then(|connect| connect.as_str())
			.ok_or(IndexerError::NoData)?
			.to_string();

		info!("Connected wallet with session ID: {}", session_id);
		Ok(session_id)
	}

	/// End a wallet session opened with [`Self::connect_wallet`].
	pub async fn disconnect_wallet(&self, session_id: &str) -> Result<(), IndexerError> {
		let query = r#"
            mutation DisconnectWallet($sessionId: HexEncoded!) {
                disconnect(sessionId: $sessionId)
            }
        "#;

		self.execute_query(query, Some(json!({ "sessionId": session_id })))
			.await?;
		debug!("Disconnected wallet session {}", session_id);
		Ok(())
	}

	/// Latest public state of the contract at `address`, or `None` if the indexer has no
	/// action recorded for it.
	pub async fn query_contract_state(
		&self,
		address: &str,
	) -> Result<Option<ContractState>, IndexerError> {
		let query = r#"
            query ContractState($address: HexEncoded!) {
                contractAction(address: $address) {
                    __typename
                    state
                }
            }
        "#;

		let response = self
			.execute_query(query, Some(json!({ "address": address })))
			.await?;
		parse_contract_state(&response)
	}

	/// Subscribe to wallet updates using session ID.
	///
	/// # Arguments
	/// * `session_id` - The wallet session ID.
	/// * `start_index` - Optional starting blockchain index for the subscription.
	/// * `send_progress_updates` - Whether to include progress updates in the stream.
	///
	/// # Errors
	/// Returns `IndexerError` if the WebSocket connection or subscription fails.
	pub async fn subscribe_wallet(
		&self,
		session_id: &str,
		start_index: Option<u64>,
		send_progress_updates: Option<bool>,
	) -> Result<WalletEventStream, IndexerError> {
		let subscription_query = format!(
			r#"
            subscription WalletSync {{
                wallet(sessionId: "{}", index: {}, sendProgressUpdates: {}) {{
                    __typename
                    ... on ViewingUpdate {{
                        index
                        update {{
                            __typename
                            ... on RelevantTransaction {{
                                transaction {{
                                    hash
                                    applyStage
                                    raw
                                    identifiers
                                    merkleTreeRoot
                                    protocolVersion
                                }}
                                start
                                end
                            }}
                            ... on MerkleTreeCollapsedUpdate {{
                                protocolVersion
                                start
                                end
                                update
                            }}
                        }}
                    }}
                    ... on ProgressUpdate {{
                        highestIndex
                        highestRelevantIndex
                        highestRelevantWalletIndex
                    }}
                }}
            }}
            "#,
			session_id,
			start_index.unwrap_or(0),
			send_progress_updates.unwrap_or(true)
		);

		let mut ws_stream = self.open_websocket().await?;

		let start_message = json!({
			"id": "wallet-sync",
			"type": "subscribe",
			"payload": {
				"query": subscription_query
			}
		});
		ws_stream
			.send(Message::Text(start_message.to_string()))
			.await?;

		let stream = wallet_events(ws_stream);
		Ok(Box::pin(stream))
	}

	/// Opens a `graphql-transport-ws` connection and completes the init/ack handshake.
	async fn open_websocket(&self) -> Result<WsStream, IndexerError> {
		debug!("Attempting WebSocket connection to: {}", self.ws_url);

		// Create WebSocket request with required subprotocol
		let mut request = self.ws_url.clone().into_client_request()?;
		request.headers_mut().insert(
			"Sec-WebSocket-Protocol",
			"graphql-transport-ws".parse().map_err(|_| {
				IndexerError::GraphQLError("Invalid WebSocket subprotocol header value".to_string())
			})?,
		);

		let (mut ws_stream, response) = connect_async(request).await?;
		debug!(
			"WebSocket connection established, response status: {}",
			response.status()
		);

		let init_message = json!({
			"type": "connection_init"
		});
		ws_stream
			.send(Message::Text(init_message.to_string()))
			.await?;

		match ws_stream.next().await {
			Some(msg) => match msg? {
				Message::Text(text) => {
					let parsed: serde_json::Value = serde_json::from_str(&text)?;
					if parsed.get("type").and_then(|t| t.as_str()) != Some("connection_ack") {
						return Err(IndexerError::SessionError(
							"Connection not acknowledged".to_string(),
						));
					}
				}
				_ => {
					return Err(IndexerError::SessionError(
						"Unexpected message type during handshake".to_string(),
					));
				}
			},
			None => {
				return Err(IndexerError::SessionError(
					"Connection closed during handshake".to_string(),
				));
			}
		}

		Ok(ws_stream)
	}

	/// Execute a GraphQL query.
	///
	/// # Returns
	/// The JSON response from the indexer, or an `IndexerError` if the request fails.
	pub async fn execute_query(
		&self,
		query: &str,
		variables: Option<serde_json::Value>,
	) -> Result<serde_json::Value, IndexerError> {
		let request_body = json!({
			"query": query,
			"variables": variables
		});

		let response = self
			.http_client
			.post(&self.indexer_url)
			.header("Content-Type", "application/json")
			.json(&request_body)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(IndexerError::GraphQLError(format!(
				"HTTP error: {}",
				response.status()
			)));
		}

		let response_json: serde_json::Value = response.json().await?;

		if let Some(errors) = response_json.get("errors") {
			return Err(IndexerError::GraphQLError(format!(
				"GraphQL errors: {}",
				errors
			)));
		}

		Ok(response_json)
	}
}

/// What one `graphql-transport-ws` frame means for the subscription.
#[derive(Debug)]
enum SubscriptionFrame {
	/// `payload.data.<field>` of a `next` frame, or the error the server reported.
	Data(Result<serde_json::Value, IndexerError>),
	/// Keep-alives and unknown frames.
	Skip,
	/// The server finished the subscription; no further frames belong to it.
	Complete,
}

/// Wallet events from the subscription socket. Ends on `complete` or a close frame,
/// even if the server keeps the connection open.
fn wallet_events<S>(frames: S) -> impl Stream<Item = Result<WalletSyncEvent, IndexerError>> + Send
where
	S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Send,
{
	frames
		.map(|msg| match msg {
			Ok(Message::Text(text)) => parse_subscription_message(&text, "wallet"),
			Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => SubscriptionFrame::Skip,
			Ok(Message::Close(_)) => SubscriptionFrame::Complete,
			Ok(_) => SubscriptionFrame::Data(Err(IndexerError::GraphQLError(
				"Unexpected message type".to_string(),
			))),
			Err(e) => SubscriptionFrame::Data(Err(IndexerError::WebSocketError(e))),
		})
		.take_while(|frame| {
			futures_util::future::ready(!matches!(frame, SubscriptionFrame::Complete))
		})
		.filter_map(|frame| async move {
			let SubscriptionFrame::Data(data) = frame else {
				return None;
			};
			Some(data.and_then(|wallet_data| {
				serde_json::from_value::<WalletSyncEvent>(wallet_data.clone()).map_err(|e| {
					error!("Failed to deserialize wallet event: {}", e);
					debug!("Raw data was: {}", wallet_data);
					IndexerError::JsonError(e)
				})
			}))
		})
}

/// Interprets one `graphql-transport-ws` text frame.
fn parse_subscription_message(text: &str, field: &str) -> SubscriptionFrame {
	let parsed = match serde_json::from_str::<serde_json::Value>(text) {
		Ok(parsed) => parsed,
		Err(e) => return SubscriptionFrame::Data(Err(IndexerError::JsonError(e))),
	};

	let Some(msg_type) = parsed.get("type").and_then(|t| t.as_str()) else {
		return SubscriptionFrame::Data(Err(IndexerError::GraphQLError(
			"Message missing type field".to_string(),
		)));
	};

	match msg_type {
		"next" => SubscriptionFrame::Data(
			parsed
				.get("payload")
				.and_then(|p| p.get("data"))
				.and_then(|d| d.get(field))
				.cloned()
				.ok_or(IndexerError::NoData),
		),
		"error" => {
			let error_msg = parsed
				.get("payload")
				.and_then(|p| p.as_array().and_then(|errors| errors.first()).or(Some(p)))
				.and_then(|p| p.get("message"))
				.and_then(|m| m.as_str())
				.unwrap_or("Unknown subscription error");
			SubscriptionFrame::Data(Err(IndexerError::GraphQLError(error_msg.to_string())))
		}
		"complete" => {
			debug!("Subscription for {} completed", field);
			SubscriptionFrame::Complete
		}
		_ => {
			debug!("Ignoring message type: {}", msg_type);
			SubscriptionFrame::Skip
		}
	}
}

fn parse_contract_state(
	response: &serde_json::Value,
) -> Result<Option<ContractState>, IndexerError> {
	let action = response
		.get("data")
		.ok_or(IndexerError::NoData)?
		.get("contractAction");
	match action {
		None | Some(serde_json::Value::Null) => Ok(None),
		Some(action) => Ok(Some(serde_json::from_value(action.clone())?)),
	}
}

#[async_trait::async_trait]
impl crate::contract::PublicDataProvider for MidnightIndexerClient {
	async fn query_contract_state(
		&self,
		address: &str,
	) -> Result<Option<ContractState>, IndexerError> {
		MidnightIndexerClient::query_contract_state(self, address).await
	}
}
