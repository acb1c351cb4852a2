//! Interactive menu driving a deployed contract.
//!
//! [`MenuState`] holds the transitions; [`Menu`] does the line I/O around them.

use super::OperationError;
use crate::contract::LedgerView;
use crate::transaction::types::SubmissionReceipt;

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

const INVALID_CHOICE: &str = "Invalid choice. Please enter 1, 2, 3, 4, or 5.";

/// What a deployed contract offers the menu.
#[async_trait]
pub trait ContractActions: Send + Sync {
	async fn submit_proof(
		&self,
		activity_value: u32,
		heart_rate_value: u32,
	) -> Result<SubmissionReceipt, OperationError>;

	/// Freshly read public state, `None` if the contract has none yet.
	async fn read_ledger(&self) -> Result<Option<LedgerView>, OperationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	SubmitProof,
	ReadActivity,
	ReadHeartRate,
	ReadGoals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
	Run(Command),
	Exit,
	Invalid,
}

impl Choice {
	pub fn parse(input: &str) -> Self {
		match input.trim() {
			"1" => Choice::Run(Command::SubmitProof),
			"2" => Choice::Run(Command::ReadActivity),
			"3" => Choice::Run(Command::ReadHeartRate),
			"4" => Choice::Run(Command::ReadGoals),
			"5" => Choice::Exit,
			_ => Choice::Invalid,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
	AwaitingChoice,
	Dispatching(Command),
	Exited,
}

impl MenuState {
	pub fn on_choice(self, choice: Choice) -> Self {
		match (self, choice) {
			(MenuState::AwaitingChoice, Choice::Run(command)) => MenuState::Dispatching(command),
			(MenuState::AwaitingChoice, Choice::Exit) => MenuState::Exited,
			(MenuState::AwaitingChoice, Choice::Invalid) => MenuState::AwaitingChoice,
			(state, _) => state,
		}
	}

	/// The dispatched command finished, successfully or not.
	pub fn on_complete(self) -> Self {
		match self {
			MenuState::Dispatching(_) => MenuState::AwaitingChoice,
			state => state,
		}
	}

	pub fn is_exited(self) -> bool {
		self == MenuState::Exited
	}
}

pub struct Menu<R, W> {
	input: R,
	output: W,
}

impl<R, W> Menu<R, W>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	pub fn new(input: R, output: W) -> Self {
		Self { input, output }
	}

	/// Runs until the user exits or input ends. Only I/O errors end the loop early.
	pub async fn run(&mut self, contract: &dyn ContractActions) -> io::Result<()> {
		let mut state = MenuState::AwaitingChoice;
		while !state.is_exited() {
			self.print_menu().await?;
			let choice = match self.prompt("\nYour choice: ").await? {
				Some(line) => Choice::parse(&line),
				None => Choice::Exit,
			};

			state = state.on_choice(choice);
			match state {
				MenuState::Dispatching(command) => {
					self.dispatch(command, contract).await?;
					state = state.on_complete();
				}
				MenuState::Exited => self.write_line("\nGoodbye!").await?,
				MenuState::AwaitingChoice => self.write_line(&format!("{}\n", INVALID_CHOICE)).await?,
			}
		}
		Ok(())
	}

	async fn print_menu(&mut self) -> io::Result<()> {
		self.write_line(
			"--- Menu ---\n\
			 1. Submit proof\n\
			 2. Read activity sum\n\
			 3. Read heart rate sum\n\
			 4. Read goal count\n\
			 5. Exit",
		)
		.await
	}

	async fn dispatch(&mut self, command: Command, contract: &dyn ContractActions) -> io::Result<()> {
		match command {
			Command::SubmitProof => {
				self.write_line("\nSubmitting proof...").await?;
				let activity = self.prompt("Enter activity value (uint32): ").await?;
				let heart_rate = self.prompt("Enter heart rate value (uint32): ").await?;

				let result = match (
					parse_u32("activity value", activity),
					parse_u32("heart rate value", heart_rate),
				) {
					(Ok(activity), Ok(heart_rate)) => contract.submit_proof(activity, heart_rate).await,
					(Err(e), _) | (_, Err(e)) => Err(e),
				};

				match result {
					Ok(receipt) => {
						self.write_line(&format!(
							"Success!\nTx ID: {}\nBlock height: {}\n",
							receipt.tx_id, receipt.block_height
						))
						.await
					}
					Err(e) => self.report("submit proof", &e).await,
				}
			}
			Command::ReadActivity => {
				self.read_field(contract, "activity sum", |view| view.activity_sum).await
			}
			Command::ReadHeartRate => {
				self.read_field(contract, "heart rate sum", |view| view.heart_rate_sum)
					.await
			}
			Command::ReadGoals => {
				self.read_field(contract, "goal count", |view| view.goal_count).await
			}
		}
	}

	async fn read_field(
		&mut self,
		contract: &dyn ContractActions,
		label: &str,
		field: fn(&LedgerView) -> u64,
	) -> io::Result<()> {
		self.write_line(&format!("\nReading {}...", label)).await?;
		match contract.read_ledger().await {
			Ok(Some(view)) => {
				self.write_line(&format!("{}: {}\n", capitalize(label), field(&view)))
					.await
			}
			Ok(None) => self.write_line("No state found\n").await,
			Err(e) => self.report(&format!("read {}", label), &e).await,
		}
	}

	async fn report(&mut self, action: &str, error: &OperationError) -> io::Result<()> {
		warn!("Failed to {}: {}", action, error);
		self.write_line(&format!("Failed to {}: {}\n", action, error))
			.await
	}

	/// Prints `prompt` and reads one trimmed line; `None` at end of input.
	async fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
		self.output.write_all(prompt.as_bytes()).await?;
		self.output.flush().await?;

		let mut line = String::new();
		if self.input.read_line(&mut line).await? == 0 {
			return Ok(None);
		}
		Ok(Some(line.trim().to_string()))
	}

	async fn write_line(&mut self, text: &str) -> io::Result<()> {
		self.output.write_all(text.as_bytes()).await?;
		self.output.write_all(b"\n").await?;
		self.output.flush().await
	}
}

fn parse_u32(name: &str, input: Option<String>) -> Result<u32, OperationError> {
	let input = input.ok_or_else(|| OperationError::InvalidInput(format!("no {} given", name)))?;
	input.parse().map_err(|_| {
		OperationError::InvalidInput(format!("{} must be an unsigned 32-bit integer, got '{}'", name, input))
	})
}

fn capitalize(label: &str) -> String {
	let mut chars = label.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
