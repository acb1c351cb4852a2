//! Deployment descriptor written when the contract was deployed.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeploymentError {
	#[error("No deployment file found at {0}. Deploy the contract first.")]
	NotFound(PathBuf),

	#[error("Failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Malformed deployment file: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Deployment file has no contractAddress")]
	MissingAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
	pub contract_address: String,
	pub contract_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeployment {
	contract_address: Option<String>,
	contract_name: Option<String>,
}

impl Deployment {
	pub fn load(path: impl AsRef<Path>) -> Result<Self, DeploymentError> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path).map_err(|source| {
			if source.kind() == std::io::ErrorKind::NotFound {
				DeploymentError::NotFound(path.to_path_buf())
			} else {
				DeploymentError::Io {
					path: path.to_path_buf(),
					source,
				}
			}
		})?;
		Self::parse(&contents)
	}

	pub fn parse(contents: &str) -> Result<Self, DeploymentError> {
		let raw: RawDeployment = serde_json::from_str(contents)?;
		let contract_address = raw
			.contract_address
			.filter(|address| !address.trim().is_empty())
			.ok_or(DeploymentError::MissingAddress)?;
		Ok(Self {
			contract_address,
			contract_name: raw.contract_name.filter(|name| !name.trim().is_empty()),
		})
	}

	/// Contract name from the descriptor, falling back to `configured`.
	pub fn contract_name_or<'a>(&'a self, configured: &'a str) -> &'a str {
		self.contract_name.as_deref().unwrap_or(configured)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn loads_descriptor_from_disk() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"{{"contractAddress":"0200abcd","contractName":"health","deployedAt":"2025-01-01"}}"#
		)
		.unwrap();

		let deployment = Deployment::load(file.path()).unwrap();
		assert_eq!(deployment.contract_address, "0200abcd");
		assert_eq!(deployment.contract_name_or("other"), "health");
	}

	#[test]
	fn name_falls_back_to_configuration() {
		let deployment = Deployment::parse(r#"{"contractAddress":"0200abcd"}"#).unwrap();
		assert_eq!(deployment.contract_name_or("health"), "health");
	}

	#[test]
	fn missing_file_and_missing_address_are_distinct_errors() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(
			Deployment::load(dir.path().join("deployment.json")),
			Err(DeploymentError::NotFound(_))
		));
		assert!(matches!(
			Deployment::parse(r#"{"contractName":"health"}"#),
			Err(DeploymentError::MissingAddress)
		));
		assert!(matches!(
			Deployment::parse("not json"),
			Err(DeploymentError::Json(_))
		));
	}
}
