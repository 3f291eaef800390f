//! Contract Error - Unified error type for the data-contract layer
//!
//! Defines [`ContractError`] and the [`ContractResult<T>`] alias. Every
//! operation of the codecs and the compatibility layer returns one of its
//! variants; nothing is logged-and-continued.

use thiserror::Error;

use super::decode::DecodeError;
use super::kind::ErrorKind;
use super::migration::MigrationError;
use super::validation::ValidationError;

/// 契約レイヤーの統一エラー型
///
/// ## Variants
/// * `Validation` - フィールド/不変条件違反（すべてまとめて報告）
/// * `Decode` - 解析不能、または別エンティティの表現
/// * `Migration` - 旧スキーマからの移行失敗
/// * `Serialization` - 出力形式への書き出し失敗
///
/// ## Examples
/// ```rust
/// use kernel::error::contract_error::ContractError;
/// use kernel::error::decode::DecodeError;
///
/// let err: ContractError = DecodeError::schema_mismatch("run", "workflow").into();
/// assert_eq!(err.status_code(), 400);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// 契約レイヤーの結果型エイリアス
pub type ContractResult<T> = Result<T, ContractError>;

impl ContractError {
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContractError::Validation(_) => ErrorKind::UnprocessableEntity,
            ContractError::Decode(_) => ErrorKind::BadRequest,
            ContractError::Migration(MigrationError::UnregisteredEntity(_)) => {
                ErrorKind::InternalServerError
            }
            ContractError::Migration(_) => ErrorKind::Conflict,
            ContractError::Serialization(_) => ErrorKind::InternalServerError,
        }
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ContractError::Validation(e) => Some(e),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            ContractError::Serialization(msg) => {
                tracing::error!(message = %msg, "Contract serialization error");
            }
            ContractError::Migration(MigrationError::UnregisteredEntity(entity)) => {
                tracing::error!(entity_type = %entity, "Entity type missing from migration registry");
            }
            ContractError::Migration(e) => {
                tracing::warn!(error = %e, "Stored record could not be migrated");
            }
            ContractError::Decode(e) => {
                tracing::debug!(error = %e, "Contract decode error");
            }
            ContractError::Validation(e) => {
                tracing::debug!(violations = e.violations().len(), error = %e, "Contract validation error");
            }
        }
    }

    /// RFC 7807 Problem Details body, with the violation list for validation
    /// failures so a collaborator can surface field paths verbatim.
    pub fn to_problem_details(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.to_string(),
        });
        if let (ContractError::Validation(e), Some(map)) = (self, body.as_object_mut()) {
            map.insert(
                "violations".to_string(),
                serde_json::to_value(e.violations()).unwrap_or_default(),
            );
        }
        body
    }
}
