//! Error conversions - From implementations for format library errors
//!
//! Parse failures of the text and binary formats become
//! [`DecodeError::Syntax`]; failures while writing become
//! [`ContractError::Serialization`].

use super::contract_error::ContractError;
use super::decode::DecodeError;

// ============================================================================
// serde_json conversions
// ============================================================================

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::syntax("json", err)
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            ContractError::Decode(err.into())
        } else {
            ContractError::serialization(format!("JSON: {err}"))
        }
    }
}

// ============================================================================
// serde_yaml conversions
// ============================================================================

impl From<serde_yaml::Error> for DecodeError {
    fn from(err: serde_yaml::Error) -> Self {
        DecodeError::syntax("yaml", err)
    }
}

// ============================================================================
// bson conversions
// ============================================================================

impl From<bson::de::Error> for DecodeError {
    fn from(err: bson::de::Error) -> Self {
        DecodeError::syntax("bson", err)
    }
}

impl From<bson::ser::Error> for ContractError {
    fn from(err: bson::ser::Error) -> Self {
        ContractError::serialization(format!("BSON: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_syntax_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: ContractError = json_err.into();
        assert!(matches!(
            err,
            ContractError::Decode(DecodeError::Syntax { format: "json", .. })
        ));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<serde_json::Value>("a: [1, 2").unwrap_err();
        let err: DecodeError = yaml_err.into();
        assert!(matches!(err, DecodeError::Syntax { format: "yaml", .. }));
    }

    #[test]
    fn test_bson_error_conversion() {
        let bytes: &[u8] = &[1, 2, 3];
        let bson_err = bson::Document::from_reader(bytes).unwrap_err();
        let err: DecodeError = bson_err.into();
        assert!(matches!(err, DecodeError::Syntax { format: "bson", .. }));
    }
}
