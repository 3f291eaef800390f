//! JSON Format
//!
//! Wire JSON as exchanged with the HTTP collaborator. Key order follows the
//! record layout.

use bson::Document;
use kernel::error::contract_error::ContractError;
use kernel::error::decode::DecodeError;

use super::Format;
use super::wire;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat {
    pub pretty: bool,
}

impl JsonFormat {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Format for JsonFormat {
    const NAME: &'static str = "json";

    type Input = str;
    type Output = String;

    fn read(&self, input: &str, _id_field: Option<&str>) -> Result<Document, ContractError> {
        let value: serde_json::Value = serde_json::from_str(input).map_err(DecodeError::from)?;
        Ok(wire::from_json(value)?)
    }

    fn write(&self, doc: Document, _id_field: Option<&str>) -> Result<String, ContractError> {
        let value = wire::to_json(&doc)?;
        let text = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        text.map_err(ContractError::serialization)
    }
}
