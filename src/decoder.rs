use ethabi::token::Token;
use log::error;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::methods::MethodSpec;
use crate::utils::token_to_json;

pub mod preprocessing;

use preprocessing::{parse_calldata, split_selector};

/// The arguments of one decoded call, in calldata order
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    /// Parameter name and decoded value
    pub arguments: Vec<(String, Token)>,
}

impl DecodedCall {
    /// Value of the argument called `name`
    pub fn get(&self, name: &str) -> Option<&Token> {
        self.arguments
            .iter()
            .find(|(argument, _)| argument == name)
            .map(|(_, token)| token)
    }

    /// JSON object keyed by argument name, with integers rendered as decimal strings
    pub fn to_json(&self) -> Value {
        let fields: Map<String, Value> = self
            .arguments
            .iter()
            .map(|(name, token)| (name.clone(), token_to_json(token)))
            .collect();
        Value::Object(fields)
    }
}

/// Decodes hex encoded calldata against the function of `method`
///
/// The selector has to match the function's selector. Decoded values are paired with the
/// parameter names in order; a count mismatch is not checked.
pub fn decode_call(
    calldata: Option<&str>,
    method: &MethodSpec,
) -> Result<DecodedCall, DecodeError> {
    let calldata = calldata.ok_or(DecodeError::MissingCalldata)?;
    let bytes = parse_calldata(calldata)?;
    let (selector, encoded_arguments) =
        split_selector(&bytes).ok_or(DecodeError::TooShort(bytes.len()))?;

    let expected = method.function.short_signature();
    if selector != expected {
        return Err(DecodeError::SelectorMismatch {
            expected: hex::encode(expected),
            found: hex::encode(selector),
        });
    }

    let tokens = method.function.decode_input(encoded_arguments)?;
    let arguments = method
        .field_names()
        .map(str::to_string)
        .zip(tokens)
        .collect();
    Ok(DecodedCall { arguments })
}

/// Like [`decode_call`], but logs the failure and returns `None`
pub fn decode_method(calldata: Option<&str>, method: &MethodSpec) -> Option<DecodedCall> {
    match decode_call(calldata, method) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            error!("Error decoding {} input: {}", method.function.name, e);
            None
        }
    }
}
