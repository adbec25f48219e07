use ethabi::Token;
use ethers::types::I256;
use serde_json::Value;

/// Strips a single `0x` or `0X` prefix
pub(crate) fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Converts a decoded token to JSON
///
/// Integers become decimal strings so values above 2^53 survive JSON consumers,
/// byte strings and addresses become `0x` prefixed hex.
pub fn token_to_json(token: &Token) -> Value {
    match token {
        Token::Uint(value) => Value::String(value.to_string()),
        Token::Int(value) => Value::String(I256::from_raw(*value).to_string()),
        Token::Address(address) => Value::String(format!("{:?}", address)),
        Token::Bool(value) => Value::Bool(*value),
        Token::String(value) => Value::String(value.clone()),
        // Avoid the default serialization which would be a huge array of numbers
        Token::Bytes(bytes) | Token::FixedBytes(bytes) => {
            Value::String(format!("0x{}", hex::encode(bytes)))
        }
        Token::Array(elements) | Token::FixedArray(elements) | Token::Tuple(elements) => {
            Value::Array(elements.iter().map(token_to_json).collect())
        }
    }
}
