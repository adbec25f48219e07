use async_trait::async_trait;
use ethabi::{ParamType, Token};
use ethereum_types::{H160, U256};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use crate::error::FetchError;
use crate::methods::{MethodSpec, MethodTable};
use crate::transaction_data::CalldataSource;

macro_rules! parameterize {
        ($test_fn:expr, [$(($name:ident, $input:expr)), * $(,)? ]) => {
            $(
                #[test]
                fn $name() {
                    $test_fn($input);
                }
            )*
        };
    }

pub(crate) use parameterize;

pub fn address_token_from_string(address: &str) -> Token {
    Token::Address(H160::from_str(address).unwrap())
}

pub fn bytes_token_from_string(bytes: &str) -> Token {
    Token::Bytes(hex::decode(bytes).unwrap())
}

pub fn uint(value: u64) -> Token {
    Token::Uint(U256::from(value))
}

pub fn uint_array(values: &[u64]) -> Token {
    Token::Array(values.iter().map(|value| uint(*value)).collect())
}

pub fn builtin_method(label: &str) -> MethodSpec {
    MethodTable::builtin().unwrap().get(label).unwrap().clone()
}

/// `0x` prefixed calldata calling `method` with `arguments`
pub fn encode_call(method: &MethodSpec, arguments: &[Token]) -> String {
    format!(
        "0x{}",
        hex::encode(method.function.encode_input(arguments).unwrap())
    )
}

/// Distinct arguments for every parameter of a `uint256` / `uint256[]` only method
pub fn sample_arguments(method: &MethodSpec) -> Vec<Token> {
    method
        .function
        .inputs
        .iter()
        .enumerate()
        .map(|(i, param)| {
            let i = i as u64;
            match param.kind {
                ParamType::Uint(_) => uint(i + 1),
                ParamType::Array(_) => uint_array(&[10 * i + 1, 10 * i + 2, 10 * i + 3]),
                ref kind => panic!("no sample value for {}", kind),
            }
        })
        .collect()
}

/// In-memory transaction lookup that records every request
#[derive(Default)]
pub struct MockSource {
    responses: HashMap<String, Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn with_calldata(mut self, tx_hash: &str, calldata: String) -> Self {
        self.responses.insert(tx_hash.to_string(), Some(calldata));
        self
    }

    pub fn with_missing(mut self, tx_hash: &str) -> Self {
        self.responses.insert(tx_hash.to_string(), None);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalldataSource for MockSource {
    async fn fetch_input(&self, tx_hash: &str) -> Result<Option<String>, FetchError> {
        self.calls.lock().unwrap().push(tx_hash.to_string());
        match self.responses.get(tx_hash) {
            Some(response) => Ok(response.clone()),
            None => Err(FetchError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
        }
    }
}
