//! Extract proof verification calldata from a transaction export
//!
//! This crate reads a CSV export of transactions (columns `Method` and `Transaction Hash`),
//! looks up the calldata of every call to one of the known fact registry methods
//! (`verifyMerkle`, `verifyFRI`, `registerContinuousMemoryPage`, `verifyProofAndRegister`),
//! decodes it against the method's signature and writes the named arguments as JSON, one file
//! per call. Integers are written as decimal strings so that 256 bit values survive.
//!
//! ```rust,no_run
//! # use calldata_extractor::{read_records, EtherscanSource, Extractor, FileNaming, MethodTable, OutputLayout};
//! # use std::path::Path;
//! # use std::time::Duration;
//! tokio_test::block_on(async {
//!     let source = EtherscanSource::new(
//!         calldata_extractor::DEFAULT_ETHERSCAN_URL,
//!         std::env::var("ETHERSCAN_API_KEY").unwrap(),
//!         1,
//!         Duration::from_secs(30),
//!     )
//!     .unwrap();
//!     let records = read_records(Path::new("data/transactions.csv")).unwrap();
//!     let mut extractor = Extractor::new(
//!         source,
//!         MethodTable::builtin().unwrap(),
//!         OutputLayout::new("data", FileNaming::Counter),
//!     )
//!     .with_delay(Duration::from_millis(100));
//!     let summary = extractor.run(&records).await.unwrap();
//!     println!("{} files written", summary.written);
//! })
//! ```
#![warn(missing_docs)]
mod decoder;
mod error;
mod methods;
mod pipeline;
mod records;
#[cfg(test)]
mod test_utils;
mod transaction_data;
mod utils;
mod writer;

pub use decoder::{decode_call, decode_method, DecodedCall};
pub use error::{DecodeError, FetchError, MethodTableError};
pub use methods::{MethodSpec, MethodTable};
pub use pipeline::{Extractor, RowOutcome, RunSummary};
pub use records::{read_records, read_records_from, TransactionRecord};
pub use transaction_data::{
    fetch_calldata, parse_proxy_response, parse_tx_hash, with_retry, CalldataSource,
    EtherscanSource, RetryConfig, RpcNodeSource, DEFAULT_ETHERSCAN_URL,
};
pub use utils::token_to_json;
pub use writer::{write_decoded, FileNaming, OutputLayout};
