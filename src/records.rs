use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One row of the transaction export
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionRecord {
    /// Method label, compared exactly against the method table
    #[serde(rename = "Method")]
    pub method: String,
    /// `0x` prefixed transaction hash
    #[serde(rename = "Transaction Hash")]
    pub tx_hash: String,
}

/// Reads every row of the CSV file at `path`, in file order
pub fn read_records(path: &Path) -> Result<Vec<TransactionRecord>, csv::Error> {
    read_records_from(csv::Reader::from_path(path)?)
}

/// Reads every row from an already configured CSV reader, in order
pub fn read_records_from<R: Read>(
    mut reader: csv::Reader<R>,
) -> Result<Vec<TransactionRecord>, csv::Error> {
    reader.deserialize().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Result<Vec<TransactionRecord>, csv::Error> {
        read_records_from(csv::Reader::from_reader(data.as_bytes()))
    }

    #[test]
    fn keeps_row_order_and_ignores_extra_columns() {
        let data = "\
Transaction Hash,Blockno,Method,Value
0xaaa,100,Verify Merkle,0
0xbbb,101,Transfer,1
0xccc,102,Verify FRI,0
";
        let records = parse(data).unwrap();
        assert_eq!(
            records,
            vec![
                TransactionRecord {
                    method: "Verify Merkle".to_string(),
                    tx_hash: "0xaaa".to_string()
                },
                TransactionRecord {
                    method: "Transfer".to_string(),
                    tx_hash: "0xbbb".to_string()
                },
                TransactionRecord {
                    method: "Verify FRI".to_string(),
                    tx_hash: "0xccc".to_string()
                },
            ]
        );
    }

    #[test]
    fn quoted_fields_are_unwrapped() {
        let records = parse("\"Method\",\"Transaction Hash\"\n\"Verify Merkle\",\"0xabc\"\n").unwrap();
        assert_eq!(records[0].method, "Verify Merkle");
        assert_eq!(records[0].tx_hash, "0xabc");
    }

    #[test]
    fn missing_column_is_an_error() {
        assert!(parse("Method,Hash\nVerify Merkle,0xabc\n").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_records(Path::new("does/not/exist.csv")).is_err());
    }
}
