use crate::utils::strip_hex_prefix;

// Accepts calldata with or without the 0x prefix
pub fn parse_calldata(calldata: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_hex_prefix(calldata))
}

pub fn split_selector(calldata: &[u8]) -> Option<([u8; 4], &[u8])> {
    if calldata.len() < 4 {
        return None;
    }
    let (selector, arguments) = calldata.split_at(4);
    Some((selector.try_into().ok()?, arguments))
}
