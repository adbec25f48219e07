use ethabi::param_type::{ParamType, Reader, Writer};
use ethabi::{Function, Param, StateMutability};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::MethodTableError;

const BUILTIN_METHODS: &str = include_str!("../methods.json");

#[derive(Debug, Clone, Deserialize)]
struct MethodEntry {
    method: String,
    function: String,
    params: Vec<ParamEntry>,
    directory: String,
    file_stem: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ParamEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

/// A recognized contract method: how to decode it and where its output goes
#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// Label as it appears in the `Method` column of the CSV export
    pub label: String,
    /// Function the calldata is decoded against
    pub function: Function,
    /// Directory (relative to the output root) the decoded files are written to
    pub directory: String,
    /// Filename prefix, followed by `_<counter>` or `_<tx hash>`
    pub file_stem: String,
}

impl MethodSpec {
    /// Output field names, in calldata order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.function.inputs.iter().map(|param| param.name.as_str())
    }

    fn from_entry(entry: MethodEntry) -> Result<Self, MethodTableError> {
        let inputs = entry
            .params
            .into_iter()
            .map(|param| {
                let kind = read_param_type(&param.kind).map_err(|reason| {
                    MethodTableError::InvalidParamType {
                        method: entry.method.clone(),
                        param: param.name.clone(),
                        kind: param.kind.clone(),
                        reason,
                    }
                })?;
                Ok(Param {
                    name: param.name,
                    kind,
                    internal_type: None,
                })
            })
            .collect::<Result<Vec<_>, MethodTableError>>()?;

        #[allow(deprecated)]
        let function = Function {
            name: entry.function,
            inputs,
            outputs: Vec::new(),
            constant: None,
            state_mutability: StateMutability::NonPayable,
        };

        Ok(MethodSpec {
            label: entry.method,
            function,
            directory: entry.directory,
            file_stem: entry.file_stem,
        })
    }
}

/// Parses a canonical Solidity type name, `uint` and `int` standing for their 256 bit forms
///
/// `Reader` maps any name it does not know to `uint8` (Solidity enums), so the parsed type
/// is written back and has to match the input.
fn read_param_type(name: &str) -> Result<ParamType, String> {
    let kind = Reader::read(name).map_err(|e| e.to_string())?;
    if Writer::write(&kind) != expand_int_aliases(name) {
        return Err("unknown type".to_string());
    }
    if !has_valid_sizes(&kind) {
        return Err("unsupported size".to_string());
    }
    Ok(kind)
}

fn expand_int_aliases(name: &str) -> String {
    let mut expanded = String::with_capacity(name.len());
    let mut start = 0;
    for (i, c) in name.char_indices() {
        if matches!(c, '[' | ']' | '(' | ')' | ',') {
            push_type_word(&mut expanded, &name[start..i]);
            expanded.push(c);
            start = i + 1;
        }
    }
    push_type_word(&mut expanded, &name[start..]);
    expanded
}

fn push_type_word(out: &mut String, word: &str) {
    match word {
        "uint" => out.push_str("uint256"),
        "int" => out.push_str("int256"),
        word => out.push_str(word),
    }
}

fn has_valid_sizes(kind: &ParamType) -> bool {
    match kind {
        ParamType::Uint(bits) | ParamType::Int(bits) => (8..=256).contains(bits) && bits % 8 == 0,
        ParamType::FixedBytes(len) => (1..=32).contains(len),
        ParamType::Array(inner) | ParamType::FixedArray(inner, _) => has_valid_sizes(inner),
        ParamType::Tuple(members) => members.iter().all(has_valid_sizes),
        ParamType::Address | ParamType::Bytes | ParamType::Bool | ParamType::String => true,
    }
}

/// Lookup table from CSV method label to [`MethodSpec`]
#[derive(Debug, Clone)]
pub struct MethodTable {
    methods: Vec<MethodSpec>,
}

impl MethodTable {
    /// The four proof-verification methods shipped with the crate
    pub fn builtin() -> Result<Self, MethodTableError> {
        Self::from_json(BUILTIN_METHODS)
    }

    /// Loads a JSON method table from `path`
    pub fn from_path(path: &Path) -> Result<Self, MethodTableError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Parses a JSON array of method entries, rejecting duplicate labels and invalid types
    pub fn from_json(json: &str) -> Result<Self, MethodTableError> {
        let entries: Vec<MethodEntry> = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        let mut methods = Vec::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert(entry.method.clone()) {
                return Err(MethodTableError::DuplicateMethod(entry.method));
            }
            methods.push(MethodSpec::from_entry(entry)?);
        }
        Ok(MethodTable { methods })
    }

    /// Method whose label equals `label` exactly
    pub fn get(&self, label: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|spec| spec.label == label)
    }

    /// Methods in table order
    pub fn iter(&self) -> impl Iterator<Item = &MethodSpec> {
        self.methods.iter()
    }

    /// Number of methods
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the table has no methods
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
