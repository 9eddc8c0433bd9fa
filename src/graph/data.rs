use super::block::{BlockId, BlockType};
use crate::compiler::{ExpressionTemplate, TargetLanguage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value types carried by connectors and declared by variables and functions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    Int,
    Float,
    String,
    Bool,
    Array(Box<DataType>),
    Any,
    #[default]
    Void,
}

impl DataType {
    /// Whether a value of one type may flow into a socket of the other.
    ///
    /// Void never matches, Any matches every non-Void type and Int and Float
    /// are interchangeable.
    pub fn is_compatible(&self, other: &DataType) -> bool {
        match (self, other) {
            (DataType::Void, _) | (_, DataType::Void) => false,
            (DataType::Any, _) | (_, DataType::Any) => true,
            (DataType::Int, DataType::Float) | (DataType::Float, DataType::Int) => true,
            (DataType::Array(a), DataType::Array(b)) => a.is_compatible(b),
            (a, b) => a == b,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::String => write!(f, "string"),
            DataType::Bool => write!(f, "bool"),
            DataType::Array(inner) => write!(f, "array<{}>", inner),
            DataType::Any => write!(f, "any"),
            DataType::Void => write!(f, "void"),
        }
    }
}

/// A declared function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContainerKind {
    /// The live program.
    Canvas,
    /// The palette of reusable blocks.
    Drawer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JunctionOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

fn float_type() -> DataType {
    DataType::Float
}

fn any_type() -> DataType {
    DataType::Any
}

/// The type-specific payload of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BlockData {
    Function {
        name: String,
        #[serde(default)]
        params: Vec<Parameter>,
        #[serde(default)]
        return_type: DataType,
    },
    FunctionInvoke {
        name: String,
        #[serde(default)]
        params: Vec<Parameter>,
        #[serde(default)]
        return_type: DataType,
        #[serde(skip)]
        declaration: Option<BlockId>,
    },
    Expression {
        #[serde(default)]
        template: Option<ExpressionTemplate>,
        #[serde(default)]
        editable: bool,
        #[serde(default)]
        source: BTreeMap<TargetLanguage, String>,
        /// Result type of an editable expression. Templates carry their own.
        #[serde(default)]
        value_type: DataType,
    },
    Value {
        data_type: DataType,
        #[serde(default)]
        value: String,
    },
    Variable {
        name: String,
        #[serde(default = "any_type")]
        data_type: DataType,
        #[serde(default)]
        mutable: bool,
        #[serde(skip)]
        declaration: Option<BlockId>,
    },
    VarInit {
        name: String,
        data_type: DataType,
        #[serde(default)]
        mutable: bool,
    },
    VarSet,
    Loop,
    Conditional,
    LogicNot,
    LogicJunction {
        op: JunctionOp,
    },
    LogicComparison {
        op: ComparisonOp,
    },
    MathOperation {
        op: MathOp,
        #[serde(default = "float_type")]
        data_type: DataType,
    },
    Comment {
        #[serde(default)]
        text: String,
    },
    Root {
        container: ContainerKind,
    },
}

/// Keywords of either target language.
const RESERVED_WORDS: &[&str] = &[
    "and", "arguments", "as", "assert", "asr", "async", "await", "begin", "break", "case", "catch",
    "class", "const", "constraint", "continue", "debugger", "default", "delete", "do", "done",
    "downto", "else", "end", "enum", "eval", "exception", "export", "extends", "external", "false",
    "finally", "for", "fun", "function", "functor", "if", "implements", "import", "in", "include",
    "inherit", "initializer", "instanceof", "interface", "land", "lazy", "let", "lor", "lsl", "lsr",
    "lxor", "match", "method", "mod", "module", "mutable", "new", "nonrec", "null", "object", "of",
    "open", "or", "package", "pri", "private", "protected", "pub", "public", "rec", "ref",
    "return", "sig", "static", "struct", "super", "switch", "then", "this", "throw", "to", "true",
    "try", "type", "typeof", "undefined", "val", "var", "virtual", "void", "when", "while", "with",
    "yield",
];

/// Names the generated code and its runtime already bind.
const RUNTIME_NAMES: &[&str] = &[
    "alert", "console", "delay", "ignore", "int_of_string", "markExecuting", "mod_float",
    "parseInt", "resolve", "string_of_int",
];

/// Per-block bindings of the ReasonML output, as in `loop_b3`.
const GENERATED_PREFIXES: &[&str] = &["loop_b", "next_b", "r_b"];

fn is_generated(name: &str) -> bool {
    name.starts_with("__")
        || GENERATED_PREFIXES.iter().any(|prefix| {
            name.strip_prefix(prefix)
                .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        })
}

/// Whether `name` can be emitted verbatim as an identifier in every target.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = match chars.next() {
        Some(c) => c.is_ascii_lowercase() || c == '_',
        None => false,
    };
    valid_start
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_WORDS.contains(&name)
        && !RUNTIME_NAMES.contains(&name)
        && !is_generated(name)
}

impl BlockData {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockData::Function { .. } => BlockType::Function,
            BlockData::FunctionInvoke { .. } => BlockType::FunctionInvoke,
            BlockData::Expression { .. } => BlockType::Expression,
            BlockData::Value { .. } => BlockType::Value,
            BlockData::Variable { .. } => BlockType::Variable,
            BlockData::VarInit { .. } => BlockType::VarInit,
            BlockData::VarSet => BlockType::VarSet,
            BlockData::Loop => BlockType::Loop,
            BlockData::Conditional => BlockType::Conditional,
            BlockData::LogicNot => BlockType::LogicNot,
            BlockData::LogicJunction { .. } => BlockType::LogicJunction,
            BlockData::LogicComparison { .. } => BlockType::LogicComparison,
            BlockData::MathOperation { .. } => BlockType::MathOperation,
            BlockData::Comment { .. } => BlockType::Comment,
            BlockData::Root { .. } => BlockType::Root,
        }
    }

    /// The type of value the block produces when plugged into an input, if any.
    pub fn output_type(&self) -> Option<DataType> {
        match self {
            BlockData::FunctionInvoke { return_type, .. } => Some(return_type.clone()),
            BlockData::Expression {
                template,
                value_type,
                ..
            } => Some(match template {
                Some(template) => template.return_type(),
                None => value_type.clone(),
            }),
            BlockData::Value { data_type, .. } | BlockData::Variable { data_type, .. } => {
                Some(data_type.clone())
            }
            BlockData::LogicNot
            | BlockData::LogicJunction { .. }
            | BlockData::LogicComparison { .. } => Some(DataType::Bool),
            BlockData::MathOperation { data_type, .. } => Some(data_type.clone()),
            _ => None,
        }
    }

    /// Checks the payload is internally consistent.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            BlockData::Function { name, params, .. }
            | BlockData::FunctionInvoke { name, params, .. } => {
                if !is_identifier(name) {
                    return Err(format!("'{}' is not a valid function name", name));
                }
                for param in params {
                    if !is_identifier(&param.name) {
                        return Err(format!("'{}' is not a valid parameter name", param.name));
                    }
                    if param.data_type == DataType::Void {
                        return Err(format!("parameter '{}' cannot be void", param.name));
                    }
                }
                Ok(())
            }
            BlockData::Variable {
                name, data_type, ..
            }
            | BlockData::VarInit {
                name, data_type, ..
            } => {
                if !is_identifier(name) {
                    return Err(format!("'{}' is not a valid variable name", name));
                }
                if *data_type == DataType::Void {
                    return Err(format!("variable '{}' cannot be void", name));
                }
                Ok(())
            }
            BlockData::Expression {
                template, editable, ..
            } => {
                if template.is_none() && !editable {
                    return Err("expression needs a template or editable source".to_string());
                }
                Ok(())
            }
            BlockData::Value { data_type, value } => match data_type {
                DataType::Array(_) if !value.trim().is_empty() => {
                    serde_json::from_str::<Vec<serde_json::Value>>(value)
                        .map(|_| ())
                        .map_err(|e| format!("array literal is not a JSON array: {}", e))
                }
                DataType::Void => Err("a value cannot be void".to_string()),
                _ => Ok(()),
            },
            BlockData::MathOperation { data_type, .. } => {
                if data_type.is_numeric() {
                    Ok(())
                } else {
                    Err(format!("math operations work on numbers, not {}", data_type))
                }
            }
            _ => Ok(()),
        }
    }
}
