use crate::graph::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A target language the compiler can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetLanguage {
    JavaScript,
    #[serde(alias = "reason")]
    ReasonML,
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetLanguage::JavaScript => write!(f, "JavaScript"),
            TargetLanguage::ReasonML => write!(f, "ReasonML"),
        }
    }
}

/// The closed set of built-in expression templates.
///
/// Template text uses `{{n}}` for the n-th compiled input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpressionTemplate {
    Println,
    StringConcat,
    StringLength,
    IntToString,
    ParseInt,
    ArrayLength,
    ArrayGet,
    ArrayPush,
    RandomInt,
    /// Browser-only; there is no ReasonML form.
    Alert,
}

impl ExpressionTemplate {
    pub fn input_types(&self) -> Vec<DataType> {
        let any_array = || DataType::Array(Box::new(DataType::Any));
        match self {
            ExpressionTemplate::Println | ExpressionTemplate::Alert => vec![DataType::String],
            ExpressionTemplate::StringConcat => vec![DataType::String, DataType::String],
            ExpressionTemplate::StringLength | ExpressionTemplate::ParseInt => vec![DataType::String],
            ExpressionTemplate::IntToString | ExpressionTemplate::RandomInt => vec![DataType::Int],
            ExpressionTemplate::ArrayLength => vec![any_array()],
            ExpressionTemplate::ArrayGet => vec![any_array(), DataType::Int],
            ExpressionTemplate::ArrayPush => vec![any_array(), DataType::Any],
        }
    }

    pub fn return_type(&self) -> DataType {
        match self {
            ExpressionTemplate::Println | ExpressionTemplate::Alert | ExpressionTemplate::ArrayPush => {
                DataType::Void
            }
            ExpressionTemplate::StringConcat | ExpressionTemplate::IntToString => DataType::String,
            ExpressionTemplate::StringLength
            | ExpressionTemplate::ParseInt
            | ExpressionTemplate::ArrayLength
            | ExpressionTemplate::RandomInt => DataType::Int,
            ExpressionTemplate::ArrayGet => DataType::Any,
        }
    }

    /// The template text for `target`, or `None` if the template has no form
    /// in that language.
    pub fn template(&self, target: TargetLanguage) -> Option<&'static str> {
        use ExpressionTemplate::*;
        use TargetLanguage::*;
        let text = match (self, target) {
            (Println, JavaScript) => "console.log({{0}})",
            (Println, ReasonML) => "Js.log({{0}})",
            (StringConcat, JavaScript) => "({{0}} + {{1}})",
            (StringConcat, ReasonML) => "{{0}} ++ {{1}}",
            (StringLength, JavaScript) => "{{0}}.length",
            (StringLength, ReasonML) => "String.length({{0}})",
            (IntToString, JavaScript) => "String({{0}})",
            (IntToString, ReasonML) => "string_of_int({{0}})",
            (ParseInt, JavaScript) => "parseInt({{0}}, 10)",
            (ParseInt, ReasonML) => "int_of_string({{0}})",
            (ArrayLength, JavaScript) => "{{0}}.length",
            (ArrayLength, ReasonML) => "Array.length({{0}})",
            (ArrayGet, JavaScript) => "{{0}}[{{1}}]",
            (ArrayGet, ReasonML) => "{{0}}[{{1}}]",
            (ArrayPush, JavaScript) => "{{0}}.push({{1}})",
            (ArrayPush, ReasonML) => "Js.Array.push({{1}}, {{0}}) |> ignore",
            (RandomInt, JavaScript) => "Math.floor(Math.random() * {{0}})",
            (RandomInt, ReasonML) => "Random.int({{0}})",
            (Alert, JavaScript) => "alert({{0}})",
            (Alert, ReasonML) => return None,
        };
        Some(text)
    }
}

/// Substitutes `{{n}}` placeholders with the matching entry of `inputs`.
pub fn render(template: &str, inputs: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        match after[..end].trim().parse::<usize>() {
            Ok(index) if index < inputs.len() => out.push_str(&inputs[index]),
            _ => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

