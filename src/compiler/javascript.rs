use super::base::{HoistedCall, Literal, TargetSyntax, indent_lines, lines, quote};
use super::templates::TargetLanguage;
use crate::graph::{BlockId, ComparisonOp, DataType, JunctionOp, MathOp, Parameter};
use itertools::Itertools;

/// Emits `async`/`await` JavaScript. The runner passes the execution marker
/// and the delay as the `__markExecuting` and `__delay` arguments.
pub struct JavaScript {
    indent: String,
}

impl JavaScript {
    pub fn new(indent: &str) -> Self {
        Self {
            indent: indent.to_string(),
        }
    }

    fn marker(&self, id: BlockId) -> String {
        format!("__markExecuting({});\nawait __delay();", quote(&id.to_string()))
    }

    fn block(&self, head: &str, body: &str) -> String {
        if body.is_empty() {
            format!("{} {{\n}}", head)
        } else {
            format!("{} {{\n{}\n}}", head, indent_lines(body, &self.indent))
        }
    }
}

impl TargetSyntax for JavaScript {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::JavaScript
    }

    fn prelude(&self) -> String {
        String::new()
    }

    fn program(&self, functions: Vec<String>) -> String {
        let mut parts = vec![self.prelude()];
        parts.extend(functions);
        parts.into_iter().filter(|p| !p.is_empty()).join("\n\n")
    }

    fn function(&self, name: &str, params: &[Parameter], body: String, ret: Option<String>) -> String {
        let head = format!(
            "async function {}({})",
            name,
            params.iter().map(|p| p.name.as_str()).join(", ")
        );
        let body = lines([body, ret.map(|r| format!("return {};", r)).unwrap_or_default()]);
        self.block(&head, &body)
    }

    fn function_resolve(&self, _ret: Option<String>, _hoisted: Vec<HoistedCall>) -> Option<String> {
        None
    }

    fn sequence(&self, id: BlockId, statement: String, _hoisted: Vec<HoistedCall>, rest: Option<String>) -> String {
        lines([self.marker(id), statement, rest.unwrap_or_default()])
    }

    fn invoke_statement(
        &self,
        id: BlockId,
        name: &str,
        args: Vec<String>,
        hoisted: Vec<HoistedCall>,
        rest: Option<String>,
    ) -> String {
        let statement = format!("await {}({});", name, args.join(", "));
        self.sequence(id, statement, hoisted, rest)
    }

    fn invoke_value(&self, _id: BlockId, name: &str, args: Vec<String>, _hoisted: &mut Vec<HoistedCall>) -> String {
        format!("(await {}({}))", name, args.join(", "))
    }

    fn loop_resolve(&self, _id: BlockId) -> Option<String> {
        None
    }

    fn loop_statement(
        &self,
        id: BlockId,
        condition: String,
        _hoisted: Vec<HoistedCall>,
        body: String,
        rest: Option<String>,
    ) -> String {
        let body = lines(["await __delay();".to_string(), body]);
        lines([
            self.marker(id),
            self.block(&format!("while ({})", condition), &body),
            rest.unwrap_or_default(),
        ])
    }

    fn conditional_resolve(&self, _id: BlockId) -> Option<String> {
        None
    }

    fn conditional(
        &self,
        id: BlockId,
        condition: String,
        _hoisted: Vec<HoistedCall>,
        if_true: String,
        if_false: String,
        rest: Option<String>,
    ) -> String {
        let mut statement = self.block(&format!("if ({})", condition), &if_true);
        if !if_false.is_empty() {
            statement = self.block(&format!("{} else", statement), &if_false);
        }
        lines([self.marker(id), statement, rest.unwrap_or_default()])
    }

    fn comment(&self, text: &str, rest: Option<String>) -> String {
        let comment = text.lines().map(|line| format!("// {}", line)).join("\n");
        lines([comment, rest.unwrap_or_default()])
    }

    fn expression_statement(&self, expression: String, _value_type: &DataType) -> String {
        format!("{};", expression)
    }

    fn declare(&self, name: &str, mutable: bool, init: String) -> String {
        let keyword = if mutable { "let" } else { "const" };
        format!("{} {} = {};", keyword, name, init)
    }

    fn assign(&self, name: &str, value: String) -> String {
        format!("{} = {};", name, value)
    }

    fn read(&self, name: &str, _mutable: bool) -> String {
        name.to_string()
    }

    fn literal(&self, literal: Literal) -> String {
        match literal {
            Literal::Int(i) => i.to_string(),
            Literal::Float(f) => format!("{:?}", f),
            Literal::Str(s) => quote(&s),
            Literal::Bool(b) => b.to_string(),
            Literal::Array(items) => format!("[{}]", items.join(", ")),
            Literal::Unit => "undefined".to_string(),
        }
    }

    fn default_value(&self, data_type: &DataType) -> String {
        match data_type {
            DataType::Int => "0",
            DataType::Float => "0.0",
            DataType::String => "\"\"",
            DataType::Bool => "false",
            DataType::Array(_) => "[]",
            DataType::Any | DataType::Void => "undefined",
        }
        .to_string()
    }

    fn not(&self, value: String) -> String {
        format!("(!{})", value)
    }

    fn junction(&self, op: JunctionOp, left: String, right: String) -> String {
        let symbol = match op {
            JunctionOp::And => "&&",
            JunctionOp::Or => "||",
        };
        format!("({} {} {})", left, symbol, right)
    }

    fn comparison(&self, op: ComparisonOp, left: String, right: String) -> String {
        let symbol = match op {
            ComparisonOp::Equal => "===",
            ComparisonOp::NotEqual => "!==",
            ComparisonOp::Less => "<",
            ComparisonOp::LessOrEqual => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterOrEqual => ">=",
        };
        format!("({} {} {})", left, symbol, right)
    }

    fn math(&self, op: MathOp, data_type: &DataType, left: String, right: String) -> String {
        match (op, data_type) {
            (MathOp::Divide, DataType::Int) => format!("Math.trunc({} / {})", left, right),
            _ => {
                let symbol = match op {
                    MathOp::Add => "+",
                    MathOp::Subtract => "-",
                    MathOp::Multiply => "*",
                    MathOp::Divide => "/",
                    MathOp::Modulo => "%",
                };
                format!("({} {} {})", left, symbol, right)
            }
        }
    }
}
