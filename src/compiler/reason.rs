use super::base::{HoistedCall, Literal, TargetSyntax, indent_lines, lines, quote};
use super::templates::TargetLanguage;
use crate::graph::{BlockId, ComparisonOp, DataType, JunctionOp, MathOp, Parameter};
use itertools::Itertools;

const EXTERNALS: &str = "[@bs.val] external markExecuting: string => unit = \"__markExecuting\";\n\
[@bs.val] external delay: (unit => unit) => unit = \"__delay\";";

/// Emits continuation-passing ReasonML.
///
/// Nothing returns: every function takes a trailing `resolve` callback and
/// every statement runs inside the `delay` callback of the one before it.
pub struct ReasonMl {
    indent: String,
}

impl ReasonMl {
    pub fn new(indent: &str) -> Self {
        Self {
            indent: indent.to_string(),
        }
    }

    fn block(&self, head: &str, body: &str) -> String {
        format!("{} {{\n{}\n}}", head, indent_lines(body, &self.indent))
    }

    /// A Reason block must end in an expression.
    fn tail(rest: Option<String>) -> String {
        rest.unwrap_or_else(|| "()".to_string())
    }

    fn call(function: &str, args: &[String], callback: String) -> String {
        let mut all = args.to_vec();
        all.push(callback);
        format!("{}({})", function, all.join(", "))
    }

    /// Nests `inner` inside the callbacks of the lifted calls, first call
    /// outermost.
    fn wrap_hoisted(&self, hoisted: Vec<HoistedCall>, inner: String) -> String {
        hoisted.into_iter().rev().fold(inner, |inner, call| {
            let callback = self.block(&format!("({}) =>", call.binding), &inner);
            Self::call(&call.function, &call.args, callback)
        })
    }

    fn delayed(&self, id: BlockId, body: String) -> String {
        lines([
            format!("markExecuting({});", quote(&id.to_string())),
            format!("{});", self.block("delay(() =>", &body)),
        ])
    }

    fn if_else(&self, condition: &str, if_true: &str, if_false: &str) -> String {
        let head = self.block(&format!("if ({})", condition), if_true);
        self.block(&format!("{} else", head), if_false)
    }
}

impl TargetSyntax for ReasonMl {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::ReasonML
    }

    fn prelude(&self) -> String {
        EXTERNALS.to_string()
    }

    fn program(&self, functions: Vec<String>) -> String {
        if functions.is_empty() {
            return self.prelude();
        }
        format!("{}\n\nlet rec {};", self.prelude(), functions.join("\nand "))
    }

    fn function(&self, name: &str, params: &[Parameter], body: String, _ret: Option<String>) -> String {
        let params = params
            .iter()
            .map(|p| p.name.as_str())
            .chain(std::iter::once("resolve"))
            .join(", ");
        self.block(&format!("{} = ({}) =>", name, params), &Self::tail(Some(body).filter(|b| !b.is_empty())))
    }

    fn function_resolve(&self, ret: Option<String>, hoisted: Vec<HoistedCall>) -> Option<String> {
        let value = ret.unwrap_or_else(|| "()".to_string());
        Some(self.wrap_hoisted(hoisted, format!("resolve({})", value)))
    }

    fn sequence(&self, id: BlockId, statement: String, hoisted: Vec<HoistedCall>, rest: Option<String>) -> String {
        let body = lines([statement, Self::tail(rest)]);
        self.delayed(id, self.wrap_hoisted(hoisted, body))
    }

    fn invoke_statement(
        &self,
        id: BlockId,
        name: &str,
        args: Vec<String>,
        hoisted: Vec<HoistedCall>,
        rest: Option<String>,
    ) -> String {
        let callback = self.block("(_) =>", &Self::tail(rest));
        let statement = Self::call(name, &args, callback);
        self.delayed(id, self.wrap_hoisted(hoisted, statement))
    }

    fn invoke_value(&self, id: BlockId, name: &str, args: Vec<String>, hoisted: &mut Vec<HoistedCall>) -> String {
        let binding = format!("r_{}", id);
        hoisted.push(HoistedCall {
            binding: binding.clone(),
            function: name.to_string(),
            args,
        });
        binding
    }

    fn loop_resolve(&self, id: BlockId) -> Option<String> {
        Some(format!("loop_{}()", id))
    }

    fn loop_statement(
        &self,
        id: BlockId,
        condition: String,
        hoisted: Vec<HoistedCall>,
        body: String,
        rest: Option<String>,
    ) -> String {
        let test = self.if_else(&condition, &body, &Self::tail(rest));
        let iteration = self.delayed(id, self.wrap_hoisted(hoisted, test));
        lines([
            format!("{};", self.block(&format!("let rec loop_{} = () =>", id), &iteration)),
            format!("loop_{}();", id),
        ])
    }

    fn conditional_resolve(&self, id: BlockId) -> Option<String> {
        Some(format!("next_{}()", id))
    }

    fn conditional(
        &self,
        id: BlockId,
        condition: String,
        hoisted: Vec<HoistedCall>,
        if_true: String,
        if_false: String,
        rest: Option<String>,
    ) -> String {
        let next = format!(
            "{};",
            self.block(&format!("let next_{} = () =>", id), &Self::tail(rest))
        );
        let test = self.if_else(&condition, &if_true, &if_false);
        lines([next, self.delayed(id, self.wrap_hoisted(hoisted, test))])
    }

    fn comment(&self, text: &str, rest: Option<String>) -> String {
        let comment = format!("/* {} */", text.replace("*/", "* /"));
        lines([comment, Self::tail(rest)])
    }

    fn expression_statement(&self, expression: String, value_type: &DataType) -> String {
        if *value_type == DataType::Void {
            format!("{};", expression)
        } else {
            format!("ignore({});", expression)
        }
    }

    fn declare(&self, name: &str, mutable: bool, init: String) -> String {
        if mutable {
            format!("let {} = ref({});", name, init)
        } else {
            format!("let {} = {};", name, init)
        }
    }

    fn assign(&self, name: &str, value: String) -> String {
        format!("{} := {};", name, value)
    }

    fn read(&self, name: &str, mutable: bool) -> String {
        if mutable {
            format!("{}^", name)
        } else {
            name.to_string()
        }
    }

    fn literal(&self, literal: Literal) -> String {
        match literal {
            Literal::Int(i) => i.to_string(),
            Literal::Float(f) => format!("{:?}", f),
            Literal::Str(s) => quote(&s),
            Literal::Bool(b) => b.to_string(),
            Literal::Array(items) => format!("[|{}|]", items.join(", ")),
            Literal::Unit => "()".to_string(),
        }
    }

    fn default_value(&self, data_type: &DataType) -> String {
        match data_type {
            DataType::Int => "0",
            DataType::Float => "0.0",
            DataType::String => "\"\"",
            DataType::Bool => "false",
            DataType::Array(_) => "[||]",
            DataType::Any | DataType::Void => "()",
        }
        .to_string()
    }

    fn not(&self, value: String) -> String {
        format!("!({})", value)
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
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::Less => "<",
            ComparisonOp::LessOrEqual => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterOrEqual => ">=",
        };
        format!("({} {} {})", left, symbol, right)
    }

    fn math(&self, op: MathOp, data_type: &DataType, left: String, right: String) -> String {
        let float = *data_type == DataType::Float;
        let symbol = match (op, float) {
            (MathOp::Modulo, true) => return format!("mod_float({}, {})", left, right),
            (MathOp::Modulo, false) => "mod",
            (MathOp::Add, true) => "+.",
            (MathOp::Add, false) => "+",
            (MathOp::Subtract, true) => "-.",
            (MathOp::Subtract, false) => "-",
            (MathOp::Multiply, true) => "*.",
            (MathOp::Multiply, false) => "*",
            (MathOp::Divide, true) => "/.",
            (MathOp::Divide, false) => "/",
        };
        format!("({} {} {})", left, symbol, right)
    }
}
