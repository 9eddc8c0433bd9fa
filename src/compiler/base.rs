use super::CompileProps;
use super::templates::{TargetLanguage, render};
use crate::error::CompileError;
use crate::graph::{
    BlockData, BlockId, ComparisonOp, ConnectorRole, ConnectorType, DataType, JunctionOp, MathOp,
    Parameter,
};
use crate::workspace::Workspace;

/// A value-position invocation lifted out of its expression so a
/// continuation-based target can nest the enclosing statement inside the
/// call's callback.
#[derive(Debug, Clone, PartialEq)]
pub struct HoistedCall {
    pub binding: String,
    pub function: String,
    pub args: Vec<String>,
}

/// A literal as parsed from a `Value` block, independent of target syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// Elements as JSON text.
    Array(Vec<String>),
    Unit,
}

impl Literal {
    /// Lenient parse: malformed input becomes the type's zero value.
    pub fn parse(data_type: &DataType, raw: &str) -> Self {
        let trimmed = raw.trim();
        match data_type {
            DataType::Int => Literal::Int(
                trimmed
                    .parse::<i64>()
                    .or_else(|_| trimmed.parse::<f64>().map(|f| f as i64))
                    .unwrap_or(0),
            ),
            DataType::Float => Literal::Float(
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .unwrap_or(0.0),
            ),
            DataType::String => Literal::Str(raw.to_string()),
            DataType::Bool => Literal::Bool(matches!(
                trimmed.to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            )),
            DataType::Array(_) => Literal::Array(
                serde_json::from_str::<Vec<serde_json::Value>>(trimmed)
                    .map(|items| items.iter().map(|v| v.to_string()).collect())
                    .unwrap_or_default(),
            ),
            DataType::Any => {
                if let Ok(i) = trimmed.parse::<i64>() {
                    Literal::Int(i)
                } else if let Some(f) = trimmed.parse::<f64>().ok().filter(|f| f.is_finite()) {
                    Literal::Float(f)
                } else if trimmed == "true" || trimmed == "false" {
                    Literal::Bool(trimmed == "true")
                } else {
                    Literal::Str(raw.to_string())
                }
            }
            DataType::Void => Literal::Unit,
        }
    }
}

/// Quotes a string as a double-quoted literal valid in both targets.
pub fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Prefixes every non-empty line of `text` with `indent`.
pub fn indent_lines(text: &str, indent: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Joins the non-empty fragments with newlines.
pub fn lines<I>(parts: I) -> String
where
    I: IntoIterator<Item = String>,
{
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The text a target emits for each construct.
///
/// Structure is decided by `BaseCompiler`; implementors only choose syntax
/// and, for continuation-based targets, where the rest of the program goes.
pub trait TargetSyntax {
    fn language(&self) -> TargetLanguage;

    fn prelude(&self) -> String;

    /// Assembles the compiled top-level functions into one program.
    fn program(&self, functions: Vec<String>) -> String;

    fn function(&self, name: &str, params: &[Parameter], body: String, ret: Option<String>) -> String;

    /// Statement appended once at the tail of a function body, if the target
    /// cannot `return`.
    fn function_resolve(&self, ret: Option<String>, hoisted: Vec<HoistedCall>) -> Option<String>;

    /// Wraps one statement with the execution marker and delay, followed by
    /// the rest of the chain.
    fn sequence(&self, id: BlockId, statement: String, hoisted: Vec<HoistedCall>, rest: Option<String>) -> String;

    fn invoke_statement(
        &self,
        id: BlockId,
        name: &str,
        args: Vec<String>,
        hoisted: Vec<HoistedCall>,
        rest: Option<String>,
    ) -> String;

    fn invoke_value(&self, id: BlockId, name: &str, args: Vec<String>, hoisted: &mut Vec<HoistedCall>) -> String;

    /// Resolve statement seeded into a loop body.
    fn loop_resolve(&self, id: BlockId) -> Option<String>;

    fn loop_statement(
        &self,
        id: BlockId,
        condition: String,
        hoisted: Vec<HoistedCall>,
        body: String,
        rest: Option<String>,
    ) -> String;

    /// Resolve statement seeded into both branches of a conditional.
    fn conditional_resolve(&self, id: BlockId) -> Option<String>;

    fn conditional(
        &self,
        id: BlockId,
        condition: String,
        hoisted: Vec<HoistedCall>,
        if_true: String,
        if_false: String,
        rest: Option<String>,
    ) -> String;

    fn comment(&self, text: &str, rest: Option<String>) -> String;

    fn expression_statement(&self, expression: String, value_type: &DataType) -> String;

    fn declare(&self, name: &str, mutable: bool, init: String) -> String;

    fn assign(&self, name: &str, value: String) -> String;

    fn read(&self, name: &str, mutable: bool) -> String;

    fn literal(&self, literal: Literal) -> String;

    fn default_value(&self, data_type: &DataType) -> String;

    fn not(&self, value: String) -> String;

    fn junction(&self, op: JunctionOp, left: String, right: String) -> String;

    fn comparison(&self, op: ComparisonOp, left: String, right: String) -> String;

    fn math(&self, op: MathOp, data_type: &DataType, left: String, right: String) -> String;
}

/// The shared recursive-descent dispatcher.
pub struct BaseCompiler<'a, T: TargetSyntax> {
    workspace: &'a Workspace,
    target: &'a T,
    hoisted: Vec<HoistedCall>,
}

impl<'a, T: TargetSyntax> BaseCompiler<'a, T> {
    pub fn new(workspace: &'a Workspace, target: &'a T) -> Self {
        Self {
            workspace,
            target,
            hoisted: Vec::new(),
        }
    }

    /// Compiles `id` and everything downstream of it.
    pub fn compile(&mut self, id: BlockId, props: CompileProps) -> Result<String, CompileError> {
        let data = self.workspace.data(id)?;
        let target = self.target;
        match &data {
            BlockData::Root { .. } => Err(CompileError::UnsupportedBlock {
                block: id,
                block_type: data.block_type(),
            }),
            BlockData::Function {
                name,
                params,
                return_type,
            } => self.function(id, &name, &params, &return_type),
            BlockData::Value { .. }
            | BlockData::Variable { .. }
            | BlockData::LogicNot
            | BlockData::LogicJunction { .. }
            | BlockData::LogicComparison { .. }
            | BlockData::MathOperation { .. } => self.value(id),
            BlockData::Comment { text } => {
                let rest = self.rest(id, props)?;
                Ok(target.comment(&text, rest))
            }
            BlockData::FunctionInvoke { name, params, .. } => {
                let rest = self.rest(id, props)?;
                let (args, hoisted) = self.scoped(|c| c.arguments(id, &params))?;
                Ok(target.invoke_statement(id, &name, args, hoisted, rest))
            }
            BlockData::Expression { .. } => {
                let rest = self.rest(id, props)?;
                let value_type = data.output_type().unwrap_or_default();
                let (expression, hoisted) = self.scoped(|c| c.expression(id, &data))?;
                let statement = target.expression_statement(expression, &value_type);
                Ok(target.sequence(id, statement, hoisted, rest))
            }
            BlockData::VarInit {
                name,
                data_type,
                mutable,
            } => {
                let rest = self.rest(id, props)?;
                let (init, hoisted) = self.scoped(|c| c.input(id, ConnectorRole::Input, 0, &data_type))?;
                Ok(target.sequence(id, target.declare(name, *mutable, init), hoisted, rest))
            }
            BlockData::VarSet => {
                let rest = self.rest(id, props)?;
                let Some((name, data_type)) = self.assigned_variable(id)? else {
                    return Ok(target.sequence(id, String::new(), Vec::new(), rest));
                };
                let (value, hoisted) = self.scoped(|c| c.input(id, ConnectorRole::Input, 0, &data_type))?;
                Ok(target.sequence(id, target.assign(&name, value), hoisted, rest))
            }
            BlockData::Loop => {
                let rest = self.rest(id, props)?;
                let body = self.body(id, ConnectorRole::LoopInner, target.loop_resolve(id))?;
                let (condition, hoisted) =
                    self.scoped(|c| c.input(id, ConnectorRole::Conditional, 0, &DataType::Bool))?;
                Ok(target.loop_statement(id, condition, hoisted, body, rest))
            }
            BlockData::Conditional => {
                let rest = self.rest(id, props)?;
                let if_true = self.body(id, ConnectorRole::IfTrue, target.conditional_resolve(id))?;
                let if_false = self.body(id, ConnectorRole::IfFalse, target.conditional_resolve(id))?;
                let (condition, hoisted) =
                    self.scoped(|c| c.input(id, ConnectorRole::Conditional, 0, &DataType::Bool))?;
                Ok(target.conditional(id, condition, hoisted, if_true, if_false, rest))
            }
        }
    }

    /// Compiles a block in value position. Only the block itself and its
    /// inputs are emitted.
    pub fn value(&mut self, id: BlockId) -> Result<String, CompileError> {
        let data = self.workspace.data(id)?;
        let target = self.target;
        match &data {
            BlockData::Value { data_type, value } => Ok(target.literal(Literal::parse(&data_type, &value))),
            BlockData::Variable { name, mutable, .. } => Ok(target.read(name, *mutable)),
            BlockData::LogicNot => {
                let value = self.input(id, ConnectorRole::Input, 0, &DataType::Bool)?;
                Ok(target.not(value))
            }
            BlockData::LogicJunction { op } => {
                let left = self.input(id, ConnectorRole::Input, 0, &DataType::Bool)?;
                let right = self.input(id, ConnectorRole::Input, 1, &DataType::Bool)?;
                Ok(target.junction(*op, left, right))
            }
            BlockData::LogicComparison { op } => {
                let left = self.input(id, ConnectorRole::Input, 0, &DataType::Any)?;
                let right = self.input(id, ConnectorRole::Input, 1, &DataType::Any)?;
                Ok(target.comparison(*op, left, right))
            }
            BlockData::MathOperation { op, data_type } => {
                let left = self.input(id, ConnectorRole::Input, 0, &data_type)?;
                let right = self.input(id, ConnectorRole::Input, 1, &data_type)?;
                Ok(target.math(*op, data_type, left, right))
            }
            BlockData::Expression { .. } => self.expression(id, &data),
            BlockData::FunctionInvoke { name, params, .. } => {
                let args = self.arguments(id, &params)?;
                Ok(target.invoke_value(id, &name, args, &mut self.hoisted))
            }
            other => Err(CompileError::UnsupportedBlock {
                block: id,
                block_type: other.block_type(),
            }),
        }
    }

    fn function(
        &mut self,
        id: BlockId,
        name: &str,
        params: &[Parameter],
        return_type: &DataType,
    ) -> Result<String, CompileError> {
        let (ret, hoisted) = if *return_type == DataType::Void {
            (None, Vec::new())
        } else {
            let (value, hoisted) = self.scoped(|c| c.input(id, ConnectorRole::Return, 0, return_type))?;
            (Some(value), hoisted)
        };
        let resolve = self.target.function_resolve(ret.clone(), hoisted);
        let body = self.body(id, ConnectorRole::FunctionBody, resolve)?;
        Ok(self.target.function(name, params, body, ret))
    }

    fn expression(&mut self, id: BlockId, data: &BlockData) -> Result<String, CompileError> {
        let BlockData::Expression {
            template,
            editable,
            source,
            ..
        } = data
        else {
            return Err(CompileError::UnsupportedBlock {
                block: id,
                block_type: data.block_type(),
            });
        };
        let language = self.target.language();

        if *editable {
            return source
                .get(&language)
                .cloned()
                .ok_or(CompileError::MissingSource {
                    block: id,
                    target: language,
                });
        }

        let Some(template) = template else {
            return Err(CompileError::MissingSource {
                block: id,
                target: language,
            });
        };
        let text = template
            .template(language)
            .ok_or(CompileError::MissingTemplate {
                template: *template,
                target: language,
            })?;
        let mut inputs = Vec::new();
        for (index, input_type) in template.input_types().iter().enumerate() {
            inputs.push(self.input(id, ConnectorRole::Input, index, input_type)?);
        }
        Ok(render(text, &inputs))
    }

    fn arguments(&mut self, id: BlockId, params: &[Parameter]) -> Result<Vec<String>, CompileError> {
        let mut args = Vec::with_capacity(params.len());
        for (index, param) in params.iter().enumerate() {
            args.push(self.input(id, ConnectorRole::Argument, index, &param.data_type)?);
        }
        Ok(args)
    }

    /// The `index`-th value input with `role`, or a safe default when the
    /// socket is empty.
    fn input(
        &mut self,
        id: BlockId,
        role: ConnectorRole,
        index: usize,
        fallback: &DataType,
    ) -> Result<String, CompileError> {
        let mut sockets = Vec::new();
        for cid in self.workspace.connectors_of(id, ConnectorType::Extension)? {
            if self.workspace.connector(cid)?.role == role {
                sockets.push(cid);
            }
        }
        let occupant = match sockets.get(index) {
            Some(cid) => self.workspace.occupant(id, *cid)?,
            None => None,
        };
        match occupant {
            Some(edge) => self.value(edge.block),
            None => Ok(self.target.default_value(fallback)),
        }
    }

    /// Name and type of the variable plugged into a VarSet's target socket.
    fn assigned_variable(&self, id: BlockId) -> Result<Option<(String, DataType)>, CompileError> {
        let Some(socket) = self
            .workspace
            .connector_with_role(id, ConnectorType::Extension, ConnectorRole::Target)?
        else {
            return Ok(None);
        };
        let Some(edge) = self.workspace.occupant(id, socket)? else {
            return Ok(None);
        };
        match self.workspace.data(edge.block)? {
            BlockData::Variable { name, data_type, .. } => Ok(Some((name, data_type))),
            _ => Ok(None),
        }
    }

    /// The rest of the chain after `id`, or the pending resolve statement if
    /// `id` is the tail.
    fn rest(&mut self, id: BlockId, mut props: CompileProps) -> Result<Option<String>, CompileError> {
        match self.workspace.next_in_chain(id)? {
            Some(next) => Ok(Some(self.compile(next, props)?)),
            None => Ok(props.resolve_function.take()),
        }
    }

    /// Compiles a nested body. Bodies start with fresh props; only the given
    /// resolve statement is carried in.
    fn body(&mut self, id: BlockId, role: ConnectorRole, resolve: Option<String>) -> Result<String, CompileError> {
        let occupant = match self
            .workspace
            .connector_with_role(id, ConnectorType::Inner, role)?
        {
            Some(socket) => self.workspace.occupant(id, socket)?,
            None => None,
        };
        match occupant {
            Some(edge) => self.compile(
                edge.block,
                CompileProps {
                    resolve_function: resolve,
                },
            ),
            None => Ok(resolve.unwrap_or_default()),
        }
    }

    /// Runs `f` with an empty hoist list and returns what it lifted.
    fn scoped<R, F>(&mut self, f: F) -> Result<(R, Vec<HoistedCall>), CompileError>
    where
        F: FnOnce(&mut Self) -> Result<R, CompileError>,
    {
        let outer = std::mem::take(&mut self.hoisted);
        let result = f(self);
        let hoisted = std::mem::replace(&mut self.hoisted, outer);
        Ok((result?, hoisted))
    }
}
