//! Connector layouts for every block type.
//!
//! Statement blocks chain through `After`/`Inner`, value blocks plug into
//! `Extension` sockets. The predicates set here override the permissive
//! default of `Connector::allows`.

use super::block::BlockType;
use super::connector::{Connector, ConnectorPredicate, ConnectorRole, ConnectorType};
use super::data::{BlockData, DataType};

fn statement_before() -> Connector {
    Connector::new(ConnectorType::Before, ConnectorRole::Default).with_predicate(
        ConnectorPredicate::ConnectorTypes(vec![ConnectorType::After, ConnectorType::Inner]),
    )
}

/// Value-only blocks never sit in a statement position.
fn value_before(value_type: DataType) -> Connector {
    Connector::new(ConnectorType::Before, ConnectorRole::Output)
        .with_predicate(ConnectorPredicate::ConnectorTypes(vec![
            ConnectorType::Extension,
        ]))
        .with_predicate(ConnectorPredicate::MatchesValueType)
        .with_value_type(value_type)
}

/// Expressions and invocations work both as statements and as values.
fn flexible_before(value_type: DataType) -> Connector {
    Connector::new(ConnectorType::Before, ConnectorRole::Output)
        .with_predicate(ConnectorPredicate::ConnectorTypes(vec![
            ConnectorType::After,
            ConnectorType::Inner,
            ConnectorType::Extension,
        ]))
        .with_predicate(ConnectorPredicate::MatchesValueType)
        .with_value_type(value_type)
}

fn next() -> Connector {
    Connector::new(ConnectorType::After, ConnectorRole::Default)
        .with_predicate(ConnectorPredicate::ConnectorTypes(vec![ConnectorType::Before]))
}

fn body(role: ConnectorRole) -> Connector {
    Connector::new(ConnectorType::Inner, role)
        .with_predicate(ConnectorPredicate::ConnectorTypes(vec![ConnectorType::Before]))
}

fn input(role: ConnectorRole, value_type: DataType) -> Connector {
    Connector::new(ConnectorType::Extension, role)
        .with_predicate(ConnectorPredicate::ConnectorTypes(vec![ConnectorType::Before]))
        .with_predicate(ConnectorPredicate::MatchesValueType)
        .with_value_type(value_type)
}

/// A fresh container slot on the Root or Drawer.
pub fn container_slot() -> Connector {
    Connector::new(ConnectorType::Internal, ConnectorRole::Default)
}

/// Builds the connectors a block of this payload owns, in socket order.
pub fn connectors_for(data: &BlockData) -> Vec<Connector> {
    match data {
        BlockData::Function { return_type, .. } => vec![
            Connector::new(ConnectorType::Before, ConnectorRole::Default).with_predicate(
                ConnectorPredicate::ConnectorTypes(vec![ConnectorType::Internal]),
            ),
            body(ConnectorRole::FunctionBody),
            input(ConnectorRole::Return, return_type.clone()),
        ],
        BlockData::FunctionInvoke {
            params,
            return_type,
            ..
        } => {
            let mut connectors = vec![flexible_before(return_type.clone()), next()];
            connectors.extend(
                params
                    .iter()
                    .map(|p| input(ConnectorRole::Argument, p.data_type.clone())),
            );
            connectors
        }
        BlockData::Expression { template, .. } => {
            let value_type = data.output_type().unwrap_or_default();
            let mut connectors = vec![flexible_before(value_type), next()];
            if let Some(template) = template {
                connectors.extend(
                    template
                        .input_types()
                        .into_iter()
                        .map(|t| input(ConnectorRole::Input, t)),
                );
            }
            connectors
        }
        BlockData::Value { data_type, .. } | BlockData::Variable { data_type, .. } => {
            vec![value_before(data_type.clone())]
        }
        BlockData::VarInit { data_type, .. } => vec![
            statement_before(),
            next(),
            input(ConnectorRole::Input, data_type.clone()),
        ],
        BlockData::VarSet => vec![
            statement_before(),
            next(),
            input(ConnectorRole::Target, DataType::Any)
                .with_predicate(ConnectorPredicate::OwnerTypes(vec![BlockType::Variable])),
            input(ConnectorRole::Input, DataType::Any),
        ],
        BlockData::Loop => vec![
            statement_before(),
            next(),
            input(ConnectorRole::Conditional, DataType::Bool),
            body(ConnectorRole::LoopInner),
        ],
        BlockData::Conditional => vec![
            statement_before(),
            next(),
            input(ConnectorRole::Conditional, DataType::Bool),
            body(ConnectorRole::IfTrue),
            body(ConnectorRole::IfFalse),
        ],
        BlockData::LogicNot => vec![
            value_before(DataType::Bool),
            input(ConnectorRole::Input, DataType::Bool),
        ],
        BlockData::LogicJunction { .. } => vec![
            value_before(DataType::Bool),
            input(ConnectorRole::Input, DataType::Bool),
            input(ConnectorRole::Input, DataType::Bool),
        ],
        BlockData::LogicComparison { .. } => vec![
            value_before(DataType::Bool),
            input(ConnectorRole::Input, DataType::Any),
            input(ConnectorRole::Input, DataType::Any),
        ],
        BlockData::MathOperation { data_type, .. } => vec![
            value_before(data_type.clone()),
            input(ConnectorRole::Input, data_type.clone()),
            input(ConnectorRole::Input, data_type.clone()),
        ],
        BlockData::Comment { .. } => vec![statement_before(), next()],
        BlockData::Root { .. } => Vec::new(),
    }
}
