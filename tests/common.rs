//! Common test utilities for building block programs.
use std::collections::BTreeMap;
use tsunagi::prelude::*;
use tracing_subscriber::EnvFilter;

/// Routes library logs to the test harness. Set `RUST_LOG` to see them.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Registers a block without attaching it anywhere.
#[allow(dead_code)]
pub fn create(ws: &mut Workspace, data: BlockData) -> BlockId {
    ws.create_block(data).expect("Failed to create block")
}

/// Registers a block and places it on the canvas.
#[allow(dead_code)]
pub fn on_canvas(ws: &mut Workspace, data: BlockData) -> BlockId {
    let id = create(ws, data);
    ws.add_to_canvas(id, None).expect("Failed to add block to canvas");
    id
}

#[allow(dead_code)]
pub fn before(ws: &Workspace, block: BlockId) -> ConnectorId {
    ws.before_of(block)
        .expect("Block should exist")
        .expect("Block should have a Before connector")
}

#[allow(dead_code)]
pub fn after(ws: &Workspace, block: BlockId) -> ConnectorId {
    ws.after_of(block)
        .expect("Block should exist")
        .expect("Block should have an After connector")
}

/// The `index`-th connector of `block` with the given type and role.
#[allow(dead_code)]
pub fn socket(
    ws: &Workspace,
    block: BlockId,
    connector_type: ConnectorType,
    role: ConnectorRole,
    index: usize,
) -> ConnectorId {
    ws.connectors_of(block, connector_type)
        .expect("Block should exist")
        .into_iter()
        .filter(|cid| ws.connector(*cid).map(|c| c.role == role).unwrap_or(false))
        .nth(index)
        .expect("Socket should exist")
}

/// Hangs `child` off `parent`'s `local` connector through the notifying protocol.
#[allow(dead_code)]
pub fn attach(ws: &mut Workspace, parent: BlockId, local: ConnectorId, child: BlockId) {
    let remote = before(ws, child);
    ws.connect(parent, child, Connection::new(local, remote), None)
        .expect("Failed to connect blocks");
}

#[allow(dead_code)]
pub fn append(ws: &mut Workspace, prev: BlockId, next: BlockId) {
    let local = after(ws, prev);
    attach(ws, prev, local, next);
}

#[allow(dead_code)]
pub fn nest(ws: &mut Workspace, parent: BlockId, role: ConnectorRole, child: BlockId) {
    let local = socket(ws, parent, ConnectorType::Inner, role, 0);
    attach(ws, parent, local, child);
}

#[allow(dead_code)]
pub fn plug(ws: &mut Workspace, parent: BlockId, role: ConnectorRole, index: usize, child: BlockId) {
    let local = socket(ws, parent, ConnectorType::Extension, role, index);
    attach(ws, parent, local, child);
}

/// Connected table of a block as a sorted list, for before/after comparisons.
#[allow(dead_code)]
pub fn adjacency(ws: &Workspace, block: BlockId) -> Vec<(ConnectorId, BlockId, ConnectorId)> {
    let mut edges: Vec<_> = ws
        .block(block)
        .expect("Block should exist")
        .connected()
        .iter()
        .map(|(local, edge)| (local, edge.block, edge.connector))
        .collect();
    edges.sort();
    edges
}

// Payloads

#[allow(dead_code)]
pub fn function(name: &str) -> BlockData {
    function_with(name, &[], DataType::Void)
}

#[allow(dead_code)]
pub fn function_with(name: &str, params: &[(&str, DataType)], return_type: DataType) -> BlockData {
    BlockData::Function {
        name: name.to_string(),
        params: params
            .iter()
            .map(|(name, data_type)| Parameter {
                name: name.to_string(),
                data_type: data_type.clone(),
            })
            .collect(),
        return_type,
    }
}

#[allow(dead_code)]
pub fn invoke(name: &str, return_type: DataType) -> BlockData {
    BlockData::FunctionInvoke {
        name: name.to_string(),
        params: Vec::new(),
        return_type,
        declaration: None,
    }
}

#[allow(dead_code)]
pub fn template(template: ExpressionTemplate) -> BlockData {
    BlockData::Expression {
        template: Some(template),
        editable: false,
        source: BTreeMap::new(),
        value_type: DataType::Void,
    }
}

#[allow(dead_code)]
pub fn println() -> BlockData {
    template(ExpressionTemplate::Println)
}

#[allow(dead_code)]
pub fn editable(sources: &[(TargetLanguage, &str)]) -> BlockData {
    BlockData::Expression {
        template: None,
        editable: true,
        source: sources.iter().map(|(t, s)| (*t, s.to_string())).collect(),
        value_type: DataType::Void,
    }
}

#[allow(dead_code)]
pub fn value(data_type: DataType, raw: &str) -> BlockData {
    BlockData::Value {
        data_type,
        value: raw.to_string(),
    }
}

#[allow(dead_code)]
pub fn string(text: &str) -> BlockData {
    value(DataType::String, text)
}

#[allow(dead_code)]
pub fn int(n: i64) -> BlockData {
    value(DataType::Int, &n.to_string())
}

#[allow(dead_code)]
pub fn var_init(name: &str, data_type: DataType, mutable: bool) -> BlockData {
    BlockData::VarInit {
        name: name.to_string(),
        data_type,
        mutable,
    }
}

#[allow(dead_code)]
pub fn variable(name: &str) -> BlockData {
    BlockData::Variable {
        name: name.to_string(),
        data_type: DataType::Any,
        mutable: false,
        declaration: None,
    }
}

#[allow(dead_code)]
pub fn math(op: MathOp, data_type: DataType) -> BlockData {
    BlockData::MathOperation { op, data_type }
}

#[allow(dead_code)]
pub fn comment(text: &str) -> BlockData {
    BlockData::Comment {
        text: text.to_string(),
    }
}

/// `main` printing `"hi"`, the smallest complete program.
#[allow(dead_code)]
pub fn hello_session() -> (Session, BlockId, BlockId) {
    init_tracing();
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let print = create(ws, println());
    nest(ws, main, ConnectorRole::FunctionBody, print);
    let hi = create(ws, string("hi"));
    plug(ws, print, ConnectorRole::Input, 0, hi);
    session.flush().expect("Failed to flush events");
    (session, main, print)
}
