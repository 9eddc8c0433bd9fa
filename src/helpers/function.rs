use super::declarations::{DeclarationKind, DeclarationTracker};
use crate::graph::{BlockData, BlockId, BlockType, DataType, Parameter};

/// `Function` declares, `FunctionInvoke` calls.
#[derive(Debug)]
pub struct FunctionKind;

/// Parameters and return type.
pub type FunctionSignature = (Vec<Parameter>, DataType);

pub type FunctionHelper = DeclarationTracker<FunctionKind>;

impl DeclarationKind for FunctionKind {
    type Signature = FunctionSignature;

    const DECLARATION: BlockType = BlockType::Function;
    const USAGE: BlockType = BlockType::FunctionInvoke;
    const LABEL: &'static str = "function";

    fn declared(data: &BlockData) -> Option<(String, Self::Signature)> {
        match data {
            BlockData::Function {
                name,
                params,
                return_type,
            } => Some((name.clone(), (params.clone(), return_type.clone()))),
            _ => None,
        }
    }

    fn rename_declaration(data: &mut BlockData, new_name: &str) {
        if let BlockData::Function { name, .. } = data {
            *name = new_name.to_string();
        }
    }

    fn usage(data: &BlockData) -> Option<(String, Option<BlockId>)> {
        match data {
            BlockData::FunctionInvoke {
                name, declaration, ..
            } => Some((name.clone(), *declaration)),
            _ => None,
        }
    }

    fn companion(name: &str, signature: &Self::Signature, declaration: BlockId) -> BlockData {
        BlockData::FunctionInvoke {
            name: name.to_string(),
            params: signature.0.clone(),
            return_type: signature.1.clone(),
            declaration: Some(declaration),
        }
    }

    fn sync_usage(data: &mut BlockData, new_name: &str, signature: &Self::Signature, bound_to: BlockId) {
        if let BlockData::FunctionInvoke {
            name,
            params,
            return_type,
            declaration,
        } = data
        {
            *name = new_name.to_string();
            *params = signature.0.clone();
            *return_type = signature.1.clone();
            *declaration = Some(bound_to);
        }
    }
}
