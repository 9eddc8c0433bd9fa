use super::declarations::{DeclarationKind, DeclarationTracker};
use crate::graph::{BlockData, BlockId, BlockType, DataType};

/// `VarInit` declares, `Variable` references.
#[derive(Debug)]
pub struct VariableKind;

/// Declared type and mutability.
pub type VariableSignature = (DataType, bool);

pub type VariableHelper = DeclarationTracker<VariableKind>;

impl DeclarationKind for VariableKind {
    type Signature = VariableSignature;

    const DECLARATION: BlockType = BlockType::VarInit;
    const USAGE: BlockType = BlockType::Variable;
    const LABEL: &'static str = "variable";

    fn declared(data: &BlockData) -> Option<(String, Self::Signature)> {
        match data {
            BlockData::VarInit {
                name,
                data_type,
                mutable,
            } => Some((name.clone(), (data_type.clone(), *mutable))),
            _ => None,
        }
    }

    fn rename_declaration(data: &mut BlockData, new_name: &str) {
        if let BlockData::VarInit { name, .. } = data {
            *name = new_name.to_string();
        }
    }

    fn usage(data: &BlockData) -> Option<(String, Option<BlockId>)> {
        match data {
            BlockData::Variable {
                name, declaration, ..
            } => Some((name.clone(), *declaration)),
            _ => None,
        }
    }

    fn companion(name: &str, signature: &Self::Signature, declaration: BlockId) -> BlockData {
        BlockData::Variable {
            name: name.to_string(),
            data_type: signature.0.clone(),
            mutable: signature.1,
            declaration: Some(declaration),
        }
    }

    fn sync_usage(data: &mut BlockData, new_name: &str, signature: &Self::Signature, bound_to: BlockId) {
        if let BlockData::Variable {
            name,
            data_type,
            mutable,
            declaration,
        } = data
        {
            *name = new_name.to_string();
            *data_type = signature.0.clone();
            *mutable = signature.1;
            *declaration = Some(bound_to);
        }
    }
}
