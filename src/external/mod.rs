//! External collaborator interfaces: the pieces of the original system
//! this crate treats as out of scope, specified only as the interface the
//! encoder/CLI hands work to or reads a skeleton from.
//!
//! Nothing here is wired into the encoder itself. [`crate::encoding::Encoder`]
//! returns an [`crate::EncodedModel`] and stops; a caller that wants an actual
//! implementation picks a [`Decoder`] and feeds it the model.

pub mod tgff;

use std::collections::HashMap;

use crate::error::SpecError;
use crate::encoding::EncodedModel;

/// A solved model: the truth value assigned to every literal the encoder
/// interned. What those literals *mean* is recovered by looking them back
/// up through the [`crate::encoding::VarFactory`] that produced them.
#[derive(Debug, Clone, Default)]
pub struct Model(pub HashMap<i64, bool>);

impl Model {
    pub fn is_true(&self, literal: i64) -> bool {
        self.0.get(&literal.abs()).map(|&v| if literal < 0 { !v } else { v }).unwrap_or(false)
    }
}

/// Fatal failure of a [`Decoder`] to produce a model, e.g. the constraint
/// system is unsatisfiable or the backing solver process failed.
#[derive(Debug)]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "decode failed: {}", self.message)
    }
}

impl std::error::Error for DecodeError {}

/// The external SAT/PBO decoder this crate's encoder hands its output to.
/// Interface-only: no concrete solver is implemented here, matching the
/// explicit exclusion of the concrete SAT decoder engine from this crate's
/// scope.
pub trait Decoder {
    fn decode(&self, model: &EncodedModel) -> Result<Model, DecodeError>;
}

/// A decoder stand-in for tests and smoke-checks: assigns every literal
/// `false` without consulting the constraint set at all. Never satisfies
/// anything beyond the trivially-empty constraint set; exists only so this
/// crate has one concrete, testable [`Decoder`] rather than a dangling
/// trait with zero implementations.
#[derive(Debug, Default)]
pub struct AllFalseDecoder;

impl Decoder for AllFalseDecoder {
    fn decode(&self, model: &EncodedModel) -> Result<Model, DecodeError> {
        if model.constraints.iter().any(|c| c.k > 0 && c.terms.iter().all(|&(coeff, _)| coeff > 0)) {
            return Err(DecodeError::new(
                "all-false assignment violates a positive lower-bound constraint",
            ));
        }
        Ok(Model::default())
    }
}

/// Constructs a trivial, best-effort `Specification` skeleton from a data
/// source that is not the XML wire format, e.g. a TGFF benchmark file.
pub trait Importer {
    fn import<R: std::io::Read>(reader: R) -> Result<crate::Specification, SpecError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{PbConstraint, PbOp, VarFactory};

    #[test]
    fn model_reads_negated_literals() {
        let mut m = Model::default();
        m.0.insert(1, true);
        assert!(m.is_true(1));
        assert!(!m.is_true(-1));
        assert!(!m.is_true(2));
    }

    #[test]
    fn all_false_decoder_rejects_positive_lower_bound() {
        let model = EncodedModel {
            variables: VarFactory::new(),
            constraints: vec![PbConstraint::new(vec![(1, 1)], PbOp::Ge, 1)],
        };
        assert!(AllFalseDecoder.decode(&model).is_err());
    }

    #[test]
    fn all_false_decoder_accepts_empty_model() {
        let model = EncodedModel { variables: VarFactory::new(), constraints: vec![] };
        assert!(AllFalseDecoder.decode(&model).is_ok());
    }
}
