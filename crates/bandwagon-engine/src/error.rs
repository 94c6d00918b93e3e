use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    #[error("Unknown enzyme '{name}'")]
    UnknownEnzyme { name: String },

    #[error("Cannot digest an empty sequence")]
    EmptySequence,

    #[error("Invalid topology '{0}', expected 'linear' or 'circular'")]
    InvalidTopology(String),

    #[error("Sequence cannot be searched for enzyme '{enzyme}': {reason}")]
    UnsearchableSequence { enzyme: String, reason: String },
}

impl DigestError {
    pub fn unknown_enzyme(name: &str) -> Self {
        Self::UnknownEnzyme {
            name: name.to_string(),
        }
    }
}
