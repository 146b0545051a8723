//! Library-boundary error types.
//!
//! Mirrors the `kind` + `context` chain used throughout this codebase's
//! DSL/config layers: a small enum names *what* went wrong, and a stack
//! of human-readable strings records *where*, innermost first.

use std::fmt;

macro_rules! context_error {
    ($name:ident, $kind:ident { $($variant:ident),+ $(,)? }) => {
        #[derive(Debug)]
        pub struct $name {
            pub kind: $kind,
            pub context: Vec<String>,
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $kind {
            $($variant),+
        }

        impl $name {
            pub fn new(kind: $kind, msg: impl Into<String>) -> Self {
                Self { kind, context: vec![msg.into()] }
            }

            pub fn push_context(mut self, msg: impl Into<String>) -> Self {
                self.context.push(msg.into());
                self
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                writeln!(f, "{:?}", self.kind)?;
                for (i, line) in self.context.iter().enumerate() {
                    if i == 0 {
                        writeln!(f, "- {line}")?;
                    } else {
                        writeln!(f, "  {line}")?;
                    }
                }
                Ok(())
            }
        }

        impl std::error::Error for $name {}
    };
}

context_error!(SpecError, SpecErrorKind {
    Malformed,
    DanglingReference,
    InvariantViolation,
    CopyFailure,
});

impl SpecError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(SpecErrorKind::Malformed, msg)
    }

    pub fn dangling_reference(msg: impl Into<String>) -> Self {
        Self::new(SpecErrorKind::DanglingReference, msg)
    }

    pub fn invariant_violation(msg: impl Into<String>) -> Self {
        Self::new(SpecErrorKind::InvariantViolation, msg)
    }

    pub fn copy_failure(msg: impl Into<String>) -> Self {
        Self::new(SpecErrorKind::CopyFailure, msg)
    }
}

context_error!(EncodeError, EncodeErrorKind {
    InvariantViolation,
});

impl EncodeError {
    pub fn invariant_violation(msg: impl Into<String>) -> Self {
        Self::new(EncodeErrorKind::InvariantViolation, msg)
    }
}

context_error!(XmlError, XmlErrorKind {
    MalformedInput,
    Io,
});

impl XmlError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(XmlErrorKind::MalformedInput, msg)
    }

    pub fn io(err: impl fmt::Display) -> Self {
        Self::new(XmlErrorKind::Io, format!("I/O error: {err}"))
    }
}

impl From<SpecError> for XmlError {
    fn from(e: SpecError) -> Self {
        XmlError::malformed(e.to_string())
    }
}

impl From<std::io::Error> for XmlError {
    fn from(e: std::io::Error) -> Self {
        XmlError::io(e)
    }
}

impl From<quick_xml::Error> for XmlError {
    fn from(e: quick_xml::Error) -> Self {
        XmlError::malformed(format!("XML parse error: {e}"))
    }
}
