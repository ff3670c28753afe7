use std::fmt;

/// Kind of a scalar token. The text is always kept raw; the kind only
/// records what the literal looked like on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Boolean,
    Number,
    String,
    /// `data:application/octet-stream;base64,...` string literal.
    Binary,
    /// Opaque array, text is the array's JSON.
    Array,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartObject,
    PropertyName(String),
    Scalar { kind: ScalarKind, text: String },
    Null,
    EndObject,
}

impl Token {
    pub fn scalar(kind: ScalarKind, text: impl Into<String>) -> Self {
        Token::Scalar {
            kind,
            text: text.into(),
        }
    }

    /// Short name used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Token::StartObject => "object start",
            Token::PropertyName(_) => "property name",
            Token::Scalar { .. } => "scalar",
            Token::Null => "null",
            Token::EndObject => "object end",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::StartObject => f.write_str("{"),
            Token::PropertyName(name) => write!(f, "{name:?}:"),
            Token::Scalar { text, .. } => f.write_str(text),
            Token::Null => f.write_str("null"),
            Token::EndObject => f.write_str("}"),
        }
    }
}
