//! Lazy JSON token streams for json-mirror.
//!
//! Incoming patches are walked as a flat sequence of structural tokens
//! rather than as a materialized value tree. Two producers are provided:
//!
//! - [`TokenReader`] pulls tokens straight out of JSON text,
//! - [`ValueTokens`] walks an already parsed [`serde_json::Value`].
//!
//! Arrays are not descended into; they surface as a single
//! [`ScalarKind::Array`] token carrying the array's JSON text.
//!
//! # Example
//!
//! ```
//! use json_mirror_tokens::{ScalarKind, Token, TokenReader};
//!
//! let tokens: Vec<Token> = TokenReader::new(r#"{"a": {"b": 1}}"#)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(
//!     tokens,
//!     vec![
//!         Token::StartObject,
//!         Token::PropertyName("a".into()),
//!         Token::StartObject,
//!         Token::PropertyName("b".into()),
//!         Token::scalar(ScalarKind::Number, "1"),
//!         Token::EndObject,
//!         Token::EndObject,
//!     ]
//! );
//! ```

mod error;
mod reader;
mod token;
mod util;
mod value;

pub use error::TokenError;
pub use reader::{TokenReader, MAX_DEPTH};
pub use token::{ScalarKind, Token};
pub use value::ValueTokens;
