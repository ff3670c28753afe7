//! Validated token sequences.
//!
//! A [`Patch`] is checked against the grammar
//! `value := scalar | null | '{' (name value)* '}'` before it ever reaches a
//! tree, so a malformed payload is rejected without partially mutating
//! anything. Parsed patches may nest objects at most [`MAX_DEPTH`] deep.

use json_mirror_tokens::{Token, TokenError, TokenReader, ValueTokens, MAX_DEPTH};
use serde_json::Value;

use crate::error::TreeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    tokens: Vec<Token>,
}

impl Patch {
    pub fn from_tokens<I>(tokens: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = Result<Token, TokenError>>,
    {
        let tokens = tokens.into_iter().collect::<Result<Vec<_>, _>>()?;
        validate(&tokens)?;
        Ok(Self { tokens })
    }

    /// Numbers keep serde_json's rendering of `value`, so `1e2` becomes
    /// `100.0`; [`Patch::parse`] keeps the literal text instead.
    pub fn from_value(value: &Value) -> Self {
        Self {
            tokens: ValueTokens::new(value).flatten().collect(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, TreeError> {
        Self::from_tokens(TokenReader::new(input))
    }

    /// `{}`: merges nothing; paired with `replace` it clears a path.
    pub fn empty_object() -> Self {
        Self {
            tokens: vec![Token::StartObject, Token::EndObject],
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_object(&self) -> bool {
        matches!(self.tokens.first(), Some(Token::StartObject))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.tokens.first(), Some(Token::Null))
    }
}

fn validate(tokens: &[Token]) -> Result<(), TreeError> {
    let mut depth = 0usize;
    let mut expect_value = true;
    let mut complete = false;
    for (position, token) in tokens.iter().enumerate() {
        if complete {
            return Err(TreeError::UnbalancedStructure { position });
        }
        match (expect_value, token) {
            (true, Token::Scalar { .. } | Token::Null) => {
                expect_value = false;
                complete = depth == 0;
            }
            (true, Token::StartObject) if depth >= MAX_DEPTH => {
                return Err(TreeError::NestingTooDeep { position });
            }
            (true, Token::StartObject) => {
                depth += 1;
                expect_value = false;
            }
            (false, Token::PropertyName(_)) if depth > 0 => expect_value = true,
            (false, Token::EndObject) if depth > 0 => {
                depth -= 1;
                complete = depth == 0;
            }
            (_, Token::EndObject) if depth == 0 => {
                return Err(TreeError::UnbalancedStructure { position });
            }
            (_, token) => {
                return Err(TreeError::UnexpectedToken {
                    position,
                    found: token.describe(),
                })
            }
        }
    }
    if complete {
        Ok(())
    } else {
        Err(TreeError::UnbalancedStructure {
            position: tokens.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_mirror_tokens::ScalarKind;

    fn ok(tokens: Vec<Token>) -> Result<Patch, TreeError> {
        Patch::from_tokens(tokens.into_iter().map(Ok))
    }

    #[test]
    fn accepts_scalars_null_and_objects() {
        assert!(ok(vec![Token::Null]).is_ok());
        assert!(ok(vec![Token::scalar(ScalarKind::Number, "1")]).is_ok());
        assert!(ok(vec![
            Token::StartObject,
            Token::PropertyName("a".into()),
            Token::StartObject,
            Token::EndObject,
            Token::EndObject,
        ])
        .is_ok());
    }

    #[test]
    fn empty_stream_is_unbalanced() {
        assert!(matches!(
            ok(vec![]),
            Err(TreeError::UnbalancedStructure { position: 0 })
        ));
    }

    #[test]
    fn missing_object_end_is_unbalanced() {
        let err = ok(vec![
            Token::StartObject,
            Token::PropertyName("a".into()),
            Token::Null,
        ])
        .unwrap_err();
        assert!(matches!(err, TreeError::UnbalancedStructure { position: 3 }));
    }

    #[test]
    fn stray_object_end_is_unbalanced() {
        let err = ok(vec![Token::StartObject, Token::EndObject, Token::EndObject]).unwrap_err();
        assert!(matches!(err, TreeError::UnbalancedStructure { position: 2 }));

        let err = ok(vec![Token::EndObject]).unwrap_err();
        assert!(matches!(err, TreeError::UnbalancedStructure { position: 0 }));
    }

    #[test]
    fn value_in_key_position_is_unexpected() {
        let err = ok(vec![
            Token::StartObject,
            Token::scalar(ScalarKind::String, "x"),
            Token::EndObject,
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            TreeError::UnexpectedToken {
                position: 1,
                found: "scalar"
            }
        ));
    }

    #[test]
    fn missing_value_is_unexpected() {
        let err = ok(vec![
            Token::StartObject,
            Token::PropertyName("a".into()),
            Token::EndObject,
        ])
        .unwrap_err();
        assert!(matches!(err, TreeError::UnexpectedToken { position: 2, .. }));
    }

    fn nested_tokens(depth: usize) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(depth * 3 + 1);
        for _ in 0..depth {
            tokens.push(Token::StartObject);
            tokens.push(Token::PropertyName("a".into()));
        }
        tokens.push(Token::Null);
        tokens.extend(std::iter::repeat(Token::EndObject).take(depth));
        tokens
    }

    #[test]
    fn nesting_is_capped() {
        assert!(ok(nested_tokens(MAX_DEPTH)).is_ok());
        let err = ok(nested_tokens(MAX_DEPTH + 1)).unwrap_err();
        assert!(
            matches!(err, TreeError::NestingTooDeep { position } if position == MAX_DEPTH * 2),
            "got {err:?}"
        );
    }

    #[test]
    fn null_payload_is_detected() {
        assert!(ok(vec![Token::Null]).unwrap().is_null());
        assert!(!Patch::empty_object().is_null());
    }

    #[test]
    fn from_value_matches_parse() {
        let value = serde_json::json!({"a": {"b": [1, 2]}, "c": null});
        let parsed = Patch::parse(&value.to_string()).unwrap();
        assert_eq!(Patch::from_value(&value), parsed);
        assert!(parsed.is_object());
    }
}
