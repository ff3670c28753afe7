use std::iter::FusedIterator;

use serde_json::Value;

use crate::error::TokenError;
use crate::token::{ScalarKind, Token};

const BIN_PREFIX: &str = "data:application/octet-stream;base64,";

/// Walks a parsed [`Value`] as a token stream, in map order.
///
/// Yields `Result` items so it can stand in for [`crate::TokenReader`];
/// walking an in-memory value never fails.
pub struct ValueTokens<'a> {
    stack: Vec<serde_json::map::Iter<'a>>,
    pending: Option<&'a Value>,
}

impl<'a> ValueTokens<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            stack: Vec::new(),
            pending: Some(value),
        }
    }

    fn open(&mut self, value: &'a Value) -> Token {
        match value {
            Value::Object(map) => {
                self.stack.push(map.iter());
                Token::StartObject
            }
            Value::Null => Token::Null,
            Value::Bool(b) => Token::scalar(ScalarKind::Boolean, b.to_string()),
            Value::Number(n) => Token::scalar(ScalarKind::Number, n.to_string()),
            Value::String(s) if s.starts_with(BIN_PREFIX) => {
                Token::scalar(ScalarKind::Binary, s.clone())
            }
            Value::String(s) => Token::scalar(ScalarKind::String, s.clone()),
            Value::Array(_) => Token::scalar(ScalarKind::Array, value.to_string()),
        }
    }
}

impl Iterator for ValueTokens<'_> {
    type Item = Result<Token, TokenError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(value) = self.pending.take() {
            return Some(Ok(self.open(value)));
        }
        let top = self.stack.last_mut()?;
        match top.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                Some(Ok(Token::PropertyName(key.clone())))
            }
            None => {
                self.stack.pop();
                Some(Ok(Token::EndObject))
            }
        }
    }
}

impl FusedIterator for ValueTokens<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_follow_insertion_order() {
        let value = json!({"z": 1, "a": {"m": true}});
        let tokens: Vec<Token> = ValueTokens::new(&value).map(Result::unwrap).collect();
        assert_eq!(
            tokens,
            vec![
                Token::StartObject,
                Token::PropertyName("z".into()),
                Token::scalar(ScalarKind::Number, "1"),
                Token::PropertyName("a".into()),
                Token::StartObject,
                Token::PropertyName("m".into()),
                Token::scalar(ScalarKind::Boolean, "true"),
                Token::EndObject,
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn arrays_are_opaque() {
        let value = json!([1, {"a": 2}]);
        let tokens: Vec<Token> = ValueTokens::new(&value).map(Result::unwrap).collect();
        assert_eq!(
            tokens,
            vec![Token::scalar(ScalarKind::Array, r#"[1,{"a":2}]"#)]
        );
    }
}
