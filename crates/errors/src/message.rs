//! 消息与字段错误
//!
//! 消息由消息键和位置参数组成，文本由消息目录在展示时渲染

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 本地化消息
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl Message {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            params: Vec::new(),
        }
    }

    /// 追加一个位置参数
    pub fn param(mut self, value: impl ToString) -> Self {
        self.params.push(value.to_string());
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}({})", self.key, self.params.join(", "))
        }
    }
}

/// 消息渲染
pub trait MessageSource: Send + Sync {
    fn render(&self, message: &Message) -> String;
}

/// 不做本地化，直接返回消息键
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyOnlySource;

impl MessageSource for KeyOnlySource {
    fn render(&self, message: &Message) -> String {
        message.to_string()
    }
}

/// 按字段归集的校验错误
///
/// 同一字段的多条消息按加入顺序保留，后加入的不会覆盖已有消息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<Message>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: Message) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: Message) {
        self.0.entry(field.into()).or_default().push(message);
    }

    /// 合并另一组错误
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 出错字段数
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 消息总数
    pub fn message_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn get(&self, field: &str) -> &[Message] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: &str, key: &str) -> bool {
        self.get(field).iter().any(|m| m.key == key)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Message])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<Message>> {
        self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{}: {}", field, message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_appends_to_existing_field() {
        let mut errors = FieldErrors::new();
        errors.add("requisitionLineItems", Message::new("first"));
        errors.add("requisitionLineItems", Message::new("second"));

        let messages = errors.get("requisitionLineItems");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].key, "first");
        assert_eq!(messages[1].key, "second");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.message_count(), 2);
    }

    #[test]
    fn test_merge_keeps_both_sides() {
        let mut left = FieldErrors::single("a", Message::new("x"));
        let mut right = FieldErrors::single("a", Message::new("y"));
        right.add("b", Message::new("z"));
        left.merge(right);

        assert!(left.contains("a", "x"));
        assert!(left.contains("a", "y"));
        assert!(left.contains("b", "z"));
        assert_eq!(left.len(), 2);
    }

    #[test]
    fn test_missing_field_is_empty_slice() {
        let errors = FieldErrors::new();
        assert!(errors.get("status").is_empty());
        assert!(!errors.contains("status", "any"));
    }

    #[test]
    fn test_display() {
        let mut errors = FieldErrors::new();
        errors.add("status", Message::new("bad").param("INITIATED").param("APPROVED"));
        errors.add("emergency", Message::new("nope"));
        assert_eq!(
            errors.to_string(),
            "emergency: nope; status: bad(INITIATED, APPROVED)"
        );
    }

    #[test]
    fn test_serialize_shape() {
        let errors = FieldErrors::single("stockOnHand", Message::new("k").param(1));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["stockOnHand"][0]["key"], "k");
        assert_eq!(json["stockOnHand"][0]["params"][0], "1");
    }
}
