//! Attribute schema: the static types of the attributes a formula may
//! reference.

use crate::types::NodeType;

/// Source of attribute types for the parser.
pub trait AttributeSchema {
    fn attribute_type(&self, name: &str) -> Option<NodeType>;
}

/// An insertion-ordered table of attribute names and their types.
///
/// Names are matched exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    entries: Vec<(String, NodeType)>,
}

impl AttributeTable {
    pub fn new() -> Self {
        AttributeTable::default()
    }

    /// Declares `name`, overriding an earlier declaration of the same name.
    pub fn insert(&mut self, name: impl Into<String>, ty: NodeType) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = ty,
            None => self.entries.push((name, ty)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, ty: NodeType) -> Self {
        self.insert(name, ty);
        self
    }

    /// Parses a `name=type` declaration such as `price=float`.
    ///
    /// Everything after the last `=` is the type, so names may contain `=`.
    pub fn parse_entry(text: &str) -> Result<(String, NodeType), String> {
        let (name, ty) = text
            .rsplit_once('=')
            .ok_or_else(|| format!("expected NAME=TYPE, got '{text}'"))?;
        if name.is_empty() {
            return Err(format!("missing attribute name in '{text}'"));
        }
        Ok((name.to_string(), ty.parse::<NodeType>()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeType)> {
        self.entries.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AttributeSchema for AttributeTable {
    fn attribute_type(&self, name: &str) -> Option<NodeType> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, ty)| *ty)
    }
}

impl<N: Into<String>> FromIterator<(N, NodeType)> for AttributeTable {
    fn from_iter<I: IntoIterator<Item = (N, NodeType)>>(iter: I) -> Self {
        let mut table = AttributeTable::new();
        for (name, ty) in iter {
            table.insert(name, ty);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_declarations_win() {
        let table = AttributeTable::new()
            .with("count", NodeType::Integer)
            .with("count", NodeType::Float);
        assert_eq!(table.len(), 1);
        assert_eq!(table.attribute_type("count"), Some(NodeType::Float));
        assert_eq!(table.attribute_type("Count"), None);
    }

    #[test]
    fn parses_declarations() {
        assert_eq!(
            AttributeTable::parse_entry("list price=Float"),
            Ok(("list price".to_string(), NodeType::Float))
        );
        assert_eq!(
            AttributeTable::parse_entry("a=b=string"),
            Ok(("a=b".to_string(), NodeType::String))
        );
        assert!(AttributeTable::parse_entry("price").is_err());
        assert!(AttributeTable::parse_entry("=int").is_err());
        assert!(AttributeTable::parse_entry("price=money").is_err());
    }

    #[test]
    fn collects_from_pairs() {
        let table: AttributeTable = [("a", NodeType::Boolean), ("b", NodeType::String)]
            .into_iter()
            .collect();
        let names: Vec<_> = table.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
