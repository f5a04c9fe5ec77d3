//! Python intermediate representation.
//!
//! User-controlled text only reaches the output as an [`Expr::Str`] literal,
//! a comment, or an [`Ident`] built through [`Ident::for_entity`]. Verbatim
//! blocks accept `&'static str` only, so they can never carry document data.

use std::collections::HashSet;

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise",
    "return", "try", "while", "with", "yield",
];

/// A valid, non-keyword Python identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: &str) -> Option<Ident> {
        let mut chars = name.chars();
        let first = chars.next()?;
        let valid = (first == '_' || first.is_ascii_alphabetic())
            && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
            && !PYTHON_KEYWORDS.contains(&name);
        valid.then(|| Ident(name.to_string()))
    }

    /// Names compiled into the generator itself.
    pub(crate) fn fixed(name: &'static str) -> Ident {
        debug_assert!(Ident::new(name).is_some(), "invalid fixed identifier {name}");
        Ident(name.to_string())
    }

    /// `obj_` followed by the entity id with every character outside
    /// `[A-Za-z0-9_]` replaced by `_`. The prefix keeps the result clear of
    /// keywords, leading digits and the runtime's own names.
    pub fn for_entity(entity_id: &str) -> Ident {
        let body: String = entity_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        let body = if body.is_empty() { "unnamed".to_string() } else { body };
        Ident(format!("obj_{body}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hands out identifiers that are unique within one generated module.
#[derive(Default)]
pub struct IdentAllocator {
    used: HashSet<String>,
}

impl IdentAllocator {
    /// Returns `base`, or `base_2`, `base_3`, ... when already taken.
    pub fn allocate(&mut self, base: Ident) -> Ident {
        if self.used.insert(base.0.clone()) {
            return base;
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{}_{n}", base.0);
            if self.used.insert(candidate.clone()) {
                return Ident(candidate);
            }
            n += 1;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Name(Ident),
    Attr(Box<Expr>, Ident),
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(Ident, Expr)>,
    },
}

impl Expr {
    pub fn name(name: &'static str) -> Expr {
        Expr::Name(Ident::fixed(name))
    }

    pub fn str(value: impl Into<String>) -> Expr {
        Expr::Str(value.into())
    }

    pub fn attr(self, attr: &'static str) -> Expr {
        Expr::Attr(Box::new(self), Ident::fixed(attr))
    }

    pub fn call(self, args: Vec<Expr>) -> Expr {
        self.call_kw(args, Vec::new())
    }

    pub fn call_kw(self, args: Vec<Expr>, kwargs: Vec<(Ident, Expr)>) -> Expr {
        Expr::Call {
            func: Box::new(self),
            args,
            kwargs,
        }
    }

    /// Literal for a JSON value. Object keys come out sorted.
    pub fn from_json(value: &serde_json::Value) -> Expr {
        match value {
            serde_json::Value::Null => Expr::None,
            serde_json::Value::Bool(b) => Expr::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Expr::Int(i as i128)
                } else if let Some(u) = n.as_u64() {
                    Expr::Int(u as i128)
                } else {
                    Expr::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Expr::Str(s.clone()),
            serde_json::Value::Array(items) => Expr::List(items.iter().map(Expr::from_json).collect()),
            serde_json::Value::Object(map) => {
                let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                Expr::Dict(
                    entries
                        .into_iter()
                        .map(|(k, v)| (Expr::Str(k.clone()), Expr::from_json(v)))
                        .collect(),
                )
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Comment(String),
    Blank,
    Assign(Ident, Expr),
    Expr(Expr),
    Verbatim(&'static str),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn push(&mut self, stmt: Stmt) {
        self.body.push(stmt);
    }

    pub fn extend(&mut self, stmts: impl IntoIterator<Item = Stmt>) {
        self.body.extend(stmts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_rejects_keywords_and_bad_starts() {
        assert!(Ident::new("player_1").is_some());
        assert!(Ident::new("_hidden").is_some());
        assert!(Ident::new("class").is_none());
        assert!(Ident::new("1st").is_none());
        assert!(Ident::new("a-b").is_none());
        assert!(Ident::new("").is_none());
    }

    #[test]
    fn entity_idents_are_prefixed_and_escaped() {
        assert_eq!(Ident::for_entity("player").as_str(), "obj_player");
        assert_eq!(Ident::for_entity("enemy-2 (copy)").as_str(), "obj_enemy_2__copy_");
        assert_eq!(Ident::for_entity("class").as_str(), "obj_class");
        assert_eq!(Ident::for_entity("1").as_str(), "obj_1");
        assert_eq!(Ident::for_entity("").as_str(), "obj_unnamed");
        assert_eq!(Ident::for_entity("héros").as_str(), "obj_h_ros");
        for id in ["a b", "x.y", "\"; import os"] {
            assert!(Ident::new(Ident::for_entity(id).as_str()).is_some(), "{id}");
        }
    }

    #[test]
    fn allocator_suffixes_collisions() {
        let mut alloc = IdentAllocator::default();
        let a = alloc.allocate(Ident::for_entity("a-b"));
        let b = alloc.allocate(Ident::for_entity("a b"));
        let c = alloc.allocate(Ident::for_entity("a.b"));
        assert_eq!(a.as_str(), "obj_a_b");
        assert_eq!(b.as_str(), "obj_a_b_2");
        assert_eq!(c.as_str(), "obj_a_b_3");
    }

    #[test]
    fn json_objects_become_sorted_dicts() {
        let expr = Expr::from_json(&serde_json::json!({"b": 1, "a": [true, null]}));
        match expr {
            Expr::Dict(entries) => {
                assert_eq!(entries[0].0, Expr::Str("a".into()));
                assert_eq!(entries[0].1, Expr::List(vec![Expr::Bool(true), Expr::None]));
                assert_eq!(entries[1].1, Expr::Int(1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
