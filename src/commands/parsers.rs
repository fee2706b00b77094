//! Parser registry
//!
//! Maps a target type to a string conversion. Every entry covers a scalar
//! type `T` and its sequence form `Vec<T>`, so the same parser serves single
//! placeholders and variadic tails.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use std::any::{type_name, Any, TypeId};
use std::fmt::Display;
use std::sync::Arc;
use uuid::Uuid;

/// Type-erased converted value
pub type AnyValue = Box<dyn Any + Send + Sync>;

type ParseOne = Arc<dyn Fn(&str) -> Result<AnyValue, String> + Send + Sync>;
type ParseMany = Arc<dyn Fn(&[String]) -> Result<AnyValue, ConversionFailure> + Send + Sync>;

/// Declared type of a handler parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgType {
    pub id: TypeId,
    pub name: &'static str,
}

impl ArgType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

/// Whether a lookup hit the scalar or the sequence side of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Sequence,
}

/// A parser rejected one token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub token: String,
    pub message: String,
}

pub struct ParserEntry {
    type_name: &'static str,
    scalar: TypeId,
    sequence: TypeId,
    one: ParseOne,
    many: ParseMany,
}

impl ParserEntry {
    fn new<T, E, F>(parse: F) -> Self
    where
        T: Any + Send + Sync,
        E: Display,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let parse = Arc::new(parse);
        let single = Arc::clone(&parse);
        ParserEntry {
            type_name: type_name::<T>(),
            scalar: TypeId::of::<T>(),
            sequence: TypeId::of::<Vec<T>>(),
            one: Arc::new(move |token: &str| {
                single(token)
                    .map(|v| Box::new(v) as AnyValue)
                    .map_err(|e| e.to_string())
            }),
            many: Arc::new(move |tokens: &[String]| {
                let mut values = Vec::with_capacity(tokens.len());
                for token in tokens {
                    let value = parse(token).map_err(|e| ConversionFailure {
                        token: token.clone(),
                        message: e.to_string(),
                    })?;
                    values.push(value);
                }
                Ok(Box::new(values) as AnyValue)
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn shape_of(&self, id: TypeId) -> Option<Shape> {
        if id == self.scalar {
            Some(Shape::Scalar)
        } else if id == self.sequence {
            Some(Shape::Sequence)
        } else {
            None
        }
    }

    /// Convert captured tokens into the requested shape
    ///
    /// A scalar takes the first token; a sequence converts every token.
    pub fn convert(&self, shape: Shape, tokens: &[String]) -> Result<AnyValue, ConversionFailure> {
        match shape {
            Shape::Sequence => (self.many)(tokens),
            Shape::Scalar => {
                let Some(token) = tokens.first() else {
                    return Err(ConversionFailure {
                        token: String::new(),
                        message: "no value supplied".to_string(),
                    });
                };
                (self.one)(token).map_err(|message| ConversionFailure {
                    token: token.clone(),
                    message,
                })
            }
        }
    }
}

impl std::fmt::Debug for ParserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserEntry")
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ParserRegistry {
    entries: Vec<ParserEntry>,
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry seeded with the primitive types, `String` and `Uuid`
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(parse_bool);
        registry.register(|s: &str| s.parse::<i8>());
        registry.register(|s: &str| s.parse::<i16>());
        registry.register(|s: &str| s.parse::<i32>());
        registry.register(|s: &str| s.parse::<i64>());
        registry.register(|s: &str| s.parse::<u8>());
        registry.register(|s: &str| s.parse::<u16>());
        registry.register(|s: &str| s.parse::<u32>());
        registry.register(|s: &str| s.parse::<u64>());
        registry.register(|s: &str| s.parse::<f32>());
        registry.register(|s: &str| s.parse::<f64>());
        registry.register(|s: &str| Uuid::parse_str(s));
        registry.register(|s: &str| Ok::<_, std::convert::Infallible>(s.to_string()));
        registry
    }

    /// Add a parser for `T` and `Vec<T>`, replacing any earlier one for `T`
    pub fn register<T, E, F>(&mut self, parse: F)
    where
        T: Any + Send + Sync,
        E: Display,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let scalar = TypeId::of::<T>();
        self.entries.retain(|entry| entry.scalar != scalar);
        self.entries.push(ParserEntry::new(parse));
    }

    pub fn lookup(&self, ty: TypeId) -> Option<(&ParserEntry, Shape)> {
        self.entries
            .iter()
            .find_map(|entry| entry.shape_of(ty).map(|shape| (entry, shape)))
    }

    pub fn supports(&self, ty: TypeId) -> bool {
        self.lookup(ty).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => Err(format!("'{raw}' is not a boolean (true/false)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builtins_cover_scalar_and_sequence() {
        let registry = ParserRegistry::with_builtins();
        assert!(matches!(
            registry.lookup(TypeId::of::<i64>()),
            Some((_, Shape::Scalar))
        ));
        assert!(matches!(
            registry.lookup(TypeId::of::<Vec<i64>>()),
            Some((_, Shape::Sequence))
        ));
        assert!(registry.supports(TypeId::of::<Uuid>()));
        assert!(registry.supports(TypeId::of::<Vec<String>>()));
        assert!(!registry.supports(TypeId::of::<std::path::PathBuf>()));
    }

    #[test]
    fn test_scalar_conversion() {
        let registry = ParserRegistry::with_builtins();
        let (entry, shape) = registry.lookup(TypeId::of::<i32>()).unwrap();
        let value = entry.convert(shape, &tokens(&["42"])).unwrap();
        assert_eq!(value.downcast_ref::<i32>(), Some(&42));
    }

    #[test]
    fn test_sequence_conversion() {
        let registry = ParserRegistry::with_builtins();
        let (entry, shape) = registry.lookup(TypeId::of::<Vec<f64>>()).unwrap();
        let value = entry.convert(shape, &tokens(&["1.5", "2"])).unwrap();
        assert_eq!(value.downcast_ref::<Vec<f64>>(), Some(&vec![1.5, 2.0]));
    }

    #[test]
    fn test_conversion_failure_names_token() {
        let registry = ParserRegistry::with_builtins();
        let (entry, shape) = registry.lookup(TypeId::of::<Vec<u8>>()).unwrap();
        let err = entry.convert(shape, &tokens(&["1", "300"])).unwrap_err();
        assert_eq!(err.token, "300");
        assert!(err.message.contains("too large"));
    }

    #[test]
    fn test_scalar_without_token_fails() {
        let registry = ParserRegistry::with_builtins();
        let (entry, shape) = registry.lookup(TypeId::of::<String>()).unwrap();
        assert!(entry.convert(shape, &[]).is_err());
    }

    #[test]
    fn test_bool_parser() {
        assert_eq!(parse_bool("TRUE"), Ok(true));
        assert_eq!(parse_bool("off"), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_register_replaces_existing_entry() {
        let mut registry = ParserRegistry::with_builtins();
        let before = registry.len();
        registry.register(|s: &str| Ok::<i64, String>(s.len() as i64));
        assert_eq!(registry.len(), before);

        let (entry, shape) = registry.lookup(TypeId::of::<i64>()).unwrap();
        let value = entry.convert(shape, &tokens(&["abcd"])).unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&4));
    }

    #[derive(Debug, PartialEq)]
    struct Coord(i32, i32);

    #[test]
    fn test_custom_type() {
        let mut registry = ParserRegistry::empty();
        registry.register(|s: &str| -> Result<Coord, String> {
            let (x, y) = s.split_once(',').ok_or("expected x,y")?;
            Ok(Coord(
                x.parse().map_err(|_| "bad x")?,
                y.parse().map_err(|_| "bad y")?,
            ))
        });

        let (entry, shape) = registry.lookup(TypeId::of::<Coord>()).unwrap();
        let value = entry.convert(shape, &tokens(&["3,4"])).unwrap();
        assert_eq!(value.downcast_ref::<Coord>(), Some(&Coord(3, 4)));
        let err = entry.convert(shape, &tokens(&["3"])).unwrap_err();
        assert_eq!(err.message, "expected x,y");
    }
}
