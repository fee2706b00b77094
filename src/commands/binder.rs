//! Parameter binder
//!
//! Resolves a route's declared parameters against the captured placeholder
//! groups and the invoking actor. Binding is all-or-nothing: the first
//! failure aborts and nothing is handed to the handler.

use std::fmt;
use std::sync::Arc;

use super::handler::Param;
use super::parsers::{AnyValue, ParserRegistry};
use super::pattern::CapturedArgs;
use crate::core::{Actor, BindError};

pub enum BoundValue {
    Absent,
    Sender(Arc<dyn Actor>),
    Value(AnyValue),
}

impl fmt::Debug for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Absent => write!(f, "Absent"),
            BoundValue::Sender(actor) => write!(f, "Sender({})", actor.name()),
            BoundValue::Value(_) => write!(f, "Value(..)"),
        }
    }
}

/// Bound argument list in parameter declaration order
#[derive(Debug, Default)]
pub struct BoundArgs {
    slots: Vec<(Option<String>, BoundValue)>,
}

impl BoundArgs {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&BoundValue> {
        self.slots.get(index).map(|(_, value)| value)
    }

    /// Converted value of the argument bound from placeholder `name`
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.slots.iter().find_map(|(slot_name, value)| match value {
            BoundValue::Value(v) if slot_name.as_deref() == Some(name) => v.downcast_ref::<T>(),
            _ => None,
        })
    }

    /// Converted value at parameter position `index`
    pub fn at<T: 'static>(&self, index: usize) -> Option<&T> {
        match self.slot(index)? {
            BoundValue::Value(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// First bound sender slot
    pub fn sender(&self) -> Option<&Arc<dyn Actor>> {
        self.slots.iter().find_map(|(_, value)| match value {
            BoundValue::Sender(actor) => Some(actor),
            _ => None,
        })
    }

    pub fn is_absent(&self, index: usize) -> bool {
        matches!(self.slot(index), Some(BoundValue::Absent))
    }
}

/// Bind `params` in order, or report the first failure
pub fn bind(
    params: &[Param],
    captured: &CapturedArgs,
    actor: &Arc<dyn Actor>,
    parsers: &ParserRegistry,
) -> Result<BoundArgs, BindError> {
    let mut slots = Vec::with_capacity(params.len());

    for param in params {
        let slot = match param {
            Param::Sender { bind: true, kind } if kind.map_or(true, |k| k == actor.kind()) => {
                (None, BoundValue::Sender(Arc::clone(actor)))
            }
            Param::Sender { .. } | Param::Unbound => (None, BoundValue::Absent),
            Param::Arg { name, ty, .. } => {
                let (entry, shape) =
                    parsers
                        .lookup(ty.id)
                        .ok_or_else(|| BindError::NoParserForType {
                            param: name.clone(),
                            type_name: ty.name.to_string(),
                        })?;
                let tokens = captured.get(name).map(Vec::as_slice).unwrap_or_default();
                let value = entry.convert(shape, tokens).map_err(|failure| {
                    BindError::ParameterConversionFailed {
                        param: name.clone(),
                        token: failure.token,
                        message: failure.message,
                    }
                })?;
                (Some(name.clone()), BoundValue::Value(value))
            }
        };
        slots.push(slot);
    }

    Ok(BoundArgs { slots })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::TestActor;
    use crate::core::ActorKind;
    use std::path::PathBuf;

    fn captured(pairs: &[(&str, Vec<&str>)]) -> CapturedArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_binds_in_declaration_order() {
        let actor: Arc<dyn Actor> = Arc::new(TestActor::interactive("alice"));
        let params = vec![
            Param::sender(),
            Param::arg::<i64>("x"),
            Param::arg::<Vec<String>>("y"),
        ];
        let args = bind(
            &params,
            &captured(&[("x", vec!["5"]), ("y", vec!["a", "b"])]),
            &actor,
            &ParserRegistry::with_builtins(),
        )
        .unwrap();

        assert_eq!(args.len(), 3);
        assert_eq!(args.sender().unwrap().name(), "alice");
        assert_eq!(args.get::<i64>("x"), Some(&5));
        assert_eq!(args.at::<i64>(1), Some(&5));
        assert_eq!(
            args.get::<Vec<String>>("y"),
            Some(&vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(args.get::<String>("x"), None);
    }

    #[test]
    fn test_unbound_sender_keeps_slot() {
        let actor: Arc<dyn Actor> = Arc::new(TestActor::console());
        let params = vec![
            Param::Sender {
                bind: false,
                kind: None,
            },
            Param::sender_of(ActorKind::Interactive),
            Param::unbound(),
            Param::arg::<u32>("n"),
        ];
        let args = bind(
            &params,
            &captured(&[("n", vec!["7"])]),
            &actor,
            &ParserRegistry::with_builtins(),
        )
        .unwrap();

        assert!(args.is_absent(0));
        assert!(args.is_absent(1));
        assert!(args.is_absent(2));
        assert_eq!(args.at::<u32>(3), Some(&7));
        assert!(args.sender().is_none());
    }

    #[test]
    fn test_missing_parser() {
        let actor: Arc<dyn Actor> = Arc::new(TestActor::interactive("alice"));
        let err = bind(
            &[Param::arg::<PathBuf>("file")],
            &captured(&[("file", vec!["/tmp"])]),
            &actor,
            &ParserRegistry::with_builtins(),
        )
        .unwrap_err();
        assert!(matches!(err, BindError::NoParserForType { ref param, .. } if param == "file"));
    }

    #[test]
    fn test_conversion_failure_aborts() {
        let actor: Arc<dyn Actor> = Arc::new(TestActor::interactive("alice"));
        let err = bind(
            &[Param::arg::<i32>("a"), Param::arg::<i32>("b")],
            &captured(&[("a", vec!["1"]), ("b", vec!["two"])]),
            &actor,
            &ParserRegistry::with_builtins(),
        )
        .unwrap_err();
        match err {
            BindError::ParameterConversionFailed {
                param,
                token,
                message,
            } => {
                assert_eq!(param, "b");
                assert_eq!(token, "two");
                assert_eq!(message, "invalid digit found in string");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_variadic_binds_empty_vec() {
        let actor: Arc<dyn Actor> = Arc::new(TestActor::interactive("alice"));
        let args = bind(
            &[Param::arg::<Vec<i32>>("rest")],
            &captured(&[("rest", vec![])]),
            &actor,
            &ParserRegistry::with_builtins(),
        )
        .unwrap();
        assert_eq!(args.get::<Vec<i32>>("rest"), Some(&Vec::new()));
    }
}
