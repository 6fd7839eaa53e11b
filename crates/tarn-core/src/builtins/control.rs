//! Control flow, errors and effects.

use crate::{Arguments, Dictionary, Effect, Error, Function, Signature, Thunk, Value};

use super::{lazy, strict};

/// `if(condition, value, condition, value, ..., default)`
///
/// Conditions are forced in order until one is true; only the chosen branch
/// is returned, unevaluated.
pub fn if_() -> Function {
    lazy("if", Signature::new().rest_positionals("branches"), |args| {
        let mut branches = args[0].clone();
        loop {
            let list = branches.force().into_list()?;
            let (condition, rest) = list
                .uncons()
                .ok_or_else(|| Error::arity_error("if needs a default branch"))?;
            let rest = rest.force().into_list()?;
            let Some((value, next)) = rest.uncons() else {
                return Ok(condition.clone());
            };
            if condition.force().into_boolean()? {
                return Ok(value.clone());
            }
            branches = next.clone();
        }
    })
}

/// `identity(value)`
pub fn identity() -> Function {
    lazy("identity", Signature::with_positionals(["value"]), |args| {
        Ok(args[0].clone())
    })
}

/// `partial(function, arguments..., ..keywords)`: fix leading arguments of a
/// function.
pub fn partial() -> Function {
    lazy(
        "partial",
        Signature::with_positionals(["function"])
            .rest_positionals("arguments")
            .rest_keywords("keywords"),
        |args| {
            let function = args[0].force().into_function()?;
            let fixed = Arguments::new()
                .spread(args[1].clone())
                .spread_keywords(args[2].clone());
            Ok(Thunk::new(function.partial(fixed)))
        },
    )
}

/// `error(name, message)`
pub fn error() -> Function {
    strict(
        "error",
        Signature::with_positionals(["name", "message"]),
        |args| {
            let name = args[0].clone().into_string()?;
            let message = args[1].clone().into_string()?;
            Ok(Thunk::new(Error::new(name, message)))
        },
    )
}

/// `catch(value)`: an error becomes a `{"name" ..., "message" ...}`
/// dictionary; any other value is returned as is.
pub fn catch() -> Function {
    lazy("catch", Signature::with_positionals(["value"]), |args| {
        match args[0].force() {
            Value::Error(e) => {
                let caught = Dictionary::new()
                    .insert(Value::from("name"), Thunk::new(e.name()))?
                    .insert(Value::from("message"), Thunk::new(e.message()))?;
                Ok(Thunk::new(caught))
            }
            _ => Ok(args[0].clone()),
        }
    })
}

/// `effect(value)`: wrap a value so only impure evaluation can unwrap it.
pub fn effect() -> Function {
    lazy("effect", Signature::with_positionals(["value"]), |args| {
        Ok(Thunk::new(Effect::new(args[0].clone())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_if_picks_first_true_branch() {
        let poisoned = Thunk::new(Error::value_error("not chosen"));
        let args = Arguments::positional([
            Thunk::new(false),
            poisoned.clone(),
            Thunk::new(true),
            Thunk::new("yes"),
            poisoned,
        ]);
        let result = Thunk::app(if_(), args).force();
        assert_eq!(&*result.into_string().unwrap(), "yes");
    }

    #[test]
    fn test_if_default() {
        let args = Arguments::positional([Thunk::new(false), Thunk::new(1.0), Thunk::new(2.0)]);
        assert_eq!(Thunk::app(if_(), args).force().into_number().unwrap(), 2.0);
    }

    #[test]
    fn test_if_errors() {
        let empty = Thunk::app(if_(), Arguments::new()).force();
        assert!(empty.check().unwrap_err().is(ErrorKind::ArityError));

        let args = Arguments::positional([Thunk::new(1.0), Thunk::new(1.0), Thunk::new(2.0)]);
        let non_boolean = Thunk::app(if_(), args).force();
        assert!(non_boolean.check().unwrap_err().is(ErrorKind::TypeError));
    }

    #[test]
    fn test_identity() {
        let value = Thunk::suspend(|| Thunk::new(3.0));
        let result = Thunk::app(identity(), Arguments::positional([value.clone()]));
        assert_eq!(result.force().into_number().unwrap(), 3.0);
        assert!(value.is_evaluated());
    }

    #[test]
    fn test_partial() {
        let sub = super::super::sub();
        let minus_from_ten = Thunk::app(
            partial(),
            Arguments::positional([Thunk::new(sub), Thunk::new(10.0)]),
        );
        let result = Thunk::app(minus_from_ten, Arguments::positional([Thunk::new(3.0)]));
        assert_eq!(result.force().into_number().unwrap(), 7.0);
    }

    #[test]
    fn test_error_and_catch() {
        let raised = Thunk::app(
            error(),
            Arguments::positional([Thunk::new("MyError"), Thunk::new("oops")]),
        );
        let caught = Thunk::app(catch(), Arguments::positional([raised]))
            .force()
            .into_dictionary()
            .unwrap();

        let name = caught.index(&Value::from("name")).unwrap().force();
        assert_eq!(&*name.into_string().unwrap(), "MyError");
        let message = caught.index(&Value::from("message")).unwrap().force();
        assert_eq!(&*message.into_string().unwrap(), "oops");
    }

    #[test]
    fn test_catch_passes_values() {
        let result = Thunk::app(catch(), Arguments::positional([Thunk::new(5.0)]));
        assert_eq!(result.force().into_number().unwrap(), 5.0);
    }

    #[test]
    fn test_effect() {
        let wrapped = Thunk::app(effect(), Arguments::positional([Thunk::new(1.0)]));
        assert!(wrapped.force().check().unwrap_err().is(ErrorKind::ImpureFunctionError));
        assert_eq!(wrapped.force_impure().into_number().unwrap(), 1.0);
    }
}
