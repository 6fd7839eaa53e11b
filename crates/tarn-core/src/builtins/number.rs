//! Arithmetic.

use crate::{Error, Function, Signature, Thunk, Value};

use super::{lazy, strict};

/// `add(numbers...)`
pub fn add() -> Function {
    fold("add", 0.0, |a, b| a + b)
}

/// `mul(numbers...)`
pub fn mul() -> Function {
    fold("mul", 1.0, |a, b| a * b)
}

/// `sub(initial, numbers...)`
pub fn sub() -> Function {
    reduce("sub", |a, b| a - b)
}

/// `div(initial, numbers...)`
pub fn div() -> Function {
    reduce("div", |a, b| a / b)
}

/// `floor_div(initial, numbers...)`
pub fn floor_div() -> Function {
    reduce("floor_div", |a, b| (a / b).floor())
}

/// `mod(dividend, divisor)`: the remainder has the sign of the dividend.
pub fn modulo() -> Function {
    binary("mod", |a, b| a % b)
}

/// `pow(base, exponent)`
pub fn pow() -> Function {
    binary("pow", f64::powf)
}

fn fold(name: &'static str, identity: f64, op: fn(f64, f64) -> f64) -> Function {
    lazy(name, Signature::new().rest_positionals("numbers"), move |args| {
        let total = accumulate(identity, &args[0], op)?;
        Ok(Thunk::new(total))
    })
}

fn reduce(name: &'static str, op: fn(f64, f64) -> f64) -> Function {
    lazy(
        name,
        Signature::with_positionals(["initial"]).rest_positionals("numbers"),
        move |args| {
            let initial = args[0].force().into_number()?;
            let total = accumulate(initial, &args[1], op)?;
            Ok(Thunk::new(total))
        },
    )
}

fn accumulate(initial: f64, numbers: &Thunk, op: fn(f64, f64) -> f64) -> Result<f64, Error> {
    let mut total = initial;
    for n in numbers.force().into_list()?.iter() {
        total = op(total, n?.force().into_number()?);
    }
    Ok(total)
}

fn binary(name: &'static str, op: fn(f64, f64) -> f64) -> Function {
    strict(
        name,
        Signature::with_positionals(["first", "second"]),
        move |args| {
            let a = args[0].clone().into_number()?;
            let b = args[1].clone().into_number()?;
            Ok(Thunk::new(Value::Number(op(a, b))))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arguments, ErrorKind};

    fn call(function: Function, ns: &[f64]) -> Value {
        Thunk::app(function, Arguments::positional(ns.iter().map(|&n| Thunk::new(n)))).force()
    }

    #[test]
    fn test_variadic() {
        assert_eq!(call(add(), &[]).into_number().unwrap(), 0.0);
        assert_eq!(call(add(), &[1.0, 2.0, 3.0]).into_number().unwrap(), 6.0);
        assert_eq!(call(mul(), &[2.0, 3.0, 4.0]).into_number().unwrap(), 24.0);
        assert_eq!(call(sub(), &[10.0, 1.0, 2.0]).into_number().unwrap(), 7.0);
        assert_eq!(call(sub(), &[10.0]).into_number().unwrap(), 10.0);
        assert_eq!(call(div(), &[12.0, 2.0, 3.0]).into_number().unwrap(), 2.0);
        assert_eq!(call(floor_div(), &[7.0, 2.0]).into_number().unwrap(), 3.0);
    }

    #[test]
    fn test_binary() {
        assert_eq!(call(modulo(), &[7.0, 3.0]).into_number().unwrap(), 1.0);
        assert_eq!(call(modulo(), &[-7.0, 3.0]).into_number().unwrap(), -1.0);
        assert_eq!(call(pow(), &[2.0, 10.0]).into_number().unwrap(), 1024.0);
        assert!(call(pow(), &[2.0]).check().unwrap_err().is(ErrorKind::ArityError));
    }

    #[test]
    fn test_non_number() {
        let result = Thunk::app(
            add(),
            Arguments::positional([Thunk::new(1.0), Thunk::new("two")]),
        )
        .force();
        assert!(result.check().unwrap_err().is(ErrorKind::TypeError));
    }
}
