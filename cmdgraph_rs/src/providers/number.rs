//! Boolean, integer and float providers.

use std::any::Any;
use std::marker::PhantomData;

use crate::binding::Provider;
use crate::error::{ArgumentError, ProvideError};
use crate::stream::ArgumentStream;
use crate::tag::{Tag, find_range};

/// Parse `0x..` (hex), `0b..` (binary) or a decimal integer, falling back to a
/// float truncated toward zero.
fn parse_integer(input: &str) -> Result<i128, ArgumentError> {
    let not_a_number = || ArgumentError::parse(format!("Expected '{input}' to be a number"));

    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let radix = if let Some(hex) = digits.strip_prefix("0x") {
        Some((hex, 16))
    } else {
        digits.strip_prefix("0b").map(|bin| (bin, 2))
    };

    let value = match radix {
        Some((body, radix)) => i128::from_str_radix(body, radix).map_err(|_| not_a_number())?,
        None => match digits.parse::<i128>() {
            Ok(v) => v,
            Err(_) => {
                let float: f64 = digits.parse().map_err(|_| not_a_number())?;
                if !float.is_finite() {
                    return Err(not_a_number());
                }
                float.trunc() as i128
            }
        },
    };
    Ok(if negative { -value } else { value })
}

fn parse_float(input: &str) -> Result<f64, ArgumentError> {
    let not_a_number = || ArgumentError::parse(format!("Expected '{input}' to be a number"));
    let unsigned = input.strip_prefix('-').unwrap_or(input);
    if unsigned.starts_with("0x") || unsigned.starts_with("0b") {
        return parse_integer(input).map(|v| v as f64);
    }
    input.parse::<f64>().map_err(|_| not_a_number())
}

/// Apply every `Tag::Range` bound (inclusive).
pub fn validate_range(value: f64, display: &str, tags: &[Tag]) -> Result<(), ArgumentError> {
    let Some((min, max)) = find_range(tags) else {
        return Ok(());
    };
    if let Some(min) = min.filter(|min| value < *min) {
        return Err(ArgumentError::parse(format!(
            "A valid value is greater than or equal to {min} (you entered {display})"
        )));
    }
    if let Some(max) = max.filter(|max| value > *max) {
        return Err(ArgumentError::parse(format!(
            "A valid value is less than or equal to {max} (you entered {display})"
        )));
    }
    Ok(())
}

/// Provider for every primitive integer type.
pub struct IntegerProvider<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> IntegerProvider<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for IntegerProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Provider for IntegerProvider<T>
where
    T: TryFrom<i128> + Any + Send,
{
    type Output = T;

    fn get(&self, stream: &mut dyn ArgumentStream, tags: &[Tag]) -> Result<T, ProvideError> {
        let token = stream.next()?;
        let value = parse_integer(&token)?;
        validate_range(value as f64, &value.to_string(), tags)?;
        T::try_from(value).map_err(|_| {
            ArgumentError::parse(format!(
                "'{token}' is out of range for {}",
                std::any::type_name::<T>()
            ))
            .into()
        })
    }
}

/// `f32` and `f64` conversion from the shared float parser.
pub trait FloatValue: Any + Send {
    fn from_f64(value: f64) -> Self;
}

impl FloatValue for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }
}

impl FloatValue for f32 {
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

pub struct FloatProvider<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> FloatProvider<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for FloatProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatValue> Provider for FloatProvider<T> {
    type Output = T;

    fn get(&self, stream: &mut dyn ArgumentStream, tags: &[Tag]) -> Result<T, ProvideError> {
        let token = stream.next()?;
        let value = parse_float(&token)?;
        validate_range(value, &value.to_string(), tags)?;
        Ok(T::from_f64(value))
    }
}

pub struct BooleanProvider;

impl Provider for BooleanProvider {
    type Output = bool;

    fn get(&self, stream: &mut dyn ArgumentStream, _tags: &[Tag]) -> Result<bool, ProvideError> {
        Ok(stream.next_bool()?)
    }

    fn suggest(
        &self,
        prefix: &str,
        _namespace: &crate::namespace::Namespace,
        _tags: &[Tag],
    ) -> Vec<String> {
        ["true", "false"]
            .iter()
            .filter(|v| v.starts_with(&prefix.to_ascii_lowercase()))
            .map(|v| v.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StringListStream;

    fn read<P: Provider>(provider: &P, token: &str, tags: &[Tag]) -> Result<P::Output, ProvideError> {
        let mut stream = StringListStream::detached([token]);
        provider.get(&mut stream, tags)
    }

    #[test]
    fn test_integer_prefixes() {
        let provider = IntegerProvider::<i32>::new();
        assert_eq!(read(&provider, "42", &[]).expect("decimal"), 42);
        assert_eq!(read(&provider, "0x1f", &[]).expect("hex"), 31);
        assert_eq!(read(&provider, "0b101", &[]).expect("binary"), 5);
        assert_eq!(read(&provider, "-0x10", &[]).expect("negative hex"), -16);
        assert_eq!(read(&provider, "7.9", &[]).expect("truncated"), 7);
    }

    #[test]
    fn test_integer_errors() {
        let provider = IntegerProvider::<u8>::new();
        let err = read(&provider, "abc", &[]).unwrap_err();
        assert_eq!(err.to_string(), "Expected 'abc' to be a number");
        let err = read(&provider, "300", &[]).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_range_messages() {
        let provider = IntegerProvider::<i64>::new();
        let tags = [Tag::Range {
            min: Some(1.0),
            max: Some(10.0),
        }];
        assert_eq!(read(&provider, "10", &tags).expect("in range"), 10);
        let err = read(&provider, "0", &tags).unwrap_err();
        assert_eq!(
            err.to_string(),
            "A valid value is greater than or equal to 1 (you entered 0)"
        );
        let err = read(&provider, "11", &tags).unwrap_err();
        assert_eq!(
            err.to_string(),
            "A valid value is less than or equal to 10 (you entered 11)"
        );
    }

    #[test]
    fn test_floats() {
        let provider = FloatProvider::<f64>::new();
        assert_eq!(read(&provider, "2.5", &[]).expect("float"), 2.5);
        assert_eq!(read(&provider, "0x10", &[]).expect("hex float"), 16.0);
        let provider = FloatProvider::<f32>::new();
        assert_eq!(read(&provider, "1.5", &[]).expect("f32"), 1.5_f32);
        assert!(read(&provider, "x", &[]).is_err());
    }

    #[test]
    fn test_boolean() {
        assert!(read(&BooleanProvider, "YES", &[]).expect("yes"));
        assert!(!read(&BooleanProvider, "0", &[]).expect("zero"));
        let ns = crate::namespace::Namespace::new();
        assert_eq!(BooleanProvider.suggest("t", &ns, &[]), vec!["true"]);
    }
}
