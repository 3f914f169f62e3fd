use std::cmp::Ordering;

use fathom_ir::{Ir, SpecialClazz};

use super::{IntrinsicRegistry, any_result};
use crate::call::CallId;
use crate::dfa::Dfa;
use crate::error::DfaError;
use crate::value::{Value, ValueId};

/// Operators whose result is never narrowed.
pub const ARITHMETIC: [&str; 11] = [
    "add", "sub", "mul", "div", "rem", "neg", "and", "or", "xor", "shl", "shr",
];

pub const COMPARISONS: [&str; 6] = ["eq", "ne", "lt", "le", "gt", "ge"];

pub(super) fn register<I: Ir + ?Sized>(registry: &mut IntrinsicRegistry<I>) {
    for ty in SpecialClazz::NUMERIC {
        for op in ARITHMETIC {
            registry.register(format!("{}.{op}", ty.name()), any_result::<I>);
        }
        registry.register(format!("{}.eq", ty.name()), eq::<I>);
        registry.register(format!("{}.ne", ty.name()), ne::<I>);
        registry.register(format!("{}.lt", ty.name()), lt::<I>);
        registry.register(format!("{}.le", ty.name()), le::<I>);
        registry.register(format!("{}.gt", ty.name()), gt::<I>);
        registry.register(format!("{}.ge", ty.name()), ge::<I>);
        for to in SpecialClazz::NUMERIC {
            if to != ty {
                registry.register(format!("{}.as_{}", ty.name(), to.name()), cast::<I>);
            }
        }
    }
}

/// A concrete numeric, normalized for comparison.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
enum Number {
    Int(i128),
    Float(f64),
}

fn decode(ty: SpecialClazz, bits: i64) -> Number {
    let width = ty.bits();
    match ty {
        SpecialClazz::F32 => Number::Float(f64::from(f32::from_bits(bits as u32))),
        SpecialClazz::F64 => Number::Float(f64::from_bits(bits as u64)),
        _ if ty.is_signed() => {
            let shift = 64 - width;
            Number::Int(i128::from((bits << shift) >> shift))
        }
        _ => {
            let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
            Number::Int(i128::from(bits as u64 & mask))
        }
    }
}

fn encode(ty: SpecialClazz, number: Number) -> i64 {
    match (ty, number) {
        (SpecialClazz::F32, Number::Int(v)) => i64::from((v as f32).to_bits()),
        (SpecialClazz::F32, Number::Float(v)) => i64::from((v as f32).to_bits()),
        (SpecialClazz::F64, Number::Int(v)) => (v as f64).to_bits() as i64,
        (SpecialClazz::F64, Number::Float(v)) => v.to_bits() as i64,
        // float to integer saturates, NaN becomes zero
        (_, Number::Float(v)) => {
            let (min, max) = int_range(ty);
            wrap(ty, (v as i128).clamp(min, max))
        }
        (_, Number::Int(v)) => wrap(ty, v),
    }
}

/// Smallest and largest value of an integer type.
fn int_range(ty: SpecialClazz) -> (i128, i128) {
    let width = ty.bits();
    if ty.is_signed() {
        (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1)
    } else {
        (0, (1i128 << width) - 1)
    }
}

fn wrap(ty: SpecialClazz, value: i128) -> i64 {
    match decode(ty, value as i64) {
        Number::Int(v) => v as i64,
        Number::Float(v) => v.to_bits() as i64,
    }
}

/// The concrete number `value` stands for, if it is exactly known.
fn exact<I: Ir + ?Sized>(dfa: &Dfa<'_, I>, value: ValueId) -> Option<(SpecialClazz, Number)> {
    match dfa.values().get(value) {
        Value::Numeric {
            clazz,
            bits: Some(bits),
        } => {
            let ty = dfa.ir().special_clazz(*clazz)?;
            ty.is_numeric().then(|| (ty, decode(ty, *bits)))
        }
        _ => None,
    }
}

/// Target and first argument of a binary operator, compared if both are
/// exactly known.
fn compare<I: Ir + ?Sized>(
    dfa: &mut Dfa<'_, I>,
    call: CallId,
    test: fn(Option<Ordering>) -> bool,
) -> Result<Option<ValueId>, DfaError> {
    let (target, other) = {
        let c = dfa.call(call);
        (c.target(), c.args().first().copied())
    };
    let Some(other) = other else {
        return Err(DfaError::MalformedIr {
            site: dfa.call(call).site,
            reason: "comparison without operand".to_string(),
        });
    };
    match (exact(dfa, target), exact(dfa, other)) {
        (Some((_, a)), Some((_, b))) => Ok(Some(dfa.bool_const(test(a.partial_cmp(&b))))),
        _ => dfa.bool_any().map(Some),
    }
}

fn eq<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, call: CallId) -> Result<Option<ValueId>, DfaError> {
    compare(dfa, call, |o| o == Some(Ordering::Equal))
}

fn ne<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, call: CallId) -> Result<Option<ValueId>, DfaError> {
    compare(dfa, call, |o| o != Some(Ordering::Equal))
}

fn lt<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, call: CallId) -> Result<Option<ValueId>, DfaError> {
    compare(dfa, call, |o| o == Some(Ordering::Less))
}

fn le<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, call: CallId) -> Result<Option<ValueId>, DfaError> {
    compare(dfa, call, |o| matches!(o, Some(Ordering::Less | Ordering::Equal)))
}

fn gt<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, call: CallId) -> Result<Option<ValueId>, DfaError> {
    compare(dfa, call, |o| o == Some(Ordering::Greater))
}

fn ge<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, call: CallId) -> Result<Option<ValueId>, DfaError> {
    compare(dfa, call, |o| matches!(o, Some(Ordering::Greater | Ordering::Equal)))
}

/// Conversion to the callee's result type; exact if the target is.
fn cast<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, call: CallId) -> Result<Option<ValueId>, DfaError> {
    let ir = dfa.ir();
    let (callee, target) = {
        let c = dfa.call(call);
        (c.callee(), c.target())
    };
    let result = ir.clazz_result_clazz(callee);
    let to = ir.special_clazz(result).filter(|s| s.is_numeric());
    match (to, exact(dfa, target)) {
        (Some(to), Some((_, number))) => {
            Ok(Some(dfa.values_mut().numeric(result, Some(encode(to, number)))))
        }
        _ => dfa.any_value(result).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoding_respects_width_and_sign() {
        assert_eq!(decode(SpecialClazz::I8, 0xff), Number::Int(-1));
        assert_eq!(decode(SpecialClazz::U8, 0xff), Number::Int(255));
        assert_eq!(decode(SpecialClazz::U8, 0x1ff), Number::Int(255));
        assert_eq!(decode(SpecialClazz::U64, -1), Number::Int(u64::MAX as i128));
        assert_eq!(decode(SpecialClazz::I64, -1), Number::Int(-1));
        assert_eq!(
            decode(SpecialClazz::F64, 2.5f64.to_bits() as i64),
            Number::Float(2.5)
        );
    }

    #[test]
    fn casts() {
        assert_eq!(encode(SpecialClazz::U8, Number::Int(-1)), 255);
        assert_eq!(encode(SpecialClazz::I8, Number::Int(200)), -56);
        assert_eq!(encode(SpecialClazz::I32, Number::Float(-3.75)), -3);
        assert_eq!(
            encode(SpecialClazz::F64, Number::Int(3)),
            3.0f64.to_bits() as i64
        );
    }

    #[test]
    fn float_to_integer_saturates() {
        assert_eq!(
            encode(SpecialClazz::I32, Number::Float(3.0e9)),
            i64::from(i32::MAX)
        );
        assert_eq!(
            encode(SpecialClazz::I32, Number::Float(-3.0e9)),
            i64::from(i32::MIN)
        );
        assert_eq!(encode(SpecialClazz::U8, Number::Float(-1.5)), 0);
        assert_eq!(encode(SpecialClazz::U8, Number::Float(1.0e3)), 255);
        assert_eq!(encode(SpecialClazz::I64, Number::Float(f64::NAN)), 0);
        assert_eq!(encode(SpecialClazz::U64, Number::Float(f64::INFINITY)), -1);
        // a saturated constant still compares as the type's maximum
        assert_eq!(
            decode(SpecialClazz::I32, encode(SpecialClazz::I32, Number::Float(3.0e9))),
            Number::Int(i128::from(i32::MAX))
        );
    }
}
