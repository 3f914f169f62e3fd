use fathom_ir::Ir;

use super::{IntrinsicRegistry, any_result, no_return};
use crate::call::{Args, CallId};
use crate::context::Context;
use crate::dfa::Dfa;
use crate::error::DfaError;
use crate::value::{Value, ValueId};

pub(super) fn register<I: Ir + ?Sized>(registry: &mut IntrinsicRegistry<I>) {
    registry.register("sys.array.alloc", array_alloc::<I>);
    registry.register("sys.array.get", array_get::<I>);
    registry.register("sys.array.set", array_set::<I>);
    registry.register("sys.thread.spawn", thread_spawn::<I>);
    registry.register("sys.thread.join", any_result::<I>);
    registry.register("sys.exit", no_return::<I>);
    registry.register("sys.fault", no_return::<I>);
    registry.register("sys.args.count", any_result::<I>);
    registry.register("sys.time.nanos", any_result::<I>);
    registry.register("safety", safety::<I>);
    registry.register("debug", debug::<I>);
    registry.register("debug_level", debug_level::<I>);
}

fn arg<I: Ir + ?Sized>(dfa: &Dfa<'_, I>, call: CallId, index: usize) -> Result<ValueId, DfaError> {
    let c = dfa.call(call);
    c.args()
        .get(index)
        .copied()
        .ok_or_else(|| DfaError::MalformedIr {
            site: c.site,
            reason: format!("`{}` expects argument {index}", dfa.ir().clazz_name(c.callee())),
        })
}

/// A fresh array of the first actual generic, one per allocation site.
fn array_alloc<I: Ir + ?Sized>(
    dfa: &mut Dfa<'_, I>,
    call: CallId,
) -> Result<Option<ValueId>, DfaError> {
    let c = dfa.call(call);
    let (callee, site) = (c.callee(), c.site);
    let Some(&element) = dfa.ir().clazz_generics(callee).first() else {
        return Err(DfaError::MalformedIr {
            site,
            reason: "array allocation without element type".to_string(),
        });
    };
    Ok(Some(
        dfa.values_mut()
            .sys_array(element, site, Context::Call(call)),
    ))
}

/// `array[index]`: the joined element slot, `None` while nothing was stored.
fn array_get<I: Ir + ?Sized>(
    dfa: &mut Dfa<'_, I>,
    call: CallId,
) -> Result<Option<ValueId>, DfaError> {
    let array = arg(dfa, call, 0)?;
    let mut result = ValueId::UNDEFINED;
    for component in dfa.values().components(array) {
        if let Value::SysArray { .. } = dfa.values().get(component) {
            let elements = dfa.values().elements(component);
            result = dfa.values_mut().join(result, elements)?;
        }
    }
    Ok((result != ValueId::UNDEFINED).then_some(result))
}

/// `array[index] := value`.
fn array_set<I: Ir + ?Sized>(
    dfa: &mut Dfa<'_, I>,
    call: CallId,
) -> Result<Option<ValueId>, DfaError> {
    let array = arg(dfa, call, 0)?;
    let value = arg(dfa, call, 2)?;
    dfa.value_escapes(value);
    for component in dfa.values().components(array) {
        if let Value::SysArray { .. } = dfa.values().get(component) {
            if dfa.values_mut().join_elements(component, value)? {
                dfa.was_changed(|dfa| {
                    format!(
                        "elements of {} widened to {}",
                        dfa.value_string(component),
                        dfa.value_string(value)
                    )
                });
            }
        }
    }
    Ok(Some(ValueId::UNIT))
}

/// Run the code passed as first argument in a new thread, i.e. as a call
/// without effect environment.
fn thread_spawn<I: Ir + ?Sized>(
    dfa: &mut Dfa<'_, I>,
    call: CallId,
) -> Result<Option<ValueId>, DfaError> {
    let ir = dfa.ir();
    let code = arg(dfa, call, 0)?;
    let site = dfa.call(call).site;
    dfa.value_escapes(code);
    for lambda in dfa.values().components(code) {
        let Some(routine) = dfa.values().get(lambda).clazz().and_then(|c| ir.lookup_call(c))
        else {
            continue;
        };
        let target = dfa.values_mut().unbox(lambda)?;
        dfa.new_call(
            routine,
            false,
            site,
            target,
            Args::new(),
            None,
            Context::Call(call),
        )?;
    }
    any_result(dfa, call)
}

fn safety<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, _call: CallId) -> Result<Option<ValueId>, DfaError> {
    let safety = dfa.options().safety;
    Ok(Some(dfa.bool_const(safety)))
}

fn debug<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, _call: CallId) -> Result<Option<ValueId>, DfaError> {
    let debug = dfa.options().debug;
    Ok(Some(dfa.bool_const(debug)))
}

fn debug_level<I: Ir + ?Sized>(
    dfa: &mut Dfa<'_, I>,
    call: CallId,
) -> Result<Option<ValueId>, DfaError> {
    let result = dfa.ir().clazz_result_clazz(dfa.call(call).callee());
    if dfa.ir().clazz_is_numeric(result) {
        let level = dfa.options().debug_level;
        Ok(Some(dfa.values_mut().numeric(result, Some(level))))
    } else {
        dfa.any_value(result).map(Some)
    }
}
