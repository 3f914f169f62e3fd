use fathom_ir::{Clazz, Ir};

use super::{
    EFFECT_ABORT, EFFECT_ABORTABLE, EFFECT_DEFAULT, EFFECT_IS_INSTALLED, EFFECT_REPLACE,
    IntrinsicRegistry,
};
use crate::call::{Args, CallId};
use crate::context::Context;
use crate::dfa::Dfa;
use crate::error::DfaError;
use crate::value::ValueId;

pub(super) fn register<I: Ir + ?Sized>(registry: &mut IntrinsicRegistry<I>) {
    registry.register(EFFECT_DEFAULT, default::<I>);
    registry.register(EFFECT_REPLACE, replace::<I>);
    registry.register(EFFECT_ABORTABLE, abortable::<I>);
    registry.register(EFFECT_ABORT, abort::<I>);
    registry.register(EFFECT_IS_INSTALLED, is_installed::<I>);
}

/// Effect type an effect operation works on: its declared effect type, or
/// the clazz it is declared in.
fn effect_of<I: Ir + ?Sized>(dfa: &Dfa<'_, I>, call: CallId) -> Result<Clazz, DfaError> {
    let c = dfa.call(call);
    let ir = dfa.ir();
    ir.effect_type(c.callee())
        .or_else(|| ir.clazz_outer(c.callee()))
        .ok_or_else(|| DfaError::MalformedIr {
            site: c.site,
            reason: format!("`{}` has no effect type", ir.clazz_name(c.callee())),
        })
}

fn default<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, call: CallId) -> Result<Option<ValueId>, DfaError> {
    let effect = effect_of(dfa, call)?;
    let (env, value) = (dfa.call(call).env(), dfa.call(call).target());
    dfa.set_default_effect(env, effect, value)?;
    Ok(Some(ValueId::UNIT))
}

fn replace<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, call: CallId) -> Result<Option<ValueId>, DfaError> {
    let effect = effect_of(dfa, call)?;
    let (env, value) = (dfa.call(call).env(), dfa.call(call).target());
    dfa.replace_effect(env, effect, value)?;
    Ok(Some(ValueId::UNIT))
}

/// Install the target as the effect and run the code passed as first
/// argument under it. Returns if that code returns or the effect was aborted.
fn abortable<I: Ir + ?Sized>(
    dfa: &mut Dfa<'_, I>,
    call: CallId,
) -> Result<Option<ValueId>, DfaError> {
    let ir = dfa.ir();
    let effect = effect_of(dfa, call)?;
    let (env, value, site, code) = {
        let c = dfa.call(call);
        (c.env(), c.target(), c.site, c.args().first().copied())
    };
    let Some(code) = code else {
        return Err(DfaError::MalformedIr {
            site,
            reason: format!("{EFFECT_ABORTABLE} without code argument"),
        });
    };
    let inner_env = dfa.new_env(env, effect, value, Some(call))?;
    let mut returns = false;
    for lambda in dfa.values().components(code) {
        let Some(routine) = dfa.values().get(lambda).clazz().and_then(|c| ir.lookup_call(c))
        else {
            continue;
        };
        let target = dfa.values_mut().unbox(lambda)?;
        let inner = dfa.new_call(
            routine,
            false,
            site,
            target,
            Args::new(),
            Some(inner_env),
            Context::Call(call),
        )?;
        returns |= dfa.call_result(inner)?.is_some();
    }
    let aborted = dfa
        .envs()
        .frame(inner_env, effect)
        .is_some_and(|frame| dfa.env(frame).aborted);
    if returns || aborted {
        Ok(Some(ValueId::UNIT))
    } else {
        Ok(None)
    }
}

fn abort<I: Ir + ?Sized>(dfa: &mut Dfa<'_, I>, call: CallId) -> Result<Option<ValueId>, DfaError> {
    let effect = effect_of(dfa, call)?;
    let (env, value) = (dfa.call(call).env(), dfa.call(call).target());
    dfa.abort_effect(env, effect, value)?;
    Ok(None)
}

fn is_installed<I: Ir + ?Sized>(
    dfa: &mut Dfa<'_, I>,
    call: CallId,
) -> Result<Option<ValueId>, DfaError> {
    let effect = effect_of(dfa, call)?;
    let env = dfa.call(call).env();
    if dfa.get_effect(env, effect).is_some() {
        Ok(Some(dfa.bool_const(true)))
    } else {
        dfa.bool_any().map(Some)
    }
}
