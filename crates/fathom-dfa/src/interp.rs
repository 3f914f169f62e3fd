use fathom_ir::{Access, Clazz, ClazzKind, CodeBlock, ConstData, Expr, Ir, MatchCase, Site};

use crate::call::{Args, CallId};
use crate::context::Context;
use crate::dfa::Dfa;
use crate::diagnostics::DiagnosticKind;
use crate::error::DfaError;
use crate::value::{Value, ValueId};

fn pop(stack: &mut Vec<ValueId>, site: Site) -> Result<ValueId, DfaError> {
    stack.pop().ok_or(DfaError::StackUnderflow { site })
}

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    /// Interpret `block` on behalf of `call`. Returns whether the end of the
    /// block was reached; a statement without a value voids the rest.
    pub(crate) fn process_code(&mut self, call: CallId, block: CodeBlock) -> Result<bool, DfaError> {
        let mut stack = Vec::new();
        for index in 0..self.ir().code_len(block) {
            let site = Site::new(block, index);
            self.site_reached(site);
            if !self.process_expr(call, site, &mut stack)? {
                return Ok(false);
            }
            self.site_completes(site);
        }
        Ok(true)
    }

    fn process_expr(
        &mut self,
        call: CallId,
        site: Site,
        stack: &mut Vec<ValueId>,
    ) -> Result<bool, DfaError> {
        let ir = self.ir();
        let expr = ir
            .expr(site)
            .ok_or_else(|| DfaError::malformed(site, "no statement at site"))?;
        let context = Context::Call(call);
        let pushed = match expr {
            Expr::Assign { target, .. } => {
                let target_value = pop(stack, site)?;
                let value = pop(stack, site)?;
                let args = std::iter::once(value).collect();
                return Ok(self
                    .access(call, site, *target, target_value, args, true)?
                    .is_some());
            }
            Expr::Call { target, args, .. } => {
                if stack.len() <= *args {
                    return Err(DfaError::StackUnderflow { site });
                }
                let first = stack.len() - *args;
                let args: Args = stack.drain(first..).collect();
                let target_value = pop(stack, site)?;
                self.access(call, site, *target, target_value, args, false)?
            }
            Expr::Box { reference, .. } => {
                let value = pop(stack, site)?;
                let env = self.call(call).env();
                Some(self.values.box_value(value, *reference, env, context)?)
            }
            Expr::Unbox { .. } => {
                let value = pop(stack, site)?;
                Some(self.values.unbox(value)?)
            }
            Expr::Tag { choice, tag, .. } => {
                let value = pop(stack, site)?;
                if value == ValueId::UNDEFINED {
                    Some(ValueId::UNDEFINED)
                } else {
                    Some(self.values.tagged(*choice, *tag, value))
                }
            }
            Expr::Match { cases, .. } => {
                let subject = pop(stack, site)?;
                return self.process_match(call, site, subject, cases);
            }
            Expr::Env { effect } => self.read_effect(call, site, *effect),
            Expr::Const { clazz, data } => Some(match *data {
                ConstData::Numeric(bits) => self.values.numeric(*clazz, Some(bits)),
                ConstData::Bool(b) => self.bool_const(b),
            }),
            Expr::Unit => Some(ValueId::UNIT),
            Expr::Current => Some(self.call(call).instance),
            Expr::Outer => Some(self.call(call).target()),
            Expr::Arg(i) => match self.call(call).args().get(*i) {
                Some(&arg) => Some(arg),
                None => {
                    return Err(DfaError::malformed(
                        site,
                        format!("argument {i} out of range"),
                    ));
                }
            },
            Expr::Pop => {
                pop(stack, site)?;
                return Ok(true);
            }
            Expr::Dup => {
                let top = *stack.last().ok_or(DfaError::StackUnderflow { site })?;
                Some(top)
            }
            Expr::Comment(_) => return Ok(true),
        };
        match pushed {
            Some(value) => {
                stack.push(value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Perform an access on every value `target` stands for and join the
    /// results. `None` if no access produced a value.
    fn access(
        &mut self,
        call: CallId,
        site: Site,
        static_target: Clazz,
        target: ValueId,
        args: Args,
        assign: bool,
    ) -> Result<Option<ValueId>, DfaError> {
        let accesses = self.ir().accessed_clazzes(site);
        let mut result = None;
        for component in self.values.components(target) {
            let value =
                self.access_single(call, site, static_target, component, &args, &accesses, assign)?;
            if let Some(v) = value {
                result = Some(match result {
                    Some(prev) => self.values.join(prev, v)?,
                    None => v,
                });
            }
        }
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn access_single(
        &mut self,
        call: CallId,
        site: Site,
        static_target: Clazz,
        target: ValueId,
        args: &Args,
        accesses: &[Access],
        assign: bool,
    ) -> Result<Option<ValueId>, DfaError> {
        let ir = self.ir();
        let target_clazz = match self.values.get(target) {
            Value::Undefined => return Ok(None),
            Value::Unit => static_target,
            value => value.clazz().ok_or_else(|| DfaError::NoAccessTarget {
                site,
                target: self.value_string(target),
            })?,
        };
        let value_clazz = ir.clazz_as_value(target_clazz);
        let mut callees: Vec<Clazz> = accesses
            .iter()
            .filter(|a| a.target == target_clazz || a.target == value_clazz)
            .map(|a| a.callee)
            .collect();
        callees.sort_unstable();
        callees.dedup();
        if callees.is_empty() {
            self.report_diagnostic(
                DiagnosticKind::MissingImplementation,
                Some(site),
                target_clazz,
                |dfa| {
                    (
                        dfa.pos_of(Some(site), target_clazz),
                        format!(
                            "no implementation for access on `{}`",
                            ir.clazz_name(target_clazz)
                        ),
                        dfa.render_context(Context::Call(call)),
                    )
                },
            );
            return Ok(None);
        }

        let mut result = None;
        for callee in callees {
            self.site_dispatches(site, callee);
            let unbox = ir.clazz_is_ref(target_clazz)
                && ir.clazz_outer(callee).is_some_and(|o| !ir.clazz_is_ref(o));
            let target = if unbox {
                self.values.unbox(target)?
            } else {
                target
            };
            let value = self.access_callee(call, site, callee, target, args, assign)?;
            if let Some(v) = value {
                result = Some(match result {
                    Some(prev) => self.values.join(prev, v)?,
                    None => v,
                });
            }
        }
        Ok(result)
    }

    fn access_callee(
        &mut self,
        call: CallId,
        site: Site,
        callee: Clazz,
        target: ValueId,
        args: &Args,
        assign: bool,
    ) -> Result<Option<ValueId>, DfaError> {
        let ir = self.ir();
        let context = Context::Call(call);
        match ir.clazz_kind(callee) {
            ClazzKind::Field if assign => {
                let value = args.first().copied().ok_or(DfaError::StackUnderflow { site })?;
                if !ir.clazz_result_is_unit(callee) {
                    self.set_field(target, callee, value)?;
                    let current = self.call(call);
                    if target != current.instance || self.escapes.contains(current.callee()) {
                        self.value_escapes(value);
                    }
                }
                Ok(Some(ValueId::UNIT))
            }
            ClazzKind::Abstract => {
                self.report_diagnostic(DiagnosticKind::AbstractCalled, Some(site), callee, |dfa| {
                    (
                        dfa.pos_of(Some(site), callee),
                        format!("call to abstract feature `{}`", ir.clazz_name(callee)),
                        dfa.render_context(context),
                    )
                });
                Ok(None)
            }
            ClazzKind::Choice => Err(DfaError::malformed(
                site,
                format!("choice clazz `{}` is not callable", ir.clazz_name(callee)),
            )),
            _ if assign => Err(DfaError::malformed(
                site,
                format!("assignment to non-field `{}`", ir.clazz_name(callee)),
            )),
            ClazzKind::Field | ClazzKind::Routine | ClazzKind::Intrinsic => {
                let env = self.call(call).env();
                if ir.clazz_precondition(callee).is_some() {
                    self.new_call(callee, true, Some(site), target, args.clone(), env, context)?;
                }
                let id = self.new_call(callee, false, Some(site), target, args.clone(), env, context)?;
                self.call_result(id)
            }
        }
    }

    /// Take every case some tagged component of `subject` selects. The match
    /// completes if one of the taken cases does.
    fn process_match(
        &mut self,
        call: CallId,
        site: Site,
        subject: ValueId,
        cases: &[MatchCase],
    ) -> Result<bool, DfaError> {
        let ir = self.ir();
        let mut tagged = Vec::new();
        for component in self.values.components(subject) {
            match self.values.get(component) {
                Value::Tagged { tag, original, .. } => tagged.push((*tag, *original)),
                Value::Undefined => {}
                _ => {
                    return Err(DfaError::UnexpectedMatchSubject {
                        site,
                        value: self.value_string(component),
                    });
                }
            }
        }
        let mut completes = false;
        for case in cases {
            let mut payload = None;
            for &(tag, original) in &tagged {
                if case.tags.contains(&tag) {
                    payload = Some(match payload {
                        Some(prev) => self.values.join(prev, original)?,
                        None => original,
                    });
                }
            }
            let Some(payload) = payload else {
                continue;
            };
            if let Some(field) = case.field {
                if !ir.clazz_result_is_unit(field) {
                    let instance = self.call(call).instance;
                    self.set_field(instance, field, payload)?;
                }
            }
            if self.process_code(call, case.code)? {
                completes = true;
            }
        }
        Ok(completes)
    }

    /// Currently installed value of `effect`, `None` if it is not installed.
    fn read_effect(&mut self, call: CallId, site: Site, effect: Clazz) -> Option<ValueId> {
        let ir = self.ir();
        let (group, env) = {
            let c = self.call(call);
            (c.group, c.env())
        };
        self.needs_effect(group, effect);
        let value = self.get_effect(env, effect);
        if value.is_none() {
            self.report_diagnostic(
                DiagnosticKind::EffectNotInstalled,
                Some(site),
                effect,
                |dfa| {
                    (
                        dfa.pos_of(Some(site), effect),
                        format!("effect `{}` is not installed", ir.clazz_name(effect)),
                        dfa.render_context(Context::Call(call)),
                    )
                },
            );
        }
        value
    }
}
