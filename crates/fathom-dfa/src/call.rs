use fathom_ir::{Clazz, ClazzKind, Ir, Site, identifier};
use smallvec::SmallVec;

use crate::call_group::CallGroupId;
use crate::context::Context;
use crate::dfa::Dfa;
use crate::env::EnvId;
use crate::error::DfaError;
use crate::value::ValueId;

identifier! {
    /// Handle to an abstract call.
    struct CallId
}

pub type Args = SmallVec<[ValueId; 4]>;

/// Identity of a call. Two requests with equal keys are the same call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallKey {
    pub callee: Clazz,
    /// Analyzes the callee's precondition instead of its body.
    pub pre: bool,
    pub target: ValueId,
    pub args: Args,
    pub env: Option<EnvId>,
    /// Only set when the analysis is site sensitive.
    pub site: Option<Site>,
}

#[derive(Clone, Debug)]
pub struct Call {
    pub key: CallKey,
    /// The `self` instance of a routine, unit for everything else.
    pub instance: ValueId,
    /// Whether some analysis of the body reached its end.
    pub returns: bool,
    pub context: Context,
    /// Site of the first access that created the call.
    pub site: Option<Site>,
    pub group: CallGroupId,
}

impl Call {
    pub fn callee(&self) -> Clazz {
        self.key.callee
    }

    pub fn target(&self) -> ValueId {
        self.key.target
    }

    pub fn args(&self) -> &[ValueId] {
        &self.key.args
    }

    pub fn env(&self) -> Option<EnvId> {
        self.key.env
    }
}

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    pub fn call(&self, id: CallId) -> &Call {
        &self.calls[id]
    }

    pub fn calls(&self) -> impl Iterator<Item = (CallId, &Call)> {
        self.calls.iter()
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// Find or create the call identified by the given key parts.
    ///
    /// A new call is analyzed right away when the eager-analysis budget
    /// allows it, and is scheduled for the current iteration in any case.
    #[allow(clippy::too_many_arguments)]
    pub fn new_call(
        &mut self,
        callee: Clazz,
        pre: bool,
        site: Option<Site>,
        target: ValueId,
        args: Args,
        env: Option<EnvId>,
        context: Context,
    ) -> Result<CallId, DfaError> {
        let ir = self.ir;
        let key = CallKey {
            callee,
            pre,
            target,
            args,
            env,
            site: if self.options.site_sensitive { site } else { None },
        };
        if let Some(&id) = self.call_index.get(&key) {
            return Ok(id);
        }

        let group = self.call_group(callee, target, key.site);
        if let Context::Call(caller) = context {
            let from = self.calls[caller].group;
            self.add_call_edge(from, group);
        }
        let id = self.calls.alloc(Call {
            key: key.clone(),
            instance: ValueId::UNIT,
            returns: false,
            context,
            site,
            group,
        });
        self.call_index.insert(key, id);
        if ir.clazz_kind(callee) == ClazzKind::Routine {
            let instance = self.new_instance(callee, site, Context::Call(id))?;
            self.calls[id].instance = instance;
            if !pre && ir.clazz_result_field(callee).is_none() && !ir.clazz_result_is_unit(callee)
            {
                self.constructor_escapes(callee);
            }
        }
        self.was_changed(|dfa| format!("new call {}", dfa.call_string(id)));
        log::trace!(target: crate::LOG_TARGET, "new call {}", self.call_string(id));

        self.analyze_new_call(id)?;
        Ok(id)
    }

    /// The value a call results in, `None` while it is not known to return.
    pub fn call_result(&mut self, id: CallId) -> Result<Option<ValueId>, DfaError> {
        let ir = self.ir;
        let call = &self.calls[id];
        let callee = call.key.callee;
        match ir.clazz_kind(callee) {
            ClazzKind::Intrinsic => self.intrinsic_result(id),
            ClazzKind::Field => {
                let (target, site) = (call.key.target, call.site);
                self.read_field(target, callee, site, Context::Call(id))
            }
            ClazzKind::Routine => {
                if !call.returns {
                    Ok(None)
                } else if call.key.pre || ir.clazz_result_is_unit(callee) {
                    Ok(Some(ValueId::UNIT))
                } else {
                    match ir.clazz_result_field(callee) {
                        None => Ok(Some(call.instance)),
                        Some(field) => {
                            let instance = call.instance;
                            self.read_field(instance, field, None, Context::Call(id))
                        }
                    }
                }
            }
            ClazzKind::Abstract | ClazzKind::Choice => Ok(None),
        }
    }

    fn intrinsic_result(&mut self, id: CallId) -> Result<Option<ValueId>, DfaError> {
        let ir = self.ir;
        let callee = self.calls[id].key.callee;
        let name = ir
            .intrinsic_name(callee)
            .unwrap_or_else(|| ir.clazz_name(callee));
        if !self.intrinsics_used.contains(name) {
            self.intrinsics_used.insert(name.to_string());
        }
        match self.intrinsics.get(name) {
            Some(semantics) => semantics(self, id),
            None => {
                self.unknown_intrinsic(id, name);
                self.any_value(ir.clazz_result_clazz(callee)).map(Some)
            }
        }
    }

    pub(crate) fn mark_returns(&mut self, id: CallId) {
        if !self.calls[id].returns {
            self.calls[id].returns = true;
            self.was_changed(|dfa| format!("call {} returns", dfa.call_string(id)));
        }
    }

    /// `callee(args)`, prefixed by the target unless it is unit, followed by
    /// the installed effects.
    pub fn call_string(&self, id: CallId) -> String {
        let ir = self.ir;
        let call = &self.calls[id];
        let mut out = String::new();
        if call.key.target != ValueId::UNIT {
            out.push_str(&self.value_string(call.key.target));
            out.push('.');
        }
        out.push_str(ir.clazz_name(call.key.callee));
        if call.key.pre {
            out.push_str(" (precondition)");
        }
        let args: Vec<String> = call
            .key
            .args
            .iter()
            .map(|&a| self.value_string(a))
            .collect();
        out.push('(');
        out.push_str(&args.join(", "));
        out.push(')');
        if let Some(env) = call.key.env {
            out.push_str(" in ");
            out.push_str(&self.env_string(env));
        }
        out
    }
}
