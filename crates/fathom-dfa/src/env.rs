use fathom_ir::{Arena, Clazz, Ir, identifier};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::call::CallId;
use crate::dfa::Dfa;
use crate::error::DfaError;
use crate::value::ValueId;

identifier! {
    /// Handle to an effect environment.
    struct EnvId
}

/// Sorted set of effect types; the identity of an environment.
pub type EffectTypes = SmallVec<[Clazz; 4]>;

/// One frame of an effect environment.
///
/// Environments are identified by the set of effect types they install, not
/// by the values bound to them: re-creating an environment with a known type
/// set returns the existing one and joins the new bindings into it.
#[derive(Clone, Debug)]
pub struct Env {
    /// Effect type installed by this frame.
    pub effect: Clazz,
    pub outer: Option<EnvId>,
    pub types: EffectTypes,
    /// Joined value bound to `effect`.
    pub value: ValueId,
    /// Set once `effect.abort` ran for this frame's effect.
    pub aborted: bool,
    /// Call that installed the frame.
    pub owner: Option<CallId>,
}

#[derive(Clone, Debug, Default)]
pub struct EnvTable {
    envs: Arena<EnvId, Env>,
    by_types: FxHashMap<EffectTypes, EnvId>,
}

impl EnvTable {
    pub fn len(&self) -> usize {
        self.envs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }

    pub fn get(&self, id: EnvId) -> &Env {
        &self.envs[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = (EnvId, &Env)> {
        self.envs.iter()
    }

    pub fn lookup(&self, types: &EffectTypes) -> Option<EnvId> {
        self.by_types.get(types).copied()
    }

    /// Innermost frame of `env` installing `effect`.
    pub fn frame(&self, env: EnvId, effect: Clazz) -> Option<EnvId> {
        let mut current = Some(env);
        while let Some(id) = current {
            let frame = &self.envs[id];
            if frame.effect == effect {
                return Some(id);
            }
            current = frame.outer;
        }
        None
    }

    fn insert(&mut self, env: Env) -> EnvId {
        let types = env.types.clone();
        let id = self.envs.alloc(env);
        self.by_types.insert(types, id);
        id
    }
}

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    pub fn envs(&self) -> &EnvTable {
        &self.envs
    }

    pub fn env(&self, id: EnvId) -> &Env {
        self.envs.get(id)
    }

    /// Environment `outer` extended by a frame binding `effect` to `value`.
    pub fn new_env(
        &mut self,
        outer: Option<EnvId>,
        effect: Clazz,
        value: ValueId,
        owner: Option<CallId>,
    ) -> Result<EnvId, DfaError> {
        let mut types = outer
            .map(|o| self.envs.get(o).types.clone())
            .unwrap_or_default();
        if let Err(pos) = types.binary_search(&effect) {
            types.insert(pos, effect);
        }
        if let Some(existing) = self.envs.lookup(&types) {
            for &ty in types.iter() {
                let bound = if ty == effect {
                    Some(value)
                } else {
                    outer
                        .and_then(|o| self.envs.frame(o, ty))
                        .map(|f| self.envs.get(f).value)
                };
                if let Some(bound) = bound {
                    self.join_into_frame(existing, ty, bound)?;
                }
            }
            return Ok(existing);
        }
        let id = self.envs.insert(Env {
            effect,
            outer,
            types,
            value,
            aborted: false,
            owner,
        });
        self.was_changed(|dfa| format!("new environment {}", dfa.env_string(id)));
        Ok(id)
    }

    /// Current value of `effect` in `env`, falling back to the defaults.
    pub fn get_effect(&self, env: Option<EnvId>, effect: Clazz) -> Option<ValueId> {
        env.and_then(|e| self.envs.frame(e, effect))
            .map(|f| self.envs.get(f).value)
            .or_else(|| self.default_effects.get(&effect).copied())
    }

    pub fn default_effect(&self, effect: Clazz) -> Option<ValueId> {
        self.default_effects.get(&effect).copied()
    }

    /// Join `value` into the default of `effect` unless `env` installs the
    /// effect. The first writer sets the default, later writers widen it.
    /// Returns whether the default changed.
    pub fn set_default_effect(
        &mut self,
        env: Option<EnvId>,
        effect: Clazz,
        value: ValueId,
    ) -> Result<bool, DfaError> {
        if env.and_then(|e| self.envs.frame(e, effect)).is_some() {
            return Ok(false);
        }
        let old = self.default_effects.get(&effect).copied();
        self.join_into_default(effect, value)?;
        Ok(self.default_effects.get(&effect).copied() != old)
    }

    /// Join `value` into whichever binding of `effect` is visible from `env`.
    pub fn replace_effect(
        &mut self,
        env: Option<EnvId>,
        effect: Clazz,
        value: ValueId,
    ) -> Result<(), DfaError> {
        match env.and_then(|e| self.envs.frame(e, effect)) {
            Some(frame) => self.join_into_frame(frame, effect, value),
            None => self.join_into_default(effect, value),
        }
    }

    /// Replace the effect and mark its frame as aborted.
    pub fn abort_effect(
        &mut self,
        env: Option<EnvId>,
        effect: Clazz,
        value: ValueId,
    ) -> Result<(), DfaError> {
        self.replace_effect(env, effect, value)?;
        if let Some(frame) = env.and_then(|e| self.envs.frame(e, effect)) {
            if !self.envs.envs[frame].aborted {
                self.envs.envs[frame].aborted = true;
                self.was_changed(|dfa| {
                    format!("effect {} aborted", dfa.ir().clazz_name(effect))
                });
            }
        }
        Ok(())
    }

    fn join_into_frame(
        &mut self,
        env: EnvId,
        effect: Clazz,
        value: ValueId,
    ) -> Result<(), DfaError> {
        let Some(frame) = self.envs.frame(env, effect) else {
            return self.join_into_default(effect, value);
        };
        let old = self.envs.get(frame).value;
        let new = self.values.join(old, value)?;
        if new != old {
            self.envs.envs[frame].value = new;
            self.was_changed(|dfa| {
                format!(
                    "effect {} in {} widened to {}",
                    dfa.ir().clazz_name(effect),
                    dfa.env_string(frame),
                    dfa.value_string(new)
                )
            });
        }
        Ok(())
    }

    fn join_into_default(&mut self, effect: Clazz, value: ValueId) -> Result<(), DfaError> {
        let old = self
            .default_effects
            .get(&effect)
            .copied()
            .unwrap_or(ValueId::UNDEFINED);
        let new = self.values.join(old, value)?;
        if new != old {
            self.default_effects.insert(effect, new);
            self.was_changed(|dfa| {
                format!(
                    "default effect {} widened to {}",
                    dfa.ir().clazz_name(effect),
                    dfa.value_string(new)
                )
            });
        }
        Ok(())
    }

    pub fn env_string(&self, id: EnvId) -> String {
        let ir = self.ir();
        let names: Vec<&str> = self
            .envs
            .get(id)
            .types
            .iter()
            .map(|&ty| ir.clazz_name(ty))
            .collect();
        format!("[{}]", names.join(", "))
    }
}
