use std::collections::BTreeSet;

use fathom_ir::{Clazz, ClazzKind, Ir, Site};

use crate::dfa::Dfa;
use crate::value::{Value, ValueId};

/// How long the instance created by a call may be accessed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifeTime {
    /// Calls of the clazz create no instance.
    Undefined,
    /// The instance is unreachable once the call returned and may live on
    /// the stack.
    Call,
    /// The instance may be reached after the call returned.
    Unknown,
}

/// Objects that may outlive the call that created them.
///
/// Both sets only grow. A routine is in `clazzes` once some instance of it
/// may be reached after its call returned; a site is in `sites` once an
/// object created by the call at that site may.
#[derive(Clone, Debug, Default)]
pub struct Escapes {
    clazzes: BTreeSet<Clazz>,
    sites: BTreeSet<Site>,
}

impl Escapes {
    pub fn contains(&self, clazz: Clazz) -> bool {
        self.clazzes.contains(&clazz)
    }

    pub fn contains_site(&self, site: Site) -> bool {
        self.sites.contains(&site)
    }

    pub fn clazzes(&self) -> impl Iterator<Item = Clazz> + '_ {
        self.clazzes.iter().copied()
    }

    pub fn sites(&self) -> impl Iterator<Item = Site> + '_ {
        self.sites.iter().copied()
    }
}

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    pub fn escapes(&self) -> &Escapes {
        &self.escapes
    }

    pub(crate) fn clazz_escapes(&mut self, clazz: Clazz) {
        if self.escapes.clazzes.insert(clazz) {
            self.was_changed(|dfa| format!("instance of {} escapes", dfa.ir().clazz_name(clazz)));
        }
    }

    fn site_escapes(&mut self, site: Site) {
        if self.escapes.sites.insert(site) {
            self.was_changed(|_| format!("result created at {site} escapes"));
        }
    }

    /// A constructor results in its own instance, which therefore outlives
    /// the call together with the instances its outer references point to.
    pub(crate) fn constructor_escapes(&mut self, callee: Clazz) {
        let ir = self.ir();
        if self.escapes.contains(callee) {
            return;
        }
        self.clazz_escapes(callee);
        let mut outer_ref = ir.clazz_outer_ref(callee);
        while let Some(field) = outer_ref {
            let outer = ir.clazz_result_clazz(field);
            if ir.clazz_kind(outer) != ClazzKind::Routine || self.escapes.contains(outer) {
                break;
            }
            self.clazz_escapes(outer);
            outer_ref = ir.clazz_outer_ref(outer);
        }
    }

    /// Every object `value` stands for may outlive the current call.
    pub(crate) fn value_escapes(&mut self, value: ValueId) {
        for component in self.values.components(value) {
            match self.values.get(component).clone() {
                Value::Instance { clazz, site, .. } => {
                    if self.ir().clazz_kind(clazz) == ClazzKind::Routine {
                        self.clazz_escapes(clazz);
                    }
                    if let Some(site) = site {
                        self.site_escapes(site);
                    }
                }
                Value::Ref { original, .. } | Value::Tagged { original, .. } => {
                    self.value_escapes(original)
                }
                Value::Unit
                | Value::Undefined
                | Value::Numeric { .. }
                | Value::SysArray { .. }
                | Value::Set(_) => {}
            }
        }
    }

    /// Lifetime of the instance of a call of `clazz`, as far as analyzed.
    pub fn life_time(&self, clazz: Clazz) -> LifeTime {
        if self.ir().clazz_kind(clazz) != ClazzKind::Routine {
            LifeTime::Undefined
        } else if self.escapes.contains(clazz) {
            LifeTime::Unknown
        } else {
            LifeTime::Call
        }
    }
}
