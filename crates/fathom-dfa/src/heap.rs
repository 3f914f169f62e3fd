use fathom_ir::{Clazz, Ir, Site, SpecialClazz};

use crate::context::Context;
use crate::dfa::Dfa;
use crate::diagnostics::DiagnosticKind;
use crate::error::DfaError;
use crate::value::{Value, ValueId};

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    /// The value representing a fresh object of `clazz` created at `site`.
    pub fn new_instance(
        &mut self,
        clazz: Clazz,
        site: Option<Site>,
        context: Context,
    ) -> Result<ValueId, DfaError> {
        let ir = self.ir();
        match ir.special_clazz(clazz) {
            Some(SpecialClazz::Unit) => return Ok(ValueId::UNIT),
            Some(SpecialClazz::Bool) => return self.bool_any(),
            Some(_) => return Ok(self.values.numeric(clazz, None)),
            None => {}
        }
        if ir.clazz_is_ref(clazz) {
            let value = ir.clazz_as_value(clazz);
            if value != clazz {
                let original = self.new_instance(value, site, context)?;
                return Ok(self.values.reference(clazz, original));
            }
        }
        let env = match context {
            Context::Call(call) => self.call(call).env(),
            Context::EntryPoint => None,
        };
        Ok(self.values.instance(clazz, site, env, context))
    }

    /// Join `value` into `field` of every object `target` stands for.
    pub fn set_field(
        &mut self,
        target: ValueId,
        field: Clazz,
        value: ValueId,
    ) -> Result<(), DfaError> {
        let ir = self.ir();
        match self.values.get(target).clone() {
            Value::Instance { .. } => {
                self.written_fields.insert(field);
                if self.values.join_field(target, field, value)? {
                    self.was_changed(|dfa| {
                        format!(
                            "field {} of {} widened to {}",
                            dfa.ir().clazz_name(field),
                            dfa.value_string(target),
                            dfa.value_string(dfa.values.field(target, field).unwrap_or(value))
                        )
                    });
                }
                Ok(())
            }
            Value::Ref { original, .. } => self.set_field(original, field, value),
            Value::Set(components) => {
                for c in components {
                    self.set_field(c, field, value)?;
                }
                Ok(())
            }
            Value::Undefined => Ok(()),
            // the value field of a numeric is the numeric itself
            Value::Numeric { clazz, .. } if ir.clazz_outer(field) == Some(clazz) => Ok(()),
            Value::Unit if ir.clazz_outer(field) == Some(ir.universe()) => {
                let universe = self.universe;
                self.set_field(universe, field, value)
            }
            Value::Unit if ir.clazz_result_is_unit(field) => Ok(()),
            _ => Err(DfaError::InvalidFieldAccess {
                field,
                value: self.value_string(target),
            }),
        }
    }

    /// Joined value of `field` over every object `target` stands for, `None`
    /// while no write to it was seen.
    pub fn read_field(
        &mut self,
        target: ValueId,
        field: Clazz,
        site: Option<Site>,
        context: Context,
    ) -> Result<Option<ValueId>, DfaError> {
        let ir = self.ir();
        self.read_fields.insert(field);
        if ir.clazz_result_is_unit(field) {
            return Ok(Some(ValueId::UNIT));
        }
        match self.values.get(target).clone() {
            Value::Instance { clazz, .. } => {
                let value = self.values.field(target, field);
                if value.is_none() {
                    self.report_diagnostic(
                        DiagnosticKind::UninitializedField,
                        site,
                        field,
                        |dfa| {
                            (
                                dfa.pos_of(site, field),
                                format!(
                                    "reading uninitialized field `{}` from instance of `{}`",
                                    ir.clazz_name(field),
                                    ir.clazz_name(clazz)
                                ),
                                dfa.render_context(context),
                            )
                        },
                    );
                }
                Ok(value)
            }
            Value::Ref { original, .. } | Value::Tagged { original, .. } => {
                self.read_field(original, field, site, context)
            }
            Value::Numeric { .. } => Ok(Some(target)),
            Value::Unit => {
                let universe = self.universe;
                self.read_field(universe, field, site, context)
            }
            Value::Undefined => Ok(None),
            Value::Set(components) => {
                let mut result = None;
                for c in components {
                    if let Some(v) = self.read_field(c, field, site, context)? {
                        result = Some(match result {
                            Some(prev) => self.values.join(prev, v)?,
                            None => v,
                        });
                    }
                }
                Ok(result)
            }
            Value::SysArray { .. } => Err(DfaError::InvalidFieldAccess {
                field,
                value: self.value_string(target),
            }),
        }
    }

    /// Least precise value of `clazz`: any numeric, either boolean, unit, or
    /// undefined for everything that has no such value.
    pub fn any_value(&mut self, clazz: Clazz) -> Result<ValueId, DfaError> {
        let ir = self.ir();
        if ir.clazz_is_numeric(clazz) {
            Ok(self.values.numeric(clazz, None))
        } else if ir.clazz_is_bool(clazz) {
            self.bool_any()
        } else if ir.clazz_is_unit_type(clazz) {
            Ok(ValueId::UNIT)
        } else {
            Ok(ValueId::UNDEFINED)
        }
    }

    /// `false` is tag 0 and `true` tag 1 of the bool choice.
    pub fn bool_const(&mut self, value: bool) -> ValueId {
        match self.ir().clazz_of(SpecialClazz::Bool) {
            Some(bool_clazz) => self
                .values
                .tagged(bool_clazz, u32::from(value), ValueId::UNIT),
            None => ValueId::UNDEFINED,
        }
    }

    pub fn bool_any(&mut self) -> Result<ValueId, DfaError> {
        let f = self.bool_const(false);
        let t = self.bool_const(true);
        self.values.join(f, t)
    }
}
