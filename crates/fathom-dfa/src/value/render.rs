use fathom_ir::Ir;

use super::{Value, ValueId};
use crate::dfa::Dfa;

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    /// Human-readable form of a value, used in logs and diagnostics.
    pub fn value_string(&self, id: ValueId) -> String {
        let ir = self.ir();
        match self.values.get(id) {
            Value::Unit => "unit".to_string(),
            Value::Undefined => "undefined".to_string(),
            Value::Numeric { clazz, bits } => match bits {
                Some(bits) => format!("{}:{bits}", ir.clazz_name(*clazz)),
                None => format!("{}:any", ir.clazz_name(*clazz)),
            },
            Value::Instance { clazz, site, .. } => match site {
                Some(site) => format!("{}@{site}", ir.clazz_name(*clazz)),
                None => ir.clazz_name(*clazz).to_string(),
            },
            Value::Tagged {
                clazz,
                tag,
                original,
            } => format!(
                "{}.{tag}({})",
                ir.clazz_name(*clazz),
                self.value_string(*original)
            ),
            Value::Ref { clazz, original } => {
                format!("{}({})", ir.clazz_name(*clazz), self.value_string(*original))
            }
            // elements may contain the array itself
            Value::SysArray { element, origin } => match origin {
                Some(site) => format!("array[{}]@{site}", ir.clazz_name(*element)),
                None => format!("array[{}]", ir.clazz_name(*element)),
            },
            Value::Set(components) => {
                let parts: Vec<String> = components.iter().map(|&c| self.value_string(c)).collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }
}
