use crate::{Clazz, ClazzKind, Expr, Ir, Site};

use super::Program;

/// Structural problems found while building or validating a [`Program`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// No entry point was set.
    MissingMain,
    /// A body or precondition was attached to something that is not a routine.
    NotARoutine { clazz: Clazz, name: String },
    /// A statement refers to a clazz handle that does not exist.
    DanglingClazz { site: Site, raw: usize },
    /// A match case refers to a code block that does not exist.
    DanglingBlock { site: Site, raw: usize },
    /// A call passes a different number of arguments than its callee takes.
    ArityMismatch {
        site: Site,
        callee: Clazz,
        expected: usize,
        found: usize,
    },
}

impl std::fmt::Display for ProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramError::MissingMain => write!(f, "program has no main clazz"),
            ProgramError::NotARoutine { name, .. } => {
                write!(f, "`{name}` is not a routine and cannot have code")
            }
            ProgramError::DanglingClazz { site, raw } => {
                write!(f, "statement at {site} refers to unknown clazz #{raw}")
            }
            ProgramError::DanglingBlock { site, raw } => {
                write!(f, "match at {site} refers to unknown code block #{raw}")
            }
            ProgramError::ArityMismatch {
                site,
                expected,
                found,
                ..
            } => write!(
                f,
                "call at {site} passes {found} argument(s), callee expects {expected}"
            ),
        }
    }
}

impl std::error::Error for ProgramError {}

impl Program {
    /// Check that every handle in the program resolves and that call
    /// arities agree with their callees.
    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.main.is_none() {
            return Err(ProgramError::MissingMain);
        }
        for (block, info) in self.code.iter() {
            for (index, expr) in info.exprs.iter().enumerate() {
                let site = Site::new(block, index);
                for access in expr.accesses() {
                    self.check_clazz(site, access.target)?;
                    self.check_clazz(site, access.callee)?;
                }
                match expr {
                    Expr::Call { args, accesses, .. } => {
                        for access in accesses {
                            let expected = match self.clazz_kind(access.callee) {
                                ClazzKind::Field => 0,
                                _ => self.clazz_args(access.callee).len(),
                            };
                            if expected != *args {
                                return Err(ProgramError::ArityMismatch {
                                    site,
                                    callee: access.callee,
                                    expected,
                                    found: *args,
                                });
                            }
                        }
                    }
                    Expr::Match { cases, .. } => {
                        for case in cases {
                            if self.code.get(case.code).is_none() {
                                return Err(ProgramError::DanglingBlock {
                                    site,
                                    raw: case.code.raw(),
                                });
                            }
                            if let Some(field) = case.field {
                                self.check_clazz(site, field)?;
                            }
                        }
                    }
                    Expr::Box { value, reference } | Expr::Unbox { reference, value } => {
                        self.check_clazz(site, *value)?;
                        self.check_clazz(site, *reference)?;
                    }
                    Expr::Env { effect } => self.check_clazz(site, *effect)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn check_clazz(&self, site: Site, cl: Clazz) -> Result<(), ProgramError> {
        match self.clazzes.get(cl) {
            Some(_) => Ok(()),
            None => Err(ProgramError::DanglingClazz {
                site,
                raw: cl.raw(),
            }),
        }
    }
}
