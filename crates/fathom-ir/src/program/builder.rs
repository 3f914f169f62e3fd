use super::{ClazzInfo, CodeInfo, Program, ProgramError};
use crate::{Access, Clazz, ClazzKind, CodeBlock, Expr, Ir, Site, SourcePos, SpecialClazz};

#[bon::bon]
impl Program {
    /// Create a clazz. `outer` defaults to the universe; intrinsics without a
    /// `result` return unit.
    #[builder(finish_fn = new)]
    pub fn clazz(
        &mut self,
        #[builder(into)] name: String,
        kind: ClazzKind,
        outer: Option<Clazz>,
        result: Option<Clazz>,
        is_ref: Option<bool>,
        value: Option<Clazz>,
        unit_type: Option<bool>,
        generics: Option<Vec<Clazz>>,
        effect: Option<Clazz>,
        #[builder(into)] intrinsic: Option<String>,
        pos: Option<SourcePos>,
    ) -> Clazz {
        let result = match (result, kind) {
            (None, ClazzKind::Intrinsic) => Some(self.special(SpecialClazz::Unit)),
            (result, _) => result,
        };
        let mut info = ClazzInfo::new(name, kind, Some(outer.unwrap_or(self.universe)));
        info.result = result;
        info.is_ref = is_ref.unwrap_or(false);
        info.value = value;
        info.unit_type = unit_type.unwrap_or(false);
        info.generics = generics.unwrap_or_default();
        info.effect = effect;
        info.intrinsic = intrinsic;
        info.pos = pos;
        self.clazzes.alloc(info)
    }

    /// Create a field of `owner` holding values of `ty`.
    ///
    /// `arg` appends it to the owner's arguments, `result` makes it the
    /// owner's result field, `outer_ref` makes it the owner's outer reference.
    #[builder(finish_fn = new)]
    pub fn field(
        &mut self,
        owner: Clazz,
        #[builder(into)] name: String,
        ty: Clazz,
        arg: Option<bool>,
        result: Option<bool>,
        outer_ref: Option<bool>,
    ) -> Clazz {
        let mut info = ClazzInfo::new(name, ClazzKind::Field, Some(owner));
        info.result = Some(ty);
        let field = self.clazzes.alloc(info);
        let owner_info = &mut self.clazzes[owner];
        if arg.unwrap_or(false) {
            owner_info.args.push(field);
        }
        if result.unwrap_or(false) {
            owner_info.result_field = Some(field);
            owner_info.result = Some(ty);
        }
        if outer_ref.unwrap_or(false) {
            owner_info.outer_ref = Some(field);
        }
        field
    }
}

impl Program {
    /// The clazz for a built-in type, created on first use.
    pub fn special(&mut self, special: SpecialClazz) -> Clazz {
        if let Some(&cl) = self.specials.get(&special) {
            return cl;
        }
        let kind = match special {
            SpecialClazz::Bool => ClazzKind::Choice,
            _ => ClazzKind::Routine,
        };
        let mut info = ClazzInfo::new(special.name().to_string(), kind, Some(self.universe));
        info.special = Some(special);
        info.unit_type = special == SpecialClazz::Unit;
        let cl = self.clazzes.alloc(info);
        self.specials.insert(special, cl);
        cl
    }

    /// The reference clazz boxing values of `value`, created on first use.
    pub fn ref_of(&mut self, value: Clazz) -> Clazz {
        if let Some(&rc) = self.refs.get(&value) {
            return rc;
        }
        let base = &self.clazzes[value];
        let mut info = ClazzInfo::new(format!("ref {}", base.name), base.kind, base.outer);
        info.is_ref = true;
        info.value = Some(value);
        info.unit_type = base.unit_type;
        let rc = self.clazzes.alloc(info);
        self.refs.insert(value, rc);
        rc
    }

    pub fn set_main(&mut self, main: Clazz) {
        self.main = Some(main);
    }

    /// Make `routine` the code run when a value of `lambda` is called.
    pub fn set_call(&mut self, lambda: Clazz, routine: Clazz) {
        self.clazzes[lambda].call = Some(routine);
    }

    pub fn set_site_pos(&mut self, site: Site, pos: SourcePos) {
        self.code[site.block].positions.insert(site.index, pos);
    }

    /// A code block owned by `owner` that is not attached to it as body or
    /// precondition, e.g. the body of a match case.
    pub fn block(&mut self, owner: Clazz, exprs: Vec<Expr>) -> CodeBlock {
        self.code.alloc(CodeInfo {
            owner,
            exprs,
            positions: Default::default(),
        })
    }

    /// Set the body of a routine.
    pub fn body(&mut self, owner: Clazz, exprs: Vec<Expr>) -> Result<CodeBlock, ProgramError> {
        self.expect_routine(owner)?;
        let block = self.block(owner, exprs);
        self.clazzes[owner].code = Some(block);
        Ok(block)
    }

    /// Set the precondition of a routine.
    pub fn precondition(
        &mut self,
        owner: Clazz,
        exprs: Vec<Expr>,
    ) -> Result<CodeBlock, ProgramError> {
        self.expect_routine(owner)?;
        let block = self.block(owner, exprs);
        self.clazzes[owner].precondition = Some(block);
        Ok(block)
    }

    fn expect_routine(&self, cl: Clazz) -> Result<(), ProgramError> {
        let info = &self.clazzes[cl];
        match info.kind {
            ClazzKind::Routine => Ok(()),
            _ => Err(ProgramError::NotARoutine {
                clazz: cl,
                name: info.name.clone(),
            }),
        }
    }

    /// A statically bound call of `callee` on its outer clazz.
    pub fn call(&self, callee: Clazz) -> Expr {
        let target = self.clazz_outer(callee).unwrap_or(self.universe);
        Expr::Call {
            target,
            args: self.clazz_args(callee).len(),
            accesses: vec![Access { target, callee }],
        }
    }

    /// A dynamically bound call on a target of static type `target`, with one
    /// `(actual target clazz, callee)` pair per possible implementation.
    pub fn dynamic_call(&self, target: Clazz, implementations: &[(Clazz, Clazz)]) -> Expr {
        let args = implementations
            .first()
            .map(|&(_, callee)| self.clazz_args(callee).len())
            .unwrap_or(0);
        Expr::Call {
            target,
            args,
            accesses: implementations
                .iter()
                .map(|&(target, callee)| Access { target, callee })
                .collect(),
        }
    }

    /// Store into `field` of a target of its outer clazz.
    pub fn assign(&self, field: Clazz) -> Expr {
        let target = self.clazz_outer(field).unwrap_or(self.universe);
        Expr::Assign {
            target,
            accesses: vec![Access {
                target,
                callee: field,
            }],
        }
    }
}
