mod builder;
mod error;

pub use error::ProgramError;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::arena::Arena;
use crate::{Clazz, ClazzKind, CodeBlock, Expr, Ir, Site, SourcePos, SpecialClazz};

#[derive(Clone, Debug)]
pub struct ClazzInfo {
    pub(crate) name: String,
    pub(crate) kind: ClazzKind,
    pub(crate) outer: Option<Clazz>,
    pub(crate) outer_ref: Option<Clazz>,
    pub(crate) args: Vec<Clazz>,
    pub(crate) result: Option<Clazz>,
    pub(crate) result_field: Option<Clazz>,
    pub(crate) is_ref: bool,
    pub(crate) value: Option<Clazz>,
    pub(crate) unit_type: bool,
    pub(crate) special: Option<SpecialClazz>,
    pub(crate) code: Option<CodeBlock>,
    pub(crate) precondition: Option<CodeBlock>,
    pub(crate) generics: Vec<Clazz>,
    pub(crate) effect: Option<Clazz>,
    pub(crate) call: Option<Clazz>,
    pub(crate) intrinsic: Option<String>,
    pub(crate) pos: Option<SourcePos>,
}

impl ClazzInfo {
    pub(crate) fn new(name: String, kind: ClazzKind, outer: Option<Clazz>) -> Self {
        Self {
            name,
            kind,
            outer,
            outer_ref: None,
            args: Vec::new(),
            result: None,
            result_field: None,
            is_ref: false,
            value: None,
            unit_type: false,
            special: None,
            code: None,
            precondition: None,
            generics: Vec::new(),
            effect: None,
            call: None,
            intrinsic: None,
            pos: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClazzKind {
        self.kind
    }
}

#[derive(Clone, Debug)]
pub struct CodeInfo {
    pub(crate) owner: Clazz,
    pub(crate) exprs: Vec<Expr>,
    pub(crate) positions: FxHashMap<usize, SourcePos>,
}

impl CodeInfo {
    pub fn owner(&self) -> Clazz {
        self.owner
    }

    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }
}

/// An in-memory program implementing [`Ir`].
///
/// Clazzes and code blocks are created through the builder methods
/// ([`Program::clazz`], [`Program::field`], [`Program::body`], ...). The
/// universe clazz exists from construction on.
#[derive(Clone, Debug)]
pub struct Program {
    pub(crate) clazzes: Arena<Clazz, ClazzInfo>,
    pub(crate) code: Arena<CodeBlock, CodeInfo>,
    pub(crate) universe: Clazz,
    pub(crate) main: Option<Clazz>,
    pub(crate) specials: IndexMap<SpecialClazz, Clazz>,
    pub(crate) refs: FxHashMap<Clazz, Clazz>,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    pub fn new() -> Self {
        let mut clazzes = Arena::default();
        let mut universe = ClazzInfo::new("universe".to_string(), ClazzKind::Routine, None);
        universe.unit_type = true;
        let universe = clazzes.alloc(universe);
        Self {
            clazzes,
            code: Arena::default(),
            universe,
            main: None,
            specials: IndexMap::new(),
            refs: FxHashMap::default(),
        }
    }

    pub fn clazz_info(&self, cl: Clazz) -> Option<&ClazzInfo> {
        self.clazzes.get(cl)
    }

    pub fn code_info(&self, block: CodeBlock) -> Option<&CodeInfo> {
        self.code.get(block)
    }

    pub fn clazzes(&self) -> impl Iterator<Item = (Clazz, &ClazzInfo)> {
        self.clazzes.iter()
    }

    /// Find a clazz by name. Names are not required to be unique; the first
    /// match wins.
    pub fn find(&self, name: &str) -> Option<Clazz> {
        self.clazzes
            .iter()
            .find(|(_, info)| info.name == name)
            .map(|(cl, _)| cl)
    }
}

impl Ir for Program {
    fn universe(&self) -> Clazz {
        self.universe
    }

    fn main_clazz(&self) -> Option<Clazz> {
        self.main
    }

    fn clazz_name(&self, cl: Clazz) -> &str {
        &self.clazzes[cl].name
    }

    fn clazz_kind(&self, cl: Clazz) -> ClazzKind {
        self.clazzes[cl].kind
    }

    fn clazz_outer(&self, cl: Clazz) -> Option<Clazz> {
        self.clazzes[cl].outer
    }

    fn clazz_outer_ref(&self, cl: Clazz) -> Option<Clazz> {
        self.clazzes[cl].outer_ref
    }

    fn clazz_args(&self, cl: Clazz) -> &[Clazz] {
        &self.clazzes[cl].args
    }

    fn clazz_result_clazz(&self, cl: Clazz) -> Clazz {
        self.clazzes[cl].result.unwrap_or(cl)
    }

    fn clazz_result_field(&self, cl: Clazz) -> Option<Clazz> {
        self.clazzes[cl].result_field
    }

    fn clazz_is_ref(&self, cl: Clazz) -> bool {
        self.clazzes[cl].is_ref
    }

    fn clazz_as_value(&self, cl: Clazz) -> Clazz {
        let info = &self.clazzes[cl];
        if info.is_ref {
            info.value.unwrap_or(cl)
        } else {
            cl
        }
    }

    fn clazz_is_unit_type(&self, cl: Clazz) -> bool {
        self.clazzes[cl].unit_type
    }

    fn special_clazz(&self, cl: Clazz) -> Option<SpecialClazz> {
        self.clazzes[cl].special
    }

    fn clazz_of(&self, special: SpecialClazz) -> Option<Clazz> {
        self.specials.get(&special).copied()
    }

    fn clazz_code(&self, cl: Clazz) -> Option<CodeBlock> {
        self.clazzes[cl].code
    }

    fn clazz_precondition(&self, cl: Clazz) -> Option<CodeBlock> {
        self.clazzes[cl].precondition
    }

    fn clazz_generics(&self, cl: Clazz) -> &[Clazz] {
        &self.clazzes[cl].generics
    }

    fn lookup_call(&self, cl: Clazz) -> Option<Clazz> {
        self.clazzes[self.clazz_as_value(cl)].call
    }

    fn effect_type(&self, cl: Clazz) -> Option<Clazz> {
        self.clazzes[cl].effect
    }

    fn intrinsic_name(&self, cl: Clazz) -> Option<&str> {
        let info = &self.clazzes[cl];
        match info.kind {
            ClazzKind::Intrinsic => Some(info.intrinsic.as_deref().unwrap_or(&info.name)),
            _ => None,
        }
    }

    fn clazz_pos(&self, cl: Clazz) -> Option<&SourcePos> {
        self.clazzes[cl].pos.as_ref()
    }

    fn code_clazz(&self, block: CodeBlock) -> Clazz {
        self.code[block].owner
    }

    fn code_len(&self, block: CodeBlock) -> usize {
        self.code[block].exprs.len()
    }

    fn expr(&self, site: Site) -> Option<&Expr> {
        self.code.get(site.block)?.exprs.get(site.index)
    }

    fn site_pos(&self, site: Site) -> Option<&SourcePos> {
        self.code.get(site.block)?.positions.get(&site.index)
    }

    fn clazz_count(&self) -> usize {
        self.clazzes.len()
    }
}
