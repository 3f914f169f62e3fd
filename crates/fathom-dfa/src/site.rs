use std::collections::BTreeSet;

use fathom_ir::{Clazz, Ir, Site};

use crate::dfa::Dfa;

/// What the analysis learned about one statement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiteInfo {
    /// Callees actually dispatched to from here.
    pub callees: BTreeSet<Clazz>,
    /// Some analyzed call reached the statement.
    pub reached: bool,
    /// Some analysis of the statement produced a value.
    pub completes: bool,
}

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    pub fn site_info(&self, site: Site) -> Option<&SiteInfo> {
        self.sites.get(&site)
    }

    pub fn sites(&self) -> impl Iterator<Item = (Site, &SiteInfo)> {
        self.sites.iter().map(|(&site, info)| (site, info))
    }

    pub(crate) fn site_reached(&mut self, site: Site) {
        self.sites.entry(site).or_default().reached = true;
    }

    pub(crate) fn site_completes(&mut self, site: Site) {
        self.sites.entry(site).or_default().completes = true;
    }

    pub(crate) fn site_dispatches(&mut self, site: Site, callee: Clazz) {
        self.sites.entry(site).or_default().callees.insert(callee);
    }
}
