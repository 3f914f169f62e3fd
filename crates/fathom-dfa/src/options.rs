/// Analysis configuration.
///
/// ```
/// use fathom_dfa::DfaOptions;
///
/// let options = DfaOptions::builder()
///     .site_sensitive(false)
///     .max_iterations(50)
///     .build();
/// assert!(!options.site_sensitive);
/// assert_eq!(options.max_new_call_recursion, 40);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DfaOptions {
    /// Distinguish calls by their call site.
    pub site_sensitive: bool,
    /// Fail with [`DfaError::IterationLimit`](crate::DfaError::IterationLimit)
    /// after this many iterations.
    pub max_iterations: Option<usize>,
    /// Depth up to which new calls are analyzed eagerly when discovered.
    pub max_new_call_recursion: usize,
    /// Value of the `safety` intrinsic.
    pub safety: bool,
    /// Value of the `debug` intrinsic.
    pub debug: bool,
    /// Value of the `debug_level` intrinsic.
    pub debug_level: i64,
}

pub const SITE_SENSITIVE_VAR: &str = "FATHOM_DFA_SITE_SENSITIVE";
pub const MAX_ITERATIONS_VAR: &str = "FATHOM_DFA_MAX_ITERATIONS";
pub const MAX_NEW_CALL_RECURSION_VAR: &str = "FATHOM_DFA_MAX_NEW_CALL_RECURSION";

#[bon::bon]
impl DfaOptions {
    #[builder]
    pub fn new(
        site_sensitive: Option<bool>,
        max_iterations: Option<usize>,
        max_new_call_recursion: Option<usize>,
        safety: Option<bool>,
        debug: Option<bool>,
        debug_level: Option<i64>,
    ) -> Self {
        Self {
            site_sensitive: site_sensitive.unwrap_or(true),
            max_iterations,
            max_new_call_recursion: max_new_call_recursion.unwrap_or(40),
            safety: safety.unwrap_or(true),
            debug: debug.unwrap_or(false),
            debug_level: debug_level.unwrap_or(1),
        }
    }
}

impl Default for DfaOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DfaOptions {
    /// Defaults, overridden by `FATHOM_DFA_*` environment variables.
    /// Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::default().with_env(|name| std::env::var(name).ok())
    }

    /// Overlay settings from a variable lookup.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = parse_var(&lookup, SITE_SENSITIVE_VAR) {
            self.site_sensitive = v;
        }
        if let Some(v) = parse_var(&lookup, MAX_ITERATIONS_VAR) {
            self.max_iterations = Some(v);
        }
        if let Some(v) = parse_var(&lookup, MAX_NEW_CALL_RECURSION_VAR) {
            self.max_new_call_recursion = v;
        }
        self
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!(target: crate::LOG_TARGET, "ignoring {name}={raw:?}: cannot parse");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = DfaOptions::default();
        assert!(options.site_sensitive);
        assert_eq!(options.max_iterations, None);
        assert_eq!(options.max_new_call_recursion, 40);
        assert!(options.safety);
        assert!(!options.debug);
        assert_eq!(options.debug_level, 1);
    }

    #[test]
    fn env_overlay() {
        let options = DfaOptions::default().with_env(|name| match name {
            SITE_SENSITIVE_VAR => Some("false".to_string()),
            MAX_ITERATIONS_VAR => Some(" 12 ".to_string()),
            MAX_NEW_CALL_RECURSION_VAR => Some("many".to_string()),
            _ => None,
        });
        assert!(!options.site_sensitive);
        assert_eq!(options.max_iterations, Some(12));
        assert_eq!(options.max_new_call_recursion, 40);
    }
}
