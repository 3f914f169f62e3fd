use fathom_ir::Ir;

use crate::call::CallId;
use crate::dfa::Dfa;

/// Why a call or instance exists. Only used to explain diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Context {
    /// The program entry point.
    EntryPoint,
    /// Created while analyzing this call.
    Call(CallId),
}

impl<I: Ir + ?Sized> Dfa<'_, I> {
    /// The chain of calls leading to `context`, oldest first.
    pub fn context_trail(&self, context: Context) -> Vec<String> {
        let mut trail = Vec::new();
        let mut current = context;
        while let Context::Call(id) = current {
            let call = self.call(id);
            let mut line = format!("calls {}", self.call_string(id));
            if let Some(pos) = call.site.and_then(|site| self.ir().site_pos(site)) {
                line.push_str(&format!(" at {pos}"));
            }
            trail.push(line);
            current = call.context;
        }
        trail.push("program entry point".to_string());
        trail.reverse();
        trail
    }

    /// [`context_trail`](Self::context_trail) as indented text.
    pub fn render_context(&self, context: Context) -> String {
        let mut out = String::new();
        for (depth, line) in self.context_trail(context).iter().enumerate() {
            out.push_str(&"  ".repeat(depth));
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
