/// Build-time behavior toggles. Per the open question raised against the
/// source implementation (its `check_self_ingress_traffic` and
/// `check_select_by_no_policy` toggles are applied inconsistently across
/// queries), this configuration is mandatory: there is no `Default` impl and
/// no implicit fallback. Callers state every toggle explicitly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Seeds `ingress_traffic(sel, sel)` for every pod, so a pod can always
    /// reach itself regardless of policy.
    pub self_ingress: bool,

    /// If set, a pod selected by no policy accepts/emits all traffic.
    pub select_by_no_policy: bool,

    /// Only meaningful when `select_by_no_policy` is set. If set, the
    /// "selected by no policy" condition is resolved once at build time and
    /// compiled into ground rules per unselected pod, instead of a rule
    /// that negates an open `selected_by_any` relation at query time.
    pub ground_default_pod: bool,
}

impl BuildConfig {
    pub fn new(self_ingress: bool, select_by_no_policy: bool, ground_default_pod: bool) -> Self {
        Self {
            self_ingress,
            select_by_no_policy,
            ground_default_pod,
        }
    }
}
