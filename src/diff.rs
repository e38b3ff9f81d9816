use std::collections::HashSet;

/// Elements of `a` that are not in `b`, in first-seen order of `a`, without duplicates.
pub fn difference(a: &[String], b: &[String]) -> Vec<String> {
    let exclude: HashSet<&str> = b.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for x in a {
        if !exclude.contains(x.as_str()) && seen.insert(x.as_str()) {
            out.push(x.clone());
        }
    }
    out
}

/// Membership mutations needed to move from `observed` to `desired`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MembershipDelta {
    pub to_revoke: Vec<String>,
    pub to_enroll: Vec<String>,
}

impl MembershipDelta {
    pub fn between(observed: &[String], desired: &[String]) -> Self {
        Self {
            to_revoke: difference(observed, desired),
            to_enroll: difference(desired, observed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_revoke.is_empty() && self.to_enroll.is_empty()
    }
}
