use indexmap::IndexSet;

use crate::figure::AxesId;

/// Symmetric, transitive link relation between axes groups.
///
/// Linked groups form classes; an operation on any member is mirrored on every other
/// member of its class in link order.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    classes: Vec<IndexSet<AxesId>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link two groups. Returns `false` when `a == b` or they were already linked.
    pub fn link(&mut self, a: AxesId, b: AxesId) -> bool {
        if a == b {
            return false;
        }
        match (self.class_of(a), self.class_of(b)) {
            (Some(ia), Some(ib)) if ia == ib => return false,
            (Some(ia), Some(ib)) => {
                let merged = self.classes[ib].clone();
                self.classes[ia].extend(merged);
                self.classes.remove(ib);
            }
            (Some(ia), None) => {
                self.classes[ia].insert(b);
            }
            (None, Some(ib)) => {
                self.classes[ib].insert(a);
            }
            (None, None) => self.classes.push(IndexSet::from([a, b])),
        }
        log::debug!("linked {a} and {b}");
        true
    }

    /// Link every group with every other.
    pub fn link_all(&mut self, groups: impl IntoIterator<Item = AxesId>) {
        let mut groups = groups.into_iter();
        let Some(first) = groups.next() else {
            return;
        };
        for g in groups {
            self.link(first, g);
        }
    }

    /// Remove a group from its class.
    pub fn unlink(&mut self, group: AxesId) {
        if let Some(i) = self.class_of(group) {
            self.classes[i].shift_remove(&group);
            if self.classes[i].len() < 2 {
                self.classes.remove(i);
            }
        }
    }

    pub fn is_linked(&self, a: AxesId, b: AxesId) -> bool {
        a != b && self.class_of(a).is_some_and(|i| self.classes[i].contains(&b))
    }

    /// Every group linked to `group`, excluding itself, in link order.
    pub fn linked(&self, group: AxesId) -> Vec<AxesId> {
        self.class_of(group)
            .map(|i| {
                self.classes[i]
                    .iter()
                    .copied()
                    .filter(|g| *g != group)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn class_of(&self, group: AxesId) -> Option<usize> {
        self.classes.iter().position(|c| c.contains(&group))
    }
}
