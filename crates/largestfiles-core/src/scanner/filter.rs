/// Attribute filter: decides, per listing entry, whether the walker descends
/// into it, records it, or skips it.
///
/// Link exclusion is what makes a walk cycle-free: a junction or symlink
/// pointing at an ancestor is never followed, so no directory can be reached
/// twice. It is therefore not part of [`FilterPolicy`] and cannot be turned
/// off.
use crate::platform::{Attributes, EntryKind, RawEntry};

/// Which attribute classes are excluded. Defaults exclude all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPolicy {
    pub skip_hidden: bool,
    pub skip_system: bool,
    pub skip_temporary: bool,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            skip_system: true,
            skip_temporary: true,
        }
    }
}

impl FilterPolicy {
    /// Apply no attribute-based exclusion. Links are still excluded.
    pub fn permissive() -> Self {
        Self {
            skip_hidden: false,
            skip_system: false,
            skip_temporary: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `.` or `..`.
    SelfOrParent,
    Hidden,
    System,
    Temporary,
    /// Symlink, junction or other reparse point.
    Link,
    /// Neither a directory nor a regular file.
    NotRegular,
    /// Lives on a different device than the scan root.
    OtherVolume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Descend,
    Record,
    Skip(SkipReason),
}

/// The filter configured for one volume walk.
#[derive(Debug, Clone, Copy)]
pub struct EntryFilter {
    policy: FilterPolicy,
    root_device: Option<u64>,
}

impl EntryFilter {
    pub fn new(policy: FilterPolicy) -> Self {
        Self {
            policy,
            root_device: None,
        }
    }

    /// Skip entries whose device differs from `device`.
    pub fn with_root_device(mut self, device: Option<u64>) -> Self {
        self.root_device = device;
        self
    }

    /// Rules in order: synthetic names, attribute classes, links, entry
    /// type, device boundary.
    pub fn classify(&self, entry: &RawEntry) -> Verdict {
        if entry.name == "." || entry.name == ".." {
            return Verdict::Skip(SkipReason::SelfOrParent);
        }

        let attrs = entry.attributes;
        if self.policy.skip_hidden && attrs.contains(Attributes::HIDDEN) {
            return Verdict::Skip(SkipReason::Hidden);
        }
        if self.policy.skip_system && attrs.contains(Attributes::SYSTEM) {
            return Verdict::Skip(SkipReason::System);
        }
        if self.policy.skip_temporary && attrs.contains(Attributes::TEMPORARY) {
            return Verdict::Skip(SkipReason::Temporary);
        }

        if entry.is_link || attrs.contains(Attributes::REPARSE_POINT) {
            return Verdict::Skip(SkipReason::Link);
        }

        if let (Some(root), Some(dev)) = (self.root_device, entry.device) {
            if root != dev {
                return Verdict::Skip(SkipReason::OtherVolume);
            }
        }

        match entry.kind {
            EntryKind::Directory => Verdict::Descend,
            EntryKind::File => Verdict::Record,
            EntryKind::Other => Verdict::Skip(SkipReason::NotRegular),
        }
    }

    /// `true` unless the entry is skipped.
    pub fn include(&self, entry: &RawEntry) -> bool {
        !matches!(self.classify(entry), Verdict::Skip(_))
    }
}
