use crate::media::{MediaFile, Side};

/// How the inferior copy of a same-asset pair is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// The device copy is disposable.
    FlagTarget,
    /// The bigger file is disposable.
    FlagLarger,
}

pub fn select_inferior(authority: Authority, left: &MediaFile, right: &MediaFile) -> Side {
    match authority {
        Authority::FlagTarget => Side::Target,
        Authority::FlagLarger => larger(left, right),
    }
}

/// Source only when strictly larger; ties go to the target.
pub fn larger(left: &MediaFile, right: &MediaFile) -> Side {
    if left.size > right.size {
        Side::Source
    } else {
        Side::Target
    }
}
