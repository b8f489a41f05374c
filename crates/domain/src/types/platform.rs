//! Streaming platform identifiers

use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;

/// Platform a credential set belongs to.
///
/// The lowercase name doubles as the key under `platforms.<id>` in the
/// credential document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Twitch,
    Youtube,
    Kick,
    Trovo,
    Dlive,
    Twitter,
}

impl_domain_enum_conversions!(PlatformId {
    Twitch => "twitch",
    Youtube => "youtube",
    Kick => "kick",
    Trovo => "trovo",
    Dlive => "dlive",
    Twitter => "twitter",
});

impl PlatformId {
    /// Every supported platform, in document order.
    pub const ALL: [Self; 6] =
        [Self::Twitch, Self::Youtube, Self::Kick, Self::Trovo, Self::Dlive, Self::Twitter];
}
