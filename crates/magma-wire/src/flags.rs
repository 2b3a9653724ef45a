//! Request/response flag bits.

/// Flag bits carried in a header's `flags` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags(u16);

impl Flags {
    /// Set on a response when the responding node's view of the
    /// topology is stale relative to the client's and a topology
    /// refresh should be triggered once the current call completes.
    pub const REFRESH_TOPOLOGY: Flags = Flags(0x0001);

    pub const fn empty() -> Self {
        Flags(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        Flags(bits)
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    pub fn is_refresh_topology(self) -> bool {
        self.contains(Flags::REFRESH_TOPOLOGY)
    }
}
