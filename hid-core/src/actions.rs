//! Action sets and the [`Actions`] seam that input components mutate.

use hid_proto::ActionCode;
use heapless::Vec;

/// Maximum codes in one action set.
pub const ACTION_SET_LEN: usize = 4;
/// Maximum codes in one macro sequence.
pub const MACRO_LEN: usize = 28;

/// Ordered macro sequence, played as press/release pairs.
pub type MacroSequence = Vec<ActionCode, MACRO_LEN>;

/// More codes than an action set can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapacityError;

/// Ordered list of up to four action codes asserted and withdrawn together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActionSet(Vec<ActionCode, ACTION_SET_LEN>);

impl ActionSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Set holding a single code.
    #[must_use]
    pub fn single(code: ActionCode) -> Self {
        let mut codes = Vec::new();
        // Capacity is at least one.
        let _ = codes.push(code);
        Self(codes)
    }

    pub fn from_slice(codes: &[ActionCode]) -> Result<Self, CapacityError> {
        Vec::from_slice(codes).map(Self).map_err(|_| CapacityError)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, code: ActionCode) -> bool {
        self.0.contains(&code)
    }

    pub fn iter(&self) -> impl Iterator<Item = ActionCode> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ActionCode] {
        &self.0
    }
}

impl TryFrom<&[ActionCode]> for ActionSet {
    type Error = CapacityError;

    fn try_from(codes: &[ActionCode]) -> Result<Self, Self::Error> {
        Self::from_slice(codes)
    }
}

/// Mutations input components apply to the action state.
///
/// Implemented by [`HidState`](crate::HidState); buttons and the rotary
/// reducer only ever go through this trait, so the matrix keeps a single
/// writer.
pub trait Actions {
    /// Assert one code now.
    fn press(&mut self, code: ActionCode);

    /// Withdraw one code now.
    fn release(&mut self, code: ActionCode);

    /// Schedule `set` to be asserted `delay_ms` from now.
    fn press_later(&mut self, set: &ActionSet, delay_ms: u32);

    /// Schedule `set` to be withdrawn `delay_ms` from now.
    fn release_later(&mut self, set: &ActionSet, delay_ms: u32);

    /// Delayed actions that can still be scheduled before the pool is full.
    fn schedule_capacity(&self) -> usize {
        usize::MAX
    }

    fn press_set(&mut self, set: &ActionSet) {
        for code in set.iter() {
            self.press(code);
        }
    }

    fn release_set(&mut self, set: &ActionSet) {
        for code in set.iter() {
            self.release(code);
        }
    }
}
