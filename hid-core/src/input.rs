//! Input traits: debounced button levels and rotary edges.

/// Where a button reads its level from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    /// Physical input addressed by index (GPIO, I/O expander line).
    Pin(u8),
    /// One-shot press set by a composite control.
    Virtual,
}

/// Debounced physical button levels.
///
/// This trait abstracts the bus the buttons sit on, allowing GPIO banks,
/// I/O expanders or test doubles to be used interchangeably.
pub trait ButtonInputs {
    /// Current level of input `pin`, true when held.
    fn is_pressed(&mut self, pin: u8) -> bool;
}

impl<T: ButtonInputs + ?Sized> ButtonInputs for &mut T {
    fn is_pressed(&mut self, pin: u8) -> bool {
        (**self).is_pressed(pin)
    }
}

/// Rotation sense of one quadrature edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Signed step for this direction.
    #[inline]
    #[must_use]
    pub const fn step(self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockInputs;
    use super::*;

    #[test]
    fn test_mock_inputs_levels() {
        let mut inputs = MockInputs::default();
        inputs.set(3, true);
        assert!(inputs.is_pressed(3));
        assert!(!inputs.is_pressed(4));
        inputs.set(3, false);
        assert!(!inputs.is_pressed(3));
    }

    #[test]
    fn test_direction_step() {
        assert_eq!(Direction::Up.step(), 1);
        assert_eq!(Direction::Down.step(), -1);
    }
}
