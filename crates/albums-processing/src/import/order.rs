use albums_core::constants::BASELINE_ORDER;

/// The owner's largest ordering value leaves no room for another image
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("The album ordering values are exhausted. Renumber the images before adding more.")]
pub struct OrderExhausted;

/// Running ordering counter for one batch.
///
/// Seeded once from the owner's current maximum and never re-read, so each
/// accepted image gets the next integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAssigner {
    current: i32,
}

impl OrderAssigner {
    /// Start after `max_order`, or after the baseline when the owner has no images
    pub fn seeded(max_order: Option<i32>) -> Self {
        Self {
            current: max_order.unwrap_or(BASELINE_ORDER),
        }
    }

    /// Advance and return the new ordering value
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<i32, OrderExhausted> {
        self.current = self.current.checked_add(1).ok_or(OrderExhausted)?;
        Ok(self.current)
    }

    /// Last value handed out (the seed before the first call)
    pub fn current(&self) -> i32 {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_from_existing_max() {
        let mut order = OrderAssigner::seeded(Some(7));
        assert_eq!(order.current(), 7);
        assert_eq!(order.next(), Ok(8));
        assert_eq!(order.next(), Ok(9));
        assert_eq!(order.current(), 9);
    }

    #[test]
    fn test_empty_album_starts_after_baseline() {
        let mut order = OrderAssigner::seeded(None);
        assert_eq!(order.next(), Ok(BASELINE_ORDER + 1));
    }

    #[test]
    fn test_exhausted_at_max_value() {
        let mut order = OrderAssigner::seeded(Some(i32::MAX - 1));
        assert_eq!(order.next(), Ok(i32::MAX));
        assert_eq!(order.next(), Err(OrderExhausted));
        assert_eq!(order.current(), i32::MAX);
    }
}
