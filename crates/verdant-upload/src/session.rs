/// Which parts of a transfer are present, over the 1-based range `1..=total`.
///
/// Built from a single scan of the chunk store so that missing-part detection
/// at completion does not need one filesystem probe per index.
#[derive(Debug, Clone)]
pub struct ReceivedParts {
    bits: Vec<u64>,
    total: u32,
    received: u32,
}

impl ReceivedParts {
    pub fn new(total: u32) -> Self {
        Self {
            bits: vec![0u64; (total as usize).div_ceil(64)],
            total,
            received: 0,
        }
    }

    /// Mark a part as present. Returns true if it was newly set.
    /// Indices outside `1..=total` are ignored.
    #[inline]
    pub fn set(&mut self, part: u32) -> bool {
        let Some((word, mask)) = self.slot(part) else {
            return false;
        };
        if self.bits[word] & mask != 0 {
            return false;
        }
        self.bits[word] |= mask;
        self.received += 1;
        true
    }

    #[inline]
    pub fn contains(&self, part: u32) -> bool {
        self.slot(part)
            .is_some_and(|(word, mask)| self.bits[word] & mask != 0)
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.received >= self.total
    }

    #[inline]
    pub fn received(&self) -> u32 {
        self.received
    }

    #[inline]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Missing part indices in ascending order.
    pub fn missing(&self) -> Vec<u32> {
        (1..=self.total).filter(|p| !self.contains(*p)).collect()
    }

    fn slot(&self, part: u32) -> Option<(usize, u64)> {
        if part == 0 || part > self.total {
            return None;
        }
        let idx = (part - 1) as usize;
        Some((idx / 64, 1u64 << (idx % 64)))
    }
}
