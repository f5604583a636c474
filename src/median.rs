/// Fixed-capacity sample buffer kept in descending order.
pub(crate) struct Descending<const N: usize> {
    samples: [u32; N],
    len: usize,
}

impl<const N: usize> Descending<N> {
    pub(crate) fn new() -> Self {
        Descending {
            samples: [0; N],
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Inserts `sample` behind every element greater than or equal to it.
    /// Samples beyond capacity are dropped.
    pub(crate) fn insert(&mut self, sample: u32) {
        if self.len == N {
            return;
        }
        let mut j = self.len;
        while j > 0 && self.samples[j - 1] < sample {
            self.samples[j] = self.samples[j - 1];
            j -= 1;
        }
        self.samples[j] = sample;
        self.len += 1;
    }

    /// Element at `len / 2`: the median for odd counts, the lower middle
    /// for even ones.
    pub(crate) fn median(&self) -> Option<u32> {
        if self.len == 0 {
            None
        } else {
            Some(self.samples[self.len >> 1])
        }
    }

    #[cfg(test)]
    pub(crate) fn as_slice(&self) -> &[u32] {
        &self.samples[..self.len]
    }
}
