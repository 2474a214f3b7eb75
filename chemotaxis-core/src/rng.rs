/// Xorshift32 generator. Every random draw in a simulation comes from one
/// instance so a seed fully determines a run for a fixed driving cadence.
#[derive(Clone, Copy, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF } else { seed },
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        self.state
    }

    /// Uniform draw in `[0, 1)` built from the top 24 bits.
    pub fn next_unit(&mut self) -> f64 {
        (self.next() >> 8) as f64 / (1u32 << 24) as f64
    }

    /// Uniform draw in `[min, max)`. Returns `min` when the range is empty.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        debug_assert!(max >= min);
        min + (max - min) * self.next_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seed_is_remapped() {
        assert_eq!(SeededRng::new(0).state(), 0xDEAD_BEEF);
    }

    #[test]
    fn unit_draws_stay_in_half_open_interval() {
        let mut rng = SeededRng::new(0x1234_5678);
        for _ in 0..10_000 {
            let value = rng.next_unit();
            assert!((0.0..1.0).contains(&value), "draw {value} escaped [0,1)");
        }
    }

    #[test]
    fn range_draws_respect_bounds() {
        let mut rng = SeededRng::new(7);
        for _ in 0..10_000 {
            let value = rng.range(400.0, 2000.0);
            assert!((400.0..2000.0).contains(&value));
        }
        assert_eq!(rng.range(3.0, 3.0), 3.0);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = SeededRng::new(99);
        let mut b = SeededRng::new(99);
        for _ in 0..64 {
            assert_eq!(a.next(), b.next());
        }
    }
}
