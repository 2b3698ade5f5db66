/// Source of `n!` for the Poisson mass function.
pub trait Factorial {
    fn get(&self, n: u8) -> u128;
}

#[derive(Default)]
pub struct Calculator;

impl Factorial for Calculator {
    #[inline]
    fn get(&self, n: u8) -> u128 {
        assert!(n <= 34, "{n}! overflows");
        let mut product = 1u128;
        for i in 2..=n {
            product *= i as u128;
        }
        product
    }
}

const MAX_ENTRIES: usize = 35;

/// Precomputed factorials up to `34!`, the largest that fits a `u128`.
pub struct Lookup {
    entries: [u128; MAX_ENTRIES],
}
impl Factorial for Lookup {
    #[inline]
    fn get(&self, n: u8) -> u128 {
        self.entries[n as usize]
    }
}

impl Default for Lookup {
    fn default() -> Self {
        let mut entries = [1u128; MAX_ENTRIES];
        for i in 2..MAX_ENTRIES {
            entries[i] = i as u128 * entries[i - 1];
        }
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn calculator() {
        test_impl(Calculator::default());
    }

    #[test]
    pub fn lookup() {
        test_impl(Lookup::default());
    }

    #[test]
    pub fn lookup_agrees_with_calculator_to_the_limit() {
        let (calculator, lookup) = (Calculator, Lookup::default());
        for n in 0..MAX_ENTRIES as u8 {
            assert_eq!(calculator.get(n), lookup.get(n), "{n}!");
        }
    }

    fn test_impl(f: impl Factorial) {
        assert_eq!(1, f.get(0));
        assert_eq!(1, f.get(1));
        assert_eq!(2, f.get(2));
        assert_eq!(6, f.get(3));
        assert_eq!(24, f.get(4));
        assert_eq!(40_320, f.get(8));
        assert_eq!(3_628_800, f.get(10));
    }
}
