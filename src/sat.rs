//! Three-valued satisfiability lattice.
//!
//! `Unknown` only exists before evaluation has run; every evaluation step
//! produces `Sat` or `Unsat`. The operators combine step results:
//!
//! | `&`     | Sat   | Unsat | Unknown |
//! |---------|-------|-------|---------|
//! | Sat     | Sat   | Unsat | Sat     |
//! | Unsat   | Unsat | Unsat | Unsat   |
//! | Unknown | Sat   | Unsat | Unknown |
//!
//! `|` is dual: `Sat` absorbs. `Unknown` is the identity of both operators.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Satisfiability {
    Sat,
    Unsat,
    #[default]
    Unknown,
}

impl Satisfiability {
    pub fn is_sat(self) -> bool {
        self == Satisfiability::Sat
    }

    pub fn is_unsat(self) -> bool {
        self == Satisfiability::Unsat
    }

    pub fn from_bool(holds: bool) -> Self {
        if holds {
            Satisfiability::Sat
        } else {
            Satisfiability::Unsat
        }
    }
}

impl BitAnd for Satisfiability {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        use Satisfiability::*;
        match (self, rhs) {
            (Unsat, _) | (_, Unsat) => Unsat,
            (Unknown, other) | (other, Unknown) => other,
            (Sat, Sat) => Sat,
        }
    }
}

impl BitOr for Satisfiability {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        use Satisfiability::*;
        match (self, rhs) {
            (Sat, _) | (_, Sat) => Sat,
            (Unknown, other) | (other, Unknown) => other,
            (Unsat, Unsat) => Unsat,
        }
    }
}

impl BitAndAssign for Satisfiability {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = *self & rhs;
    }
}

impl BitOrAssign for Satisfiability {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

impl fmt::Display for Satisfiability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Satisfiability::Sat => f.write_str("sat"),
            Satisfiability::Unsat => f.write_str("unsat"),
            Satisfiability::Unknown => f.write_str("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Satisfiability::{self, *};

    const ALL: [Satisfiability; 3] = [Sat, Unsat, Unknown];

    #[test]
    fn test_and_table() {
        assert_eq!(Sat & Sat, Sat);
        assert_eq!(Sat & Unknown, Sat);
        assert_eq!(Unknown & Sat, Sat);
        assert_eq!(Unknown & Unknown, Unknown);
        for x in ALL {
            assert_eq!(Unsat & x, Unsat);
            assert_eq!(x & Unsat, Unsat);
        }
    }

    #[test]
    fn test_or_table() {
        for x in ALL {
            assert_eq!(Sat | x, Sat);
            assert_eq!(x | Sat, Sat);
            assert_eq!(Unknown | x, x);
        }
        assert_eq!(Unsat | Unsat, Unsat);
        assert_eq!(Unsat | Unknown, Unsat);
    }

    #[test]
    fn test_operators_commute() {
        for a in ALL {
            for b in ALL {
                assert_eq!(a & b, b & a);
                assert_eq!(a | b, b | a);
            }
        }
    }

    #[test]
    fn test_default_and_display() {
        assert_eq!(Satisfiability::default(), Unknown);
        assert_eq!(Sat.to_string(), "sat");
        assert_eq!(Unsat.to_string(), "unsat");
    }
}
