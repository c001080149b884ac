use serde::{Deserialize, Serialize};

/// The six comparators a rule's `when` guard may use against a metric
/// reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=` or `==`
    Eq,
}

impl Comparator {
    /// Evaluate `lhs <comparator> rhs`.
    pub fn evaluate(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Lt => lhs < rhs,
            Comparator::Le => lhs <= rhs,
            Comparator::Gt => lhs > rhs,
            Comparator::Ge => lhs >= rhs,
            Comparator::Eq => (lhs - rhs).abs() < f64::EPSILON,
        }
    }
}

/// A rule's optional value guard: bare-number equality, or an explicit
/// comparator against a number, parsed once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct When {
    /// The comparator to apply.
    pub comparator: Comparator,
    /// The right-hand side of the comparison.
    pub rhs: f64,
}

impl When {
    /// Evaluate this guard against a live metric reading.
    pub fn matches(&self, reading: f64) -> bool {
        self.comparator.evaluate(reading, self.rhs)
    }

    /// Parse a `when` value from its two accepted wire forms: a bare number
    /// (implicit equality) or a string of the form `"<op> <number>"`.
    pub fn parse_str(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        for (prefix, comparator) in [
            (">=", Comparator::Ge),
            ("<=", Comparator::Le),
            ("==", Comparator::Eq),
            (">", Comparator::Gt),
            ("<", Comparator::Lt),
            ("=", Comparator::Eq),
        ] {
            if let Some(rest) = raw.strip_prefix(prefix) {
                let rhs: f64 = rest
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid 'when' comparator value: '{raw}'"))?;
                return Ok(When { comparator, rhs });
            }
        }
        let rhs: f64 = raw
            .parse()
            .map_err(|_| format!("invalid 'when' expression: '{raw}'"))?;
        Ok(When {
            comparator: Comparator::Eq,
            rhs,
        })
    }

    /// Build a `when` guard from a bare numeric literal (implicit equality).
    pub fn from_number(rhs: f64) -> Self {
        When {
            comparator: Comparator::Eq,
            rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_comparator() {
        assert_eq!(When::parse_str(">= 5").unwrap().comparator, Comparator::Ge);
        assert_eq!(When::parse_str("<=5").unwrap().comparator, Comparator::Le);
        assert_eq!(When::parse_str("== 1").unwrap().comparator, Comparator::Eq);
        assert_eq!(When::parse_str("> 1").unwrap().comparator, Comparator::Gt);
        assert_eq!(When::parse_str("< 1").unwrap().comparator, Comparator::Lt);
        assert_eq!(When::parse_str("= 1").unwrap().comparator, Comparator::Eq);
    }

    #[test]
    fn bare_number_is_equality() {
        let w = When::parse_str("5").unwrap();
        assert_eq!(w.comparator, Comparator::Eq);
        assert!(w.matches(5.0));
        assert!(!w.matches(5.1));
    }

    #[test]
    fn rejects_garbage() {
        assert!(When::parse_str("not a number").is_err());
        assert!(When::parse_str(">= banana").is_err());
    }

    #[test]
    fn ge_matches_boundary_and_above() {
        let w = When::parse_str(">= 5").unwrap();
        assert!(w.matches(5.0));
        assert!(w.matches(6.0));
        assert!(!w.matches(4.9));
    }
}
