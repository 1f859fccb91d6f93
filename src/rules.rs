use std::fmt;

/// Which right-hand-side position is the syntactic head of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Governor {
  Child(usize),
  None,
}

impl Governor {
  pub fn is(&self, idx: usize) -> bool {
    matches!(self, Self::Child(g) if *g == idx)
  }
}

impl Default for Governor {
  /// Unary rules and rules without a `+` mark are governed by their first element.
  fn default() -> Self {
    Self::Child(0)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
  pub head: String,
  pub right: Vec<String>,
  pub governor: Governor,
}

impl Rule {
  pub fn new(head: impl Into<String>, right: Vec<String>, governor: Governor) -> Self {
    Self {
      head: head.into(),
      right,
      governor,
    }
  }

  pub fn len(&self) -> usize {
    self.right.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// True if the first right-hand-side pattern carries a wildcard
  pub fn is_wildcard(&self) -> bool {
    self.right.first().is_some_and(|p| p.contains('*'))
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ==>", self.head)?;
    for (idx, p) in self.right.iter().enumerate() {
      let sep = if idx == 0 { " " } else { ", " };
      let mark = if self.governor.is(idx) { "+" } else { "" };
      write!(f, "{}{}{}", sep, mark, p)?;
    }
    write!(f, " .")
  }
}

#[test]
fn test_rule_display() {
  let r = Rule::new(
    "sn",
    vec!["det".to_string(), "n".to_string()],
    Governor::Child(1),
  );
  assert_eq!(r.to_string(), "sn ==> det, +n .");
  assert!(!r.is_wildcard());

  let w = Rule::new("verb", vec!["VMI*".to_string()], Governor::None);
  assert_eq!(w.to_string(), "verb ==> VMI* .");
  assert!(w.is_wildcard());
}
