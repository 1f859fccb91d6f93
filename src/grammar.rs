use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::rules::Rule;

/// Priority given to non-terminals not listed in any `@PRIOR` directive
pub const DEFAULT_PRIORITY: usize = 9999;

/// Read-only queries the chart makes against a rule set.
pub trait Grammar {
  fn start_symbol(&self) -> &str;

  /// Anything that is not a rule head (or the start symbol) is terminal
  fn is_terminal(&self, category: &str) -> bool;

  /// Lower is more specific. `TAG(form)` beats `TAG<lemma>` beats a bare `TAG`.
  /// The first closing bracket has to end the category, so `Fpt())` is bare.
  fn specificity(&self, category: &str) -> usize {
    let closes = |c: char| category.find(c).is_some_and(|i| i + 1 == category.len());
    if category.contains('(') && closes(')') {
      0
    } else if category.contains('<') && closes('>') {
      1
    } else {
      2
    }
  }

  /// Lower is higher priority
  fn priority(&self, category: &str) -> usize;

  fn is_hidden(&self, category: &str) -> bool;
  fn is_onlytop(&self, category: &str) -> bool;
  fn is_flat(&self, category: &str) -> bool;
  fn is_notop(&self, category: &str) -> bool;

  fn rules_with_rhs_starting(&self, category: &str) -> &[Arc<Rule>];

  /// Rules whose first right-hand-side pattern is wildcarded, keyed by
  /// the first character of that pattern
  fn wildcard_rules_for_prefix(&self, first: char) -> &[Arc<Rule>];

  /// Checks a `(form)`/`<lemma>` condition against a file-backed list
  /// registered under `reference`
  fn lookup_literal_condition(&self, condition: &str, reference: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct RuleSet {
  pub(crate) start: String,
  pub(crate) rules: HashMap<String, Vec<Arc<Rule>>>,
  pub(crate) wild: HashMap<char, Vec<Arc<Rule>>>,
  pub(crate) nonterminals: HashSet<String>,
  pub(crate) prior: HashMap<String, usize>,
  pub(crate) hidden: HashSet<String>,
  pub(crate) flat: HashSet<String>,
  pub(crate) notop: HashSet<String>,
  pub(crate) onlytop: HashSet<String>,
  pub(crate) filemap: HashMap<String, Vec<String>>,
}

impl RuleSet {
  /// Stores a rule, indexed by the first pattern of its right-hand side.
  pub(crate) fn add_rule(&mut self, rule: Rule) {
    let rule = Arc::new(rule);
    self.nonterminals.insert(rule.head.clone());

    if let Some(first) = rule.right.first() {
      if rule.is_wildcard() {
        if let Some(c) = first.chars().next() {
          self.wild.entry(c).or_default().push(rule.clone());
        }
      }
      self.rules.entry(first.clone()).or_default().push(rule);
    }
  }

  pub(crate) fn add_file_condition(&mut self, condition: String, reference: String) {
    self.filemap.entry(condition).or_default().push(reference);
  }

  pub fn len(&self) -> usize {
    self.rules.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
    self.rules.values().flatten()
  }
}

impl Grammar for RuleSet {
  fn start_symbol(&self) -> &str {
    &self.start
  }

  fn is_terminal(&self, category: &str) -> bool {
    !self.nonterminals.contains(category)
  }

  fn priority(&self, category: &str) -> usize {
    self.prior.get(category).copied().unwrap_or(DEFAULT_PRIORITY)
  }

  fn is_hidden(&self, category: &str) -> bool {
    self.hidden.contains(category)
  }

  fn is_onlytop(&self, category: &str) -> bool {
    self.onlytop.contains(category)
  }

  fn is_flat(&self, category: &str) -> bool {
    self.flat.contains(category)
  }

  fn is_notop(&self, category: &str) -> bool {
    self.notop.contains(category)
  }

  fn rules_with_rhs_starting(&self, category: &str) -> &[Arc<Rule>] {
    self.rules.get(category).map(Vec::as_slice).unwrap_or(&[])
  }

  fn wildcard_rules_for_prefix(&self, first: char) -> &[Arc<Rule>] {
    self.wild.get(&first).map(Vec::as_slice).unwrap_or(&[])
  }

  fn lookup_literal_condition(&self, condition: &str, reference: &str) -> bool {
    self
      .filemap
      .get(condition)
      .is_some_and(|refs| refs.iter().any(|r| r == reference))
  }
}

impl fmt::Display for RuleSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "%% start: {}", self.start)?;
    write!(f, "%% nonterminals:")?;
    for nt in self.nonterminals.iter() {
      write!(f, " {}", nt)?;
    }
    writeln!(f)?;

    for rule in self.rules() {
      writeln!(f, "{}", rule)?;
    }

    Ok(())
  }
}

#[cfg(test)]
use crate::rules::Governor;

#[cfg(test)]
fn rule(head: &str, right: &[&str]) -> Rule {
  Rule::new(
    head,
    right.iter().map(|s| s.to_string()).collect(),
    Governor::default(),
  )
}

#[test]
fn test_indices() {
  let mut g = RuleSet::default();
  g.add_rule(rule("sn", &["det", "n"]));
  g.add_rule(rule("sn", &["n"]));
  g.add_rule(rule("verb", &["VMI*"]));

  assert_eq!(g.len(), 3);
  assert_eq!(g.rules_with_rhs_starting("det").len(), 1);
  assert_eq!(g.rules_with_rhs_starting("n").len(), 1);
  assert_eq!(g.rules_with_rhs_starting("adj").len(), 0);
  assert_eq!(g.wildcard_rules_for_prefix('V').len(), 1);
  assert_eq!(g.wildcard_rules_for_prefix('N').len(), 0);

  assert!(!g.is_terminal("sn"));
  assert!(g.is_terminal("det"));
  assert!(g.is_terminal("VMI3SP0"));
}

#[test]
fn test_specificity() {
  let g = RuleSet::default();
  assert_eq!(g.specificity("NN(cat)"), 0);
  assert_eq!(g.specificity("NN<cat>"), 1);
  assert_eq!(g.specificity("NN"), 2);
  assert_eq!(g.specificity("Fpt())"), 2);
  assert_eq!(g.specificity("Fp(a)b)"), 2);
  assert_eq!(g.specificity("Fg<>>"), 2);
}

#[test]
fn test_priority_default() {
  let mut g = RuleSet::default();
  g.prior.insert("sn".to_string(), 1);
  assert_eq!(g.priority("sn"), 1);
  assert_eq!(g.priority("sa"), DEFAULT_PRIORITY);
}

#[test]
fn test_file_conditions() {
  let mut g = RuleSet::default();
  g.add_file_condition("<comer>".to_string(), "<\"verbs.dat\">".to_string());
  assert!(g.lookup_literal_condition("<comer>", "<\"verbs.dat\">"));
  assert!(!g.lookup_literal_condition("<beber>", "<\"verbs.dat\">"));
  assert!(!g.lookup_literal_condition("<comer>", "<\"other.dat\">"));
}
