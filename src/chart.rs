use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::grammar::Grammar;
use crate::rules::{Governor, Rule};
use crate::sentence::Sentence;
use crate::syntree::{Node, ParseTree};
use crate::utils::{is_file_reference, split_condition, wildcard_prefix};
use crate::Err;

/// A rule application: how much of the rule's right-hand side has been
/// matched, and the cells `(span, start)` that matched each piece.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
  pub rule: Arc<Rule>,
  pub pos: usize,
  pub backpath: Vec<(usize, usize)>,
}

impl Edge {
  pub fn new(rule: &Arc<Rule>) -> Self {
    Self {
      rule: rule.clone(),
      pos: 0,
      backpath: Vec::new(),
    }
  }

  /// An already complete edge for a lexical category
  pub fn lexical(category: impl Into<String>) -> Self {
    Self::new(&Arc::new(Rule::new(category, Vec::new(), Governor::default())))
  }

  pub fn head(&self) -> &str {
    &self.rule.head
  }

  pub fn matched(&self) -> &[String] {
    &self.rule.right[..self.pos]
  }

  pub fn pending(&self) -> &[String] {
    &self.rule.right[self.pos..]
  }

  pub fn next_pattern(&self) -> Option<&str> {
    self.pending().first().map(String::as_str)
  }

  pub fn governor(&self) -> Governor {
    self.rule.governor
  }

  pub fn is_active(&self) -> bool {
    self.pos < self.rule.len()
  }

  /// Matches the next pending pattern against the cell at `(span, start)`.
  /// Inactive edges can't be shifted.
  pub fn shift(&self, span: usize, start: usize) -> Option<Self> {
    if !self.is_active() {
      return None;
    }
    let mut backpath = self.backpath.clone();
    backpath.push((span, start));
    Some(Self {
      rule: self.rule.clone(),
      pos: self.pos + 1,
      backpath,
    })
  }
}

impl fmt::Display for Edge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} →", self.head())?;
    for p in self.matched() {
      write!(f, " {}", p)?;
    }
    write!(f, " ・")?;
    for p in self.pending() {
      write!(f, " {}", p)?;
    }
    write!(f, "   backpath:")?;
    for (span, start) in self.backpath.iter() {
      write!(f, " ({},{})", span, start)?;
    }
    Ok(())
  }
}

/// The edges ending at one chart coordinate, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell(Vec<Edge>);

impl Cell {
  pub fn push(&mut self, edge: Edge) {
    self.0.push(edge);
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
    self.0.iter()
  }

  /// Complete edges only
  pub fn inactive(&self) -> impl Iterator<Item = &Edge> {
    self.0.iter().filter(|e| !e.is_active())
  }
}

/// Triangular table of cells for one tag sequence of a sentence. Cell
/// `(span, start)` covers tokens `start..=start + span`.
pub struct Chart<'g, G: Grammar + ?Sized> {
  grammar: &'g G,
  table: Vec<Cell>,
  size: usize,
}

impl<'g, G: Grammar + ?Sized> Chart<'g, G> {
  pub fn new(grammar: &'g G) -> Self {
    Self {
      grammar,
      table: Vec::new(),
      size: 0,
    }
  }

  /// Number of tokens in the loaded sentence
  pub fn size(&self) -> usize {
    self.size
  }

  /// Position of cell `(span, start)` in the flattened table. Rows are laid
  /// out by increasing span, row `span` holding `size - span` cells.
  pub fn index(&self, span: usize, start: usize) -> usize {
    start + span * (self.size + 1) - span * (span + 1) / 2
  }

  pub fn cell(&self, span: usize, start: usize) -> &Cell {
    &self.table[self.index(span, start)]
  }

  /// Fills the bottom row with the analyses selected under sequence `k`.
  /// Every analysis is seeded three times: as its bare tag, as `tag(form)`
  /// and as `tag<lemma>`, each closed under the grammar's rules.
  pub fn load_sentence(&mut self, sentence: &Sentence, k: usize) {
    let n = sentence.len();
    self.size = n;
    self.table = vec![Cell::default(); (n + 1) * n / 2];

    for (j, word) in sentence.words().iter().enumerate() {
      let mut cell = Cell::default();
      for analysis in word.selected(k) {
        let categories = [
          analysis.tag.clone(),
          format!("{}({})", analysis.tag, word.lc_form),
          format!("{}<{}>", analysis.tag, analysis.lemma),
        ];
        for category in categories {
          trace!(%category, cell = ?(0, j), "seeding edge");
          let edge = Edge::lexical(category);
          cell.push(edge.clone());
          self.find_all_rules(&edge, &mut cell, 0, j);
        }
      }
      let idx = self.index(0, j);
      self.table[idx] = cell;
    }

    debug!(size = n, kbest = k, "sentence loaded");
  }

  /// Completes the chart bottom-up. If no acceptable edge spans the whole
  /// sentence, a root made of the best partial analyses is forced into the
  /// top cell.
  pub fn parse(&mut self) -> Result<(), Err> {
    if self.size == 0 {
      return Err("cannot parse an empty sentence".into());
    }

    for k in 1..self.size {
      for i in 0..self.size - k {
        let mut cell = Cell::default();
        for a in 0..k {
          let (span, start) = (k - a - 1, i + a + 1);
          for edge in self.cell(a, i).iter() {
            let Some(pattern) = edge.next_pattern() else {
              continue;
            };
            if !self.can_extend(pattern, span, start) {
              continue;
            }
            let Some(shifted) = edge.shift(span, start) else {
              continue;
            };
            trace!(edge = %shifted, cell = ?(k, i), "extended");
            if shifted.is_active() {
              cell.push(shifted);
            } else {
              cell.push(shifted.clone());
              self.find_all_rules(&shifted, &mut cell, k, i);
            }
          }
        }
        let idx = self.index(k, i);
        self.table[idx] = cell;
      }
    }

    let top = self.cell(self.size - 1, 0);
    let g = self.grammar;
    let root = self.best_edge(
      top
        .inactive()
        .filter(|e| !g.is_notop(e.head()) && !g.is_hidden(e.head())),
    );
    if let Some(root) = root {
      debug!(root = root.head(), "found full parse");
      return Ok(());
    }

    self.force_root()
  }

  /// Builds an edge headed by the start symbol over the best covering of
  /// the sentence and pushes it into the top cell.
  fn force_root(&mut self) -> Result<(), Err> {
    let covering = self.cover(self.size as isize - 1, 0)?;

    let mut right = Vec::with_capacity(covering.len());
    for &(span, start) in covering.iter() {
      let best = self
        .best_edge(self.cell(span, start).inactive())
        .ok_or("inconsistent chart: covering cell without inactive edge")?;
      right.push(best.head().to_string());
    }

    let rule = Arc::new(Rule::new(self.grammar.start_symbol(), right, Governor::None));
    let edge = covering
      .iter()
      .try_fold(Edge::new(&rule), |e, &(span, start)| e.shift(span, start))
      .ok_or("inconsistent chart: covering longer than forced rule")?;

    debug!(root = %edge, "forced root");
    let top = self.index(self.size - 1, 0);
    self.table[top].push(edge);
    Ok(())
  }

  /// Cells whose best edges, left to right, cover the tokens under `(a, b)`.
  /// Takes the highest cell holding a complete edge, then covers what is
  /// left on either side of it.
  fn cover(&self, a: isize, b: isize) -> Result<Vec<(usize, usize)>, Err> {
    if a < 0 || b < 0 || (a + b) as usize >= self.size {
      return Ok(Vec::new());
    }
    let (span, start) = (a as usize, b as usize);

    let mut found: Option<(usize, usize, &Edge)> = None;
    for i in (0..=span).rev() {
      for j in start..=start + (span - i) {
        for e in self.cell(i, j).inactive() {
          if self.better_edge(e, found.map(|(_, _, best)| best)) {
            found = Some((i, j, e));
          }
        }
      }
      if found.is_some() {
        break;
      }
    }

    let Some((x, y, _)) = found else {
      return Err(format!("inconsistent chart or wrongly loaded sentence: nothing covers ({}, {})", a, b).into());
    };
    trace!(cell = ?(x, y), under = ?(a, b), "highest covering cell");

    let (x, y) = (x as isize, y as isize);
    let mut cells = self.cover(y - b - 1, b)?;
    cells.push((x as usize, y as usize));
    cells.extend(self.cover(a + b - x - y - 1, x + y + 1)?);
    Ok(cells)
  }

  /// True if `e1` should be preferred over `e2`. `None` always loses.
  pub fn better_edge(&self, e1: &Edge, e2: Option<&Edge>) -> bool {
    let Some(e2) = e2 else {
      return true;
    };
    let g = self.grammar;
    let (h1, h2) = (e1.head(), e2.head());

    let start = g.start_symbol();
    if h1 == start && h2 != start {
      return true;
    }
    if h1 != start && h2 == start {
      return false;
    }

    match (g.is_terminal(h1), g.is_terminal(h2)) {
      (true, true) => g.specificity(h1) < g.specificity(h2),
      (false, false) => match g.priority(h1).cmp(&g.priority(h2)) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => e1.matched().len() > e2.matched().len(),
      },
      (t1, _) => !t1,
    }
  }

  /// First edge that no later edge beats
  pub fn best_edge<'a>(&self, edges: impl IntoIterator<Item = &'a Edge>) -> Option<&'a Edge> {
    edges.into_iter().fold(None, |best, e| {
      if self.better_edge(e, best) { Some(e) } else { best }
    })
  }

  /// Does the category `found` satisfy the rule pattern `searched`?
  /// Patterns may hold a `*` wildcard after a tag prefix, and a trailing
  /// form or lemma condition that must then appear literally on `found`,
  /// or be listed in the file the condition refers to.
  pub fn check_match(&self, searched: &str, found: &str) -> bool {
    if searched == found {
      return true;
    }

    let Some(prefix) = wildcard_prefix(searched) else {
      return false;
    };
    if !found.starts_with(prefix) {
      return false;
    }

    let (_, has) = split_condition(found);
    let (_, wanted) = split_condition(searched);
    if is_file_reference(wanted) {
      self.grammar.lookup_literal_condition(has, wanted)
    } else {
      has == wanted
    }
  }

  fn can_extend(&self, pattern: &str, span: usize, start: usize) -> bool {
    self
      .cell(span, start)
      .inactive()
      .any(|e| self.check_match(pattern, e.head()))
  }

  /// Adds to `cell` every rule started by the complete edge `edge`, and
  /// transitively every rule started by the rules it completes.
  fn find_all_rules(&self, edge: &Edge, cell: &mut Cell, span: usize, start: usize) {
    let g = self.grammar;
    let mut pending = VecDeque::new();

    if g.is_terminal(edge.head()) {
      if let Some(first) = edge.head().chars().next() {
        for rule in g.wildcard_rules_for_prefix(first) {
          let matches = rule
            .right
            .first()
            .is_some_and(|p| self.check_match(p, edge.head()));
          if !matches {
            continue;
          }
          if let Some(e) = Edge::new(rule).shift(span, start) {
            trace!(rule = %rule, category = edge.head(), "wildcard rule");
            if !e.is_active() {
              pending.push_back(e.head().to_string());
            }
            cell.push(e);
          }
        }
      }
    }

    // each label is expanded once, so cyclic unary rules terminate
    let mut visited = HashSet::new();
    pending.push_back(edge.head().to_string());
    while let Some(label) = pending.pop_front() {
      if !visited.insert(label.clone()) {
        continue;
      }
      for rule in g.rules_with_rhs_starting(&label) {
        if let Some(e) = Edge::new(rule).shift(span, start) {
          trace!(rule = %rule, "rule started");
          if !e.is_active() {
            pending.push_back(e.head().to_string());
          }
          cell.push(e);
        }
      }
    }
  }

  /// Tree for the best visible analysis of cell `(span, start)`
  pub fn get_tree(&self, span: usize, start: usize) -> Result<ParseTree, Err> {
    self.subtree(span, start, None)
  }

  fn subtree(&self, span: usize, start: usize, label: Option<&str>) -> Result<ParseTree, Err> {
    let g = self.grammar;
    let cell = self.cell(span, start);

    let label = match label {
      Some(label) => label.to_string(),
      None => self
        .best_edge(cell.inactive().filter(|e| !g.is_hidden(e.head())))
        .map(|e| e.head().to_string())
        .ok_or_else(|| -> Err { format!("no visible edge at ({}, {})", span, start).into() })?,
    };

    let mut tree = ParseTree::new(Node::new(label.clone()));
    let start_symbol = g.start_symbol();
    if label != start_symbol && g.is_terminal(&label) {
      return Ok(tree);
    }

    let best = self
      .best_edge(cell.inactive().filter(|e| e.head() == label))
      .ok_or_else(|| -> Err {
        format!("inconsistent chart: no complete {} at ({}, {})", label, span, start).into()
      })?;

    let governor = best.governor();
    let mut headset = false;
    for (ch, (category, &(cspan, cstart))) in best.matched().iter().zip(best.backpath.iter()).enumerate() {
      let mut child = self.subtree(cspan, cstart, Some(category.as_str()))?;

      let child_label = child.label();
      let splice = g.is_hidden(child_label)
        || g.is_onlytop(child_label)
        || (g.is_flat(child_label) && child_label == label);

      if splice {
        // the skipped node's own head stays head only if the node was the governor
        for mut grandchild in child.children {
          if governor.is(ch) {
            headset = true;
          } else {
            grandchild.node.head = false;
          }
          tree.add_child(grandchild);
        }
      } else {
        if governor.is(ch) {
          child.node.head = true;
          headset = true;
        }
        tree.add_child(child);
      }
    }

    if !headset && label != start_symbol {
      warn!(%label, span, start, "unset rule governor");
    }

    Ok(tree)
  }
}

impl<G: Grammar + ?Sized> fmt::Display for Chart<'_, G> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for span in 0..self.size {
      for start in 0..self.size - span {
        let cell = self.cell(span, start);
        if cell.is_empty() {
          continue;
        }
        writeln!(f, "Cell ({},{}):", span, start)?;
        for edge in cell.iter() {
          writeln!(f, "  {}", edge)?;
        }
      }
    }
    Ok(())
  }
}

#[cfg(test)]
use crate::grammar::RuleSet;
#[cfg(test)]
use crate::sentence::Word;

#[cfg(test)]
fn sentence(tokens: &[(&str, &str, &str)]) -> Sentence {
  let words = tokens
    .iter()
    .map(|(form, lemma, tag)| Word::tagged(*form, lemma, tag))
    .collect();
  Sentence::new("1", words).unwrap()
}

#[cfg(test)]
fn parsed<'g>(g: &'g RuleSet, s: &Sentence) -> Chart<'g, RuleSet> {
  let mut chart = Chart::new(g);
  chart.load_sentence(s, 0);
  chart.parse().unwrap();
  chart
}

#[cfg(test)]
fn labels(tree: &ParseTree) -> Vec<&str> {
  tree.children.iter().map(|c| c.label()).collect()
}

#[test]
fn test_index_is_bijective() {
  let g: RuleSet = "@START S .".parse().unwrap();
  for n in 1..10 {
    let mut chart = Chart::new(&g);
    chart.size = n;
    let mut seen = HashSet::new();
    for span in 0..n {
      for start in 0..n - span {
        let idx = chart.index(span, start);
        assert!(idx < (n + 1) * n / 2);
        assert!(seen.insert(idx), "collision at ({}, {})", span, start);
      }
    }
    assert_eq!(seen.len(), (n + 1) * n / 2);
  }
}

#[test]
fn test_simple_phrase() {
  let g: RuleSet = "NP ==> DT, +NN . @START S .".parse().unwrap();
  let s = sentence(&[("the", "the", "DT"), ("cat", "cat", "NN")]);
  let chart = parsed(&g, &s);

  let np = chart
    .cell(1, 0)
    .inactive()
    .find(|e| e.head() == "NP")
    .unwrap();
  assert_eq!(np.backpath, vec![(0, 0), (0, 1)]);
  assert_eq!(np.matched(), ["DT", "NN"]);

  let tree = chart.get_tree(1, 0).unwrap();
  assert_eq!(tree.label(), "NP");
  assert_eq!(labels(&tree), vec!["DT", "NN"]);
  assert!(!tree.children[0].node.head);
  assert!(tree.children[1].node.head);
}

#[test]
fn test_fallback_cover() {
  let g: RuleSet = "XP ==> DT, +NN . YP ==> VB . @START S .".parse().unwrap();
  let s = sentence(&[("the", "the", "DT"), ("cat", "cat", "NN"), ("runs", "run", "VB")]);
  let chart = parsed(&g, &s);

  let forced = chart.cell(2, 0).inactive().find(|e| e.head() == "S").unwrap();
  assert_eq!(forced.backpath, vec![(1, 0), (0, 2)]);
  assert_eq!(forced.matched(), ["XP", "YP"]);
  assert_eq!(forced.governor(), Governor::None);

  let tree = chart.get_tree(2, 0).unwrap();
  assert_eq!(tree.label(), "S");
  assert_eq!(labels(&tree), vec!["XP", "YP"]);
  assert_eq!(labels(&tree.children[0]), vec!["DT", "NN"]);
  assert!(tree.children.iter().all(|c| !c.node.head));
}

#[test]
fn test_notop_forces_root() {
  let g: RuleSet = "x ==> DT, +NN . @NOTOP x . @START S .".parse().unwrap();
  let s = sentence(&[("the", "the", "DT"), ("cat", "cat", "NN")]);
  let chart = parsed(&g, &s);

  let tree = chart.get_tree(1, 0).unwrap();
  assert_eq!(tree.label(), "S");
  assert_eq!(labels(&tree), vec!["x"]);
  assert_eq!(labels(&tree.children[0]), vec!["DT", "NN"]);
}

#[test]
fn test_cover_inner_region() {
  let g: RuleSet = "XP ==> DT, +NN . YP ==> VB . @START S .".parse().unwrap();
  let s = sentence(&[
    ("runs", "run", "VB"),
    ("the", "the", "DT"),
    ("cat", "cat", "NN"),
    ("runs", "run", "VB"),
  ]);
  let chart = parsed(&g, &s);

  let forced = chart.cell(3, 0).inactive().find(|e| e.head() == "S").unwrap();
  assert_eq!(forced.backpath, vec![(0, 0), (1, 1), (0, 3)]);

  assert_eq!(chart.cover(2, 1).unwrap(), vec![(1, 1), (0, 3)]);
  assert_eq!(chart.cover(0, 1).unwrap(), vec![(0, 1)]);
  assert!(chart.cover(-1, 0).unwrap().is_empty());
  assert!(chart.cover(0, 4).unwrap().is_empty());
}

#[test]
fn test_hidden_root_forces_start() {
  let g: RuleSet = "x ==> DT, +NN . @HIDDEN x . @START S .".parse().unwrap();
  let s = sentence(&[("the", "the", "DT"), ("cat", "cat", "NN")]);
  let chart = parsed(&g, &s);

  let tree = chart.get_tree(1, 0).unwrap();
  assert_eq!(tree.label(), "S");
  assert_eq!(labels(&tree), vec!["DT", "NN"]);
  assert!(tree.children.iter().all(|c| !c.node.head));
}

#[test]
fn test_wildcard_match() {
  let g: RuleSet = "@START S .".parse().unwrap();
  let chart = Chart::new(&g);

  assert!(chart.check_match("VMI*<comer>", "VMI3SP0<comer>"));
  assert!(!chart.check_match("VMI*<comer>", "VMI3SP0<beber>"));
  assert!(!chart.check_match("VMI*<comer>", "VMS3SP0<comer>"));

  assert!(chart.check_match("VMI*", "VMI3SP0"));
  assert!(!chart.check_match("VMI*", "VMI3SP0<comer>"));
  assert!(chart.check_match("N*(gatos)", "NCMP000(gatos)"));
}

#[test]
fn test_literal_match() {
  let g: RuleSet = "@START S .".parse().unwrap();
  let chart = Chart::new(&g);

  for c in ["NN", "NN(cat)", "VMI*", "sn"] {
    assert!(chart.check_match(c, c));
  }
  assert!(!chart.check_match("NN", "NNS"));
  assert!(!chart.check_match("NN", "NN(cat)"));
}

#[test]
fn test_file_condition_match() {
  let mut g: RuleSet = "@START S .".parse().unwrap();
  g.add_file_condition("<comer>".to_string(), "<\"verbs.dat\">".to_string());
  let chart = Chart::new(&g);

  assert!(chart.check_match("VMI*<\"verbs.dat\">", "VMI3SP0<comer>"));
  assert!(!chart.check_match("VMI*<\"verbs.dat\">", "VMI3SP0<beber>"));
  assert!(!chart.check_match("VMI*<\"verbs.dat\">", "VMI3SP0"));
}

#[test]
fn test_better_edge() {
  let g: RuleSet = r#"
    a ==> NN .
    b ==> NN .
    c ==> NN, NN .
    @PRIOR b .
    @START S .
  "#
  .parse()
  .unwrap();
  let chart = Chart::new(&g);

  let start = Edge::lexical("S");
  let a = Edge::lexical("a");
  let b = Edge::lexical("b");
  let bare = Edge::lexical("NN");
  let form = Edge::lexical("NN(cat)");
  let lemma = Edge::lexical("NN<cat>");

  for e in [&a, &b, &bare, &form] {
    assert!(chart.better_edge(&start, Some(e)));
    assert!(!chart.better_edge(e, Some(&start)));
  }
  for e in [&start, &a, &bare] {
    assert!(chart.better_edge(e, None));
    assert!(!chart.better_edge(e, Some(e)));
  }

  assert!(chart.better_edge(&form, Some(&lemma)));
  assert!(chart.better_edge(&lemma, Some(&bare)));
  assert!(!chart.better_edge(&bare, Some(&form)));

  assert!(chart.better_edge(&b, Some(&a)));
  assert!(!chart.better_edge(&a, Some(&b)));

  assert!(chart.better_edge(&a, Some(&form)));
  assert!(!chart.better_edge(&form, Some(&a)));
}

#[test]
fn test_longer_rule_wins_tie() {
  let g: RuleSet = "c ==> NN | NN, +NN . @START S .".parse().unwrap();
  let chart = Chart::new(&g);
  let rules = g.rules_with_rhs_starting("NN");
  let short = rules.iter().find(|r| r.len() == 1).unwrap();
  let long = rules.iter().find(|r| r.len() == 2).unwrap();

  let short = Edge::new(short).shift(0, 0).unwrap();
  let long = Edge::new(long).shift(0, 0).unwrap().shift(0, 1).unwrap();
  assert!(chart.better_edge(&long, Some(&short)));
  assert!(!chart.better_edge(&short, Some(&long)));
}

#[test]
fn test_priority_picks_root() {
  let g: RuleSet = "a ==> NN . b ==> NN . @PRIOR b a . @START S .".parse().unwrap();
  let s = sentence(&[("cat", "cat", "NN")]);
  let chart = parsed(&g, &s);

  let tree = chart.get_tree(0, 0).unwrap();
  assert_eq!(tree.label(), "b");
  assert_eq!(labels(&tree), vec!["NN"]);
  assert!(tree.children[0].node.head);
}

#[test]
fn test_lexical_closure() {
  let g: RuleSet = r#"
    det ==> DT(the) .
    n ==> NN<cat> .
    n-bar ==> n .
    np ==> n-bar .
    @START S .
  "#
  .parse()
  .unwrap();
  let s = sentence(&[("The", "the", "DT"), ("cat", "cat", "NN")]);

  let mut chart = Chart::new(&g);
  chart.load_sentence(&s, 0);

  let heads = |j: usize| {
    chart
      .cell(0, j)
      .inactive()
      .map(|e| e.head().to_string())
      .collect::<Vec<_>>()
  };
  assert_eq!(heads(0), vec!["DT", "DT(the)", "det", "DT<the>"]);
  assert_eq!(heads(1), vec!["NN", "NN(cat)", "NN<cat>", "n", "n-bar", "np"]);

  let np = chart.cell(0, 1).inactive().find(|e| e.head() == "np").unwrap();
  assert_eq!(np.backpath, vec![(0, 1)]);
}

#[test]
fn test_wildcard_rules_at_seeding() {
  let g: RuleSet = "verb ==> VMI*<comer> . @START S .".parse().unwrap();
  let s = sentence(&[("come", "comer", "VMIP3S0")]);
  let chart = parsed(&g, &s);

  assert!(chart.cell(0, 0).inactive().any(|e| e.head() == "verb"));
  let tree = chart.get_tree(0, 0).unwrap();
  assert_eq!(tree.label(), "verb");
  assert_eq!(labels(&tree), vec!["VMI*<comer>"]);
}

#[test]
fn test_cyclic_rules_terminate() {
  let g: RuleSet = "a ==> NN | b . b ==> a . @START S .".parse().unwrap();
  let s = sentence(&[("cat", "cat", "NN")]);
  let chart = parsed(&g, &s);

  let heads = chart.cell(0, 0).inactive().filter(|e| e.head() == "a").count();
  assert_eq!(heads, 2);
}

#[test]
fn test_hidden_child_is_spliced() {
  let g: RuleSet = r#"
    sn ==> DT, +n-bar .
    n-bar ==> JJ, +NN .
    @HIDDEN n-bar .
    @START S .
  "#
  .parse()
  .unwrap();
  let s = sentence(&[("the", "the", "DT"), ("big", "big", "JJ"), ("cat", "cat", "NN")]);
  let chart = parsed(&g, &s);

  let tree = chart.get_tree(2, 0).unwrap();
  assert_eq!(tree.label(), "sn");
  assert_eq!(labels(&tree), vec!["DT", "JJ", "NN"]);
  let heads = tree.children.iter().map(|c| c.node.head).collect::<Vec<_>>();
  assert_eq!(heads, vec![false, false, true]);
}

#[test]
fn test_onlytop_below_root_is_spliced() {
  let g: RuleSet = r#"
    sn ==> DT, +NN .
    grup ==> +sn, VB .
    @ONLYTOP sn .
    @START S .
  "#
  .parse()
  .unwrap();
  let s = sentence(&[("the", "the", "DT"), ("cat", "cat", "NN"), ("runs", "run", "VB")]);
  let chart = parsed(&g, &s);

  let tree = chart.get_tree(2, 0).unwrap();
  assert_eq!(tree.label(), "grup");
  assert_eq!(labels(&tree), vec!["DT", "NN", "VB"]);
  let heads = tree.children.iter().map(|c| c.node.head).collect::<Vec<_>>();
  assert_eq!(heads, vec![false, true, false]);

  let top = chart.get_tree(1, 0).unwrap();
  assert_eq!(top.label(), "sn");
  assert_eq!(labels(&top), vec!["DT", "NN"]);
}

#[test]
fn test_flat_recursion_is_spliced() {
  let g: RuleSet = r#"
    sn ==> DT, +NN | +sn, sp .
    sp ==> +IN, sn .
    @FLAT sn .
    @START S .
  "#
  .parse()
  .unwrap();
  let s = sentence(&[
    ("the", "the", "DT"),
    ("cat", "cat", "NN"),
    ("of", "of", "IN"),
    ("the", "the", "DT"),
    ("house", "house", "NN"),
  ]);
  let chart = parsed(&g, &s);

  let tree = chart.get_tree(4, 0).unwrap();
  assert_eq!(tree.label(), "sn");
  assert_eq!(labels(&tree), vec!["DT", "NN", "sp"]);
  assert!(tree.children[1].node.head);
  assert!(!tree.children[2].node.head);

  let sp = &tree.children[2];
  assert_eq!(labels(sp), vec!["IN", "sn"]);
  assert_eq!(labels(&sp.children[1]), vec!["DT", "NN"]);
}

#[test]
fn test_leaves_follow_sentence() {
  let g: RuleSet = "XP ==> DT, +NN . @START S .".parse().unwrap();
  let s = sentence(&[
    ("runs", "run", "VB"),
    ("the", "the", "DT"),
    ("cat", "cat", "NN"),
    ("fast", "fast", "RB"),
  ]);
  let chart = parsed(&g, &s);

  let tree = chart.get_tree(3, 0).unwrap();
  assert_eq!(tree.label(), "S");
  assert_eq!(labels(&tree), vec!["VB(runs)", "XP", "RB(fast)"]);
  assert_eq!(tree.leaves().count(), 4);
}

#[test]
fn test_unanalyzed_word_is_inconsistent() {
  let g: RuleSet = "@START S .".parse().unwrap();
  let s = Sentence::new("1", vec![Word::new("xyzzy", vec![vec![]])]).unwrap();

  let mut chart = Chart::new(&g);
  chart.load_sentence(&s, 0);
  assert!(chart.parse().is_err());
}

#[test]
fn test_shift() {
  let g: RuleSet = "NP ==> DT, +NN . @START S .".parse().unwrap();
  let rule = &g.rules_with_rhs_starting("DT")[0];

  let e = Edge::new(rule);
  assert!(e.is_active());
  assert_eq!(e.next_pattern(), Some("DT"));

  let e = e.shift(0, 0).unwrap();
  assert_eq!(e.matched(), ["DT"]);
  assert_eq!(e.pending(), ["NN"]);
  assert_eq!(e.backpath.len(), e.matched().len());

  let e = e.shift(0, 1).unwrap();
  assert!(!e.is_active());
  assert_eq!(e.governor(), Governor::Child(1));
  assert!(e.shift(0, 2).is_none());
}
