use tracing::debug;

use crate::chart::Chart;
use crate::grammar::Grammar;
use crate::sentence::Sentence;
use crate::Err;

/// Runs a fresh chart over every k-best tag sequence of a sentence and
/// attaches the resulting trees to it.
pub struct ChartParser<G: Grammar> {
  grammar: G,
}

impl<G: Grammar> ChartParser<G> {
  pub fn new(grammar: G) -> Self {
    Self { grammar }
  }

  pub fn grammar(&self) -> &G {
    &self.grammar
  }

  pub fn start_symbol(&self) -> &str {
    self.grammar.start_symbol()
  }

  pub fn analyze(&self, sentence: &mut Sentence) -> Result<(), Err> {
    if sentence.is_empty() {
      debug!(sentence = sentence.id(), "skipping empty sentence");
      return Ok(());
    }

    for k in 0..sentence.num_kbest() {
      let mut chart = Chart::new(&self.grammar);
      chart.load_sentence(sentence, k);
      chart.parse()?;

      let mut tree = chart.get_tree(chart.size() - 1, 0)?;

      let leaves = tree.leaves_mut();
      if leaves.len() != sentence.len() {
        return Err(
          format!(
            "inconsistent chart: tree has {} leaves for {} words",
            leaves.len(),
            sentence.len()
          )
          .into(),
        );
      }
      for (leaf, word) in leaves.into_iter().zip(sentence.words()) {
        leaf.node.label = word.tag(k).to_string();
        leaf.node.word = Some(word.clone());
      }

      tree.build_node_index(sentence.id());
      sentence.set_parse_tree(tree, k);
      debug!(sentence = sentence.id(), kbest = k, "parse tree set");
    }

    Ok(())
  }

  /// Parses every sentence, stopping at the first one the chart can't handle.
  pub fn analyze_all(&self, sentences: &mut [Sentence]) -> Result<(), Err> {
    for s in sentences.iter_mut() {
      self.analyze(s)?;
    }
    Ok(())
  }
}

#[cfg(test)]
use crate::grammar::RuleSet;

#[cfg(test)]
const GRAMMAR: &str = r#"
  sn ==> DT, +NN | +NN .
  sv ==> +VBZ .
  s ==> sn, +sv .
  @NOTOP sn .
  @START S .
"#;

#[test]
fn test_analyze() {
  let parser = ChartParser::new(GRAMMAR.parse::<RuleSet>().unwrap());
  let mut s = Sentence::from_tagged("7", "The the DT\ncat cat NN\nsleeps sleep VBZ").unwrap();
  parser.analyze(&mut s).unwrap();

  let tree = s.parse_tree(0).unwrap();
  assert_eq!(tree.label(), "s");
  assert_eq!(tree.node.id.as_deref(), Some("7.0"));

  let leaves = tree.leaves().collect::<Vec<_>>();
  let tags = leaves.iter().map(|l| l.label()).collect::<Vec<_>>();
  assert_eq!(tags, vec!["DT", "NN", "VBZ"]);
  let forms = leaves
    .iter()
    .map(|l| l.node.word.as_ref().unwrap().form.as_str())
    .collect::<Vec<_>>();
  assert_eq!(forms, vec!["The", "cat", "sleeps"]);

  assert_eq!(tree.head_word().unwrap().form, "sleeps");
  assert_eq!(tree.node_by_id("7.2").unwrap().label(), "DT");
}

#[test]
fn test_analyze_every_sequence() {
  let parser = ChartParser::new(GRAMMAR.parse::<RuleSet>().unwrap());
  let mut s = Sentence::from_tagged("8", "the the DT the DT\nfish fish NN fish VBZ").unwrap();
  parser.analyze(&mut s).unwrap();

  let first = s.parse_tree(0).unwrap();
  assert_eq!(first.label(), "S");
  assert_eq!(first.children[0].label(), "sn");

  let second = s.parse_tree(1).unwrap();
  assert_eq!(second.label(), "S");
  let tags = second.leaves().map(|l| l.label()).collect::<Vec<_>>();
  assert_eq!(tags, vec!["DT", "VBZ"]);
}

#[test]
fn test_leaves_cover_sentence() {
  let parser = ChartParser::new(GRAMMAR.parse::<RuleSet>().unwrap());
  let text = "sleeps sleep VBZ\nthe the DT\nthe the DT\ncat cat NN\nquickly quickly RB";
  let mut s = Sentence::from_tagged("9", text).unwrap();
  parser.analyze(&mut s).unwrap();

  let tree = s.parse_tree(0).unwrap();
  let forms = tree
    .leaves()
    .map(|l| l.node.word.as_ref().unwrap().form.clone())
    .collect::<Vec<_>>();
  assert_eq!(forms, vec!["sleeps", "the", "the", "cat", "quickly"]);
}

#[test]
fn test_hidden_only_analysis() {
  let g: RuleSet = "x ==> DT, +NN . @HIDDEN x . @START S .".parse().unwrap();
  let parser = ChartParser::new(g);
  let mut s = Sentence::from_tagged("11", "the the DT\ncat cat NN").unwrap();
  parser.analyze(&mut s).unwrap();

  let tree = s.parse_tree(0).unwrap();
  assert_eq!(tree.label(), "S");
  let tags = tree.leaves().map(|l| l.label()).collect::<Vec<_>>();
  assert_eq!(tags, vec!["DT", "NN"]);
}

#[test]
fn test_empty_sentence() {
  let parser = ChartParser::new(GRAMMAR.parse::<RuleSet>().unwrap());
  let mut s = Sentence::new("10", Vec::new()).unwrap();
  parser.analyze(&mut s).unwrap();
  assert!(s.parse_tree(0).is_none());
}
