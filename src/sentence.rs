use std::fmt;

use crate::syntree::ParseTree;
use crate::Err;

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
  pub lemma: String,
  pub tag: String,
}

impl Analysis {
  pub fn new(lemma: impl Into<String>, tag: impl Into<String>) -> Self {
    Self {
      lemma: lemma.into(),
      tag: tag.into(),
    }
  }
}

/// A token, with the analyses selected for it under each k-best tag sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
  pub form: String,
  pub lc_form: String,
  selected: Vec<Vec<Analysis>>,
}

impl Word {
  /// `selected[k]` holds the analyses chosen under sequence `k`
  pub fn new(form: impl Into<String>, selected: Vec<Vec<Analysis>>) -> Self {
    let form = form.into();
    Self {
      lc_form: form.to_lowercase(),
      form,
      selected,
    }
  }

  /// A word with a single analysis and a single tag sequence
  pub fn tagged(form: impl Into<String>, lemma: &str, tag: &str) -> Self {
    Self::new(form, vec![vec![Analysis::new(lemma, tag)]])
  }

  pub fn num_kbest(&self) -> usize {
    self.selected.len()
  }

  pub fn selected(&self, k: usize) -> &[Analysis] {
    self.selected.get(k).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Tag of the first analysis selected under sequence `k`
  pub fn tag(&self, k: usize) -> &str {
    self.selected(k).first().map(|a| a.tag.as_str()).unwrap_or("")
  }

  pub fn lemma(&self, k: usize) -> &str {
    self.selected(k).first().map(|a| a.lemma.as_str()).unwrap_or("")
  }
}

#[derive(Debug, Clone)]
pub struct Sentence {
  id: String,
  words: Vec<Word>,
  kbest: usize,
  trees: Vec<Option<ParseTree>>,
}

impl Sentence {
  /// Fails if the words don't agree on how many tag sequences there are.
  pub fn new(id: impl Into<String>, words: Vec<Word>) -> Result<Self, Err> {
    let kbest = words.first().map(Word::num_kbest).unwrap_or(0);
    if let Some(w) = words.iter().find(|w| w.num_kbest() != kbest) {
      return Err(
        format!(
          "word '{}' has {} tag sequences, expected {}",
          w.form,
          w.num_kbest(),
          kbest
        )
        .into(),
      );
    }

    Ok(Self {
      id: id.into(),
      words,
      kbest,
      trees: vec![None; kbest],
    })
  }

  /// Reads one token per line: `form lemma tag [lemma tag ...]`, where the
  /// i-th lemma/tag pair is the analysis selected under sequence i.
  pub fn from_tagged(id: impl Into<String>, text: &str) -> Result<Self, Err> {
    let mut words = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
      let fields = line.split_whitespace().collect::<Vec<_>>();
      if fields.is_empty() {
        continue;
      }
      if fields.len() < 3 || fields.len() % 2 == 0 {
        return Err(format!("line {}: expected 'form lemma tag [lemma tag ...]': {}", lineno + 1, line).into());
      }

      let selected = fields[1..]
        .chunks(2)
        .map(|pair| vec![Analysis::new(pair[0], pair[1])])
        .collect::<Vec<_>>();
      words.push(Word::new(fields[0], selected));
    }

    Self::new(id, words)
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn words(&self) -> &[Word] {
    &self.words
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  pub fn num_kbest(&self) -> usize {
    self.kbest
  }

  pub fn set_parse_tree(&mut self, tree: ParseTree, k: usize) {
    if k >= self.trees.len() {
      self.trees.resize(k + 1, None);
    }
    self.trees[k] = Some(tree);
  }

  pub fn parse_tree(&self, k: usize) -> Option<&ParseTree> {
    self.trees.get(k).and_then(Option::as_ref)
  }
}

impl fmt::Display for Sentence {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, w) in self.words.iter().enumerate() {
      if idx > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}", w.form)?;
    }
    Ok(())
  }
}

#[test]
fn test_from_tagged() {
  let s = Sentence::from_tagged(
    "1",
    "The the DT\n\
     cat cat NN\n\
     \n\
     sleeps sleep VBZ\n",
  )
  .unwrap();

  assert_eq!(s.len(), 3);
  assert_eq!(s.num_kbest(), 1);
  assert_eq!(s.words()[0].lc_form, "the");
  assert_eq!(s.words()[0].form, "The");
  assert_eq!(s.words()[2].tag(0), "VBZ");
  assert_eq!(s.words()[2].lemma(0), "sleep");
  assert_eq!(s.to_string(), "The cat sleeps");
  assert!(s.parse_tree(0).is_none());
}

#[test]
fn test_kbest_sequences() {
  let s = Sentence::from_tagged("2", "flies fly NNS fly VBZ\nfast fast RB fast JJ").unwrap();
  assert_eq!(s.num_kbest(), 2);
  assert_eq!(s.words()[0].tag(0), "NNS");
  assert_eq!(s.words()[0].tag(1), "VBZ");
  assert_eq!(s.words()[1].tag(1), "JJ");
}

#[test]
fn test_inconsistent_kbest() {
  assert!(Sentence::from_tagged("3", "flies fly NNS fly VBZ\nfast fast RB").is_err());
  assert!(Sentence::from_tagged("3", "flies fly").is_err());
}
