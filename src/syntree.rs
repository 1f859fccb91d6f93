use std::fmt;

use crate::sentence::Word;

#[derive(Debug, PartialEq, Clone)]
pub struct Node {
  pub label: String,
  /// Bound only on leaves, once the tree has been matched against a sentence
  pub word: Option<Word>,
  pub head: bool,
  pub id: Option<String>,
}

impl Node {
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      word: None,
      head: false,
      id: None,
    }
  }
}

impl fmt::Display for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.head {
      write!(f, "+")?;
    }
    write!(f, "{}", self.label)?;
    if let Some(w) = &self.word {
      write!(f, "({})", w.form)?;
    }
    Ok(())
  }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ParseTree {
  pub node: Node,
  pub children: Vec<ParseTree>,
}

impl ParseTree {
  pub fn new(node: Node) -> Self {
    Self {
      node,
      children: Vec::new(),
    }
  }

  pub fn label(&self) -> &str {
    &self.node.label
  }

  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  pub fn add_child(&mut self, child: ParseTree) {
    self.children.push(child);
  }

  /// Nodes in pre-order, root first
  pub fn iter(&self) -> Preorder<'_> {
    Preorder { stack: vec![self] }
  }

  pub fn leaves(&self) -> impl Iterator<Item = &ParseTree> {
    self.iter().filter(|t| t.is_leaf())
  }

  /// Leaves in left-to-right order
  pub fn leaves_mut(&mut self) -> Vec<&mut ParseTree> {
    fn collect<'a>(tree: &'a mut ParseTree, out: &mut Vec<&'a mut ParseTree>) {
      if tree.children.is_empty() {
        out.push(tree);
      } else {
        for child in tree.children.iter_mut() {
          collect(child, out);
        }
      }
    }

    let mut out = Vec::new();
    collect(self, &mut out);
    out
  }

  /// Gives every node an id `{sentence_id}.{n}`, numbering in pre-order.
  pub fn build_node_index(&mut self, sentence_id: &str) {
    fn number(tree: &mut ParseTree, sentence_id: &str, next: &mut usize) {
      tree.node.id = Some(format!("{}.{}", sentence_id, next));
      *next += 1;
      for child in tree.children.iter_mut() {
        number(child, sentence_id, next);
      }
    }

    number(self, sentence_id, &mut 0);
  }

  pub fn node_by_id(&self, id: &str) -> Option<&ParseTree> {
    self.iter().find(|t| t.node.id.as_deref() == Some(id))
  }

  /// Leaf bound to the word at position `pos` of the sentence
  pub fn leaf_at(&self, pos: usize) -> Option<&ParseTree> {
    self.leaves().nth(pos)
  }

  /// Follows head children down to a leaf
  pub fn head_word(&self) -> Option<&Word> {
    if self.is_leaf() {
      return self.node.word.as_ref();
    }
    self
      .children
      .iter()
      .find(|c| c.node.head)
      .and_then(ParseTree::head_word)
  }
}

pub struct Preorder<'a> {
  stack: Vec<&'a ParseTree>,
}

impl<'a> Iterator for Preorder<'a> {
  type Item = &'a ParseTree;

  fn next(&mut self) -> Option<Self::Item> {
    let tree = self.stack.pop()?;
    self.stack.extend(tree.children.iter().rev());
    Some(tree)
  }
}

impl fmt::Display for ParseTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_leaf() {
      return write!(f, "{}", self.node);
    }

    write!(f, "{}_[", self.node)?;
    for t in self.children.iter() {
      let fmt = format!("{}", t);
      for line in fmt.lines() {
        write!(f, "\n  {}", line)?;
      }
    }
    write!(f, "\n]")
  }
}

#[cfg(test)]
fn sample() -> ParseTree {
  let mut det = ParseTree::new(Node::new("DT"));
  det.node.word = Some(Word::tagged("the", "the", "DT"));
  let mut noun = ParseTree::new(Node::new("NN"));
  noun.node.word = Some(Word::tagged("cat", "cat", "NN"));
  noun.node.head = true;

  let mut np = ParseTree::new(Node::new("NP"));
  np.add_child(det);
  np.add_child(noun);
  np
}

#[test]
fn test_preorder_and_index() {
  let mut tree = sample();
  tree.build_node_index("s1");

  let ids = tree
    .iter()
    .map(|t| t.node.id.clone().unwrap())
    .collect::<Vec<_>>();
  assert_eq!(ids, vec!["s1.0", "s1.1", "s1.2"]);

  assert_eq!(tree.node_by_id("s1.2").unwrap().label(), "NN");
  assert!(tree.node_by_id("s1.3").is_none());
  assert_eq!(tree.leaf_at(0).unwrap().label(), "DT");
  assert_eq!(tree.leaves_mut().len(), 2);
}

#[test]
fn test_head_word() {
  let tree = sample();
  assert_eq!(tree.head_word().unwrap().form, "cat");
}

#[test]
fn test_display() {
  let tree = sample();
  assert_eq!(tree.to_string(), "NP_[\n  DT(the)\n  +NN(cat)\n]");
}
