#[macro_use]
extern crate lazy_static;

pub mod chart;
pub mod chart_parser;
pub mod grammar;
pub mod parse_grammar;
pub mod rules;
pub mod sentence;
pub mod syntree;
pub mod utils;

pub use crate::chart::{Cell, Chart, Edge};
pub use crate::chart_parser::ChartParser;
pub use crate::grammar::{Grammar, RuleSet};
pub use crate::rules::{Governor, Rule};
pub use crate::sentence::{Analysis, Sentence, Word};
pub use crate::syntree::{Node, ParseTree};
pub use crate::utils::Err;

#[test]
fn test_chunk_spanish_sentence() {
  let g: RuleSet = r#"
    % determiners, nouns and adjectives
    espec ==> DA* | DI* .
    n ==> NC* | NP* .
    s-a ==> AQ* .
    sn ==> espec, +n | espec, +n, s-a | +n .
    grup-verb ==> +VMI* | VA*, +VMP* .
    prep ==> SP* .
    grup-sp ==> +prep, sn .
    verb-comer ==> VMI*<comer> .

    @PRIOR verb-comer grup-verb .
    @HIDDEN espec .
    @NOTOP sn grup-sp .
    @START S .
  "#
  .parse()
  .unwrap();

  let text = "El el DA0MS0\n\
              gato gato NCMS000\n\
              negro negro AQ0MS0\n\
              come comer VMIP3S0\n\
              en en SPS00\n\
              la el DA0FS0\n\
              cocina cocina NCFS000";
  let mut s = Sentence::from_tagged("1", text).unwrap();

  let parser = ChartParser::new(g);
  parser.analyze(&mut s).unwrap();
  let tree = s.parse_tree(0).unwrap();

  assert_eq!(tree.label(), "S");
  let chunks = tree.children.iter().map(|c| c.label()).collect::<Vec<_>>();
  assert_eq!(chunks, vec!["sn", "verb-comer", "grup-sp"]);

  // the hidden determiner chunk is replaced by its tag
  let sn = &tree.children[0];
  let tags = sn.children.iter().map(|c| c.label()).collect::<Vec<_>>();
  assert_eq!(tags, vec!["DA0MS0", "n", "s-a"]);
  assert!(sn.children[1].node.head);
  assert_eq!(sn.head_word().unwrap().form, "gato");

  let forms = tree
    .leaves()
    .map(|l| l.node.word.as_ref().unwrap().form.as_str())
    .collect::<Vec<_>>();
  assert_eq!(forms, vec!["El", "gato", "negro", "come", "en", "la", "cocina"]);
}
