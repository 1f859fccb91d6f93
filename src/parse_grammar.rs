use regex::Regex;
/// Simple recursive-descent parsing of chunk grammar files
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::grammar::{Grammar, RuleSet};
use crate::rules::{Governor, Rule};
use crate::Err;

impl FromStr for RuleSet {
  type Err = Err;

  /// Parses a grammar from a string. Quoted file references are resolved
  /// against the current directory.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_rule_set(s, Path::new("."))
  }
}

impl RuleSet {
  /// Loads a grammar file. Quoted file references inside it are resolved
  /// relative to the directory holding the grammar.
  pub fn read_from_file(filename: impl AsRef<Path>) -> Result<Self, Err> {
    let filename = filename.as_ref();
    let src = fs::read_to_string(filename)
      .map_err(|e| -> Err { format!("error opening file {}: {}", filename.display(), e).into() })?;
    let base = filename.parent().unwrap_or_else(|| Path::new("."));
    parse_rule_set(&src, base)
  }
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Err>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  match re.find(s) {
    Some(m) if m.start() == 0 => {
      let (_, rest) = s.split_at(m.end());
      (Some(m.as_str()), rest)
    }
    _ => (None, s),
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at {}", re, excerpt(s)).into())
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Only show the start of the remaining input in error messages
fn excerpt(s: &str) -> &str {
  match s.char_indices().nth(30) {
    Some((idx, _)) => &s[..idx],
    None => s,
  }
}

/// Skips whitespace and `%` comments
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"^(\s+|%[^\n]*)+");
  optional_re(&*WHITESPACE_OR_COMMENT, s).1
}

/// Tag-like category name, possibly ending in a wildcard: `VMI*`, `grup-sp`
fn parse_category(s: &str) -> ParseResult<&str> {
  regex_static!(CATEGORY, r"^[A-Za-z][\-A-Za-z0-9]*\*?");
  needed_re(&*CATEGORY, s).map_err(|e| format!("category: {}", e).into())
}

/// A condition on a category, either literal or referring to a file
enum Condition<'a> {
  Literal(&'a str),
  File(&'a str),
}

fn parse_condition(s: &str) -> Infallible<Option<Condition>> {
  regex_static!(FORM, r"^\([\p{Alphabetic}_'\-·]+\)");
  regex_static!(LEMMA, r"^<[\p{Lowercase}_'\-·]+>");
  regex_static!(FILE_FORM, r#"^\("([A-Za-z]:)?[\p{Alphabetic}0-9_\-\./\\]+"\)"#);
  regex_static!(FILE_LEMMA, r#"^<"([A-Za-z]:)?[\p{Alphabetic}0-9_\-\./\\]+">"#);

  for re in [&*FILE_FORM, &*FILE_LEMMA] {
    if let (Some(c), rest) = optional_re(re, s) {
      return (Some(Condition::File(c)), rest);
    }
  }
  for re in [&*FORM, &*LEMMA] {
    if let (Some(c), rest) = optional_re(re, s) {
      return (Some(Condition::Literal(c)), rest);
    }
  }
  (None, s)
}

/// Grammar under construction
struct Builder<'p> {
  set: RuleSet,
  base: &'p Path,
  next_prior: usize,
}

impl Builder<'_> {
  /// Registers every line of a referenced file as an accepted form or lemma.
  fn load_condition_file(&mut self, reference: &str) -> Result<(), Err> {
    let (open, close) = if reference.starts_with('<') {
      ("<", ">")
    } else {
      ("(", ")")
    };
    let name = reference[1..reference.len() - 1].trim_matches('"');
    let path: PathBuf = self.base.join(name);
    let contents = fs::read_to_string(&path)
      .map_err(|e| -> Err { format!("error opening file {}: {}", path.display(), e).into() })?;

    for line in contents.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
      self
        .set
        .add_file_condition(format!("{}{}{}", open, line, close), reference.to_string());
    }
    tracing::debug!(file = %path.display(), "condition file loaded");
    Ok(())
  }
}

/// `+`? category condition?
fn parse_element<'a>(b: &mut Builder, s: &'a str) -> ParseResult<'a, (bool, String)> {
  let (plus, s) = optional_char('+', s);
  let s = skip_whitespace(s);
  let (category, s) = parse_category(s)?;
  let s = skip_whitespace(s);

  let (condition, s) = parse_condition(s);
  let pattern = match condition {
    None => category.to_string(),
    Some(Condition::Literal(c)) => format!("{}{}", category, c),
    Some(Condition::File(c)) => {
      b.load_condition_file(c)?;
      format!("{}{}", category, c)
    }
  };

  Ok(((plus.is_some(), pattern), s))
}

/// HEAD ==> a, +b | c .
fn parse_rule<'a>(b: &mut Builder, s: &'a str) -> ParseResult<'a, ()> {
  #![allow(clippy::trivial_regex)]
  regex_static!(ARROW, "^==>");

  let (head, s) = parse_category(s).map_err(|e| -> Err { format!("rule head: {}", e).into() })?;
  let s = skip_whitespace(s);
  let (_, s) = needed_re(&*ARROW, s).map_err(|e| -> Err { format!("rule arrow: {}", e).into() })?;

  let mut right = Vec::new();
  let mut governor = None;
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    let ((is_gov, pattern), s) = parse_element(b, rem)
      .map_err(|e| -> Err { format!("rule {} production: {}", head, e).into() })?;
    if is_gov {
      if governor.is_some() {
        return Err(format!("rule {}: more than one governor", head).into());
      }
      governor = Some(right.len());
    }
    right.push(pattern);

    rem = skip_whitespace(s);
    let next = rem.chars().next();
    match next {
      Some(',') => {}
      Some('|') | Some('.') => {
        let governor = match governor.take() {
          Some(g) => Governor::Child(g),
          None => {
            if right.len() != 1 {
              tracing::warn!(rule = %head, "non-unary rule with no governor, first component taken as governor");
            }
            Governor::default()
          }
        };
        b.set.add_rule(Rule::new(head, std::mem::take(&mut right), governor));
      }
      _ => return Err(format!("rule {}: expected ',', '|' or '.' at {}", head, excerpt(rem)).into()),
    }
    rem = &rem[1..];
    if next == Some('.') {
      return Ok(((), rem));
    }
  }
}

/// @PRIOR a b c .   or   @START S .
fn parse_directive<'a>(b: &mut Builder, s: &'a str) -> ParseResult<'a, ()> {
  regex_static!(DIRECTIVE, r"^@[A-Z]+");

  let (name, s) = needed_re(&*DIRECTIVE, s)?;
  let mut categories = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if let (Some(_), s) = optional_char('.', rem) {
      rem = s;
      break;
    }
    let (category, s) =
      parse_category(rem).map_err(|e| -> Err { format!("directive {}: {}", name, e).into() })?;
    categories.push(category);
    rem = s;
  }

  if name == "@START" {
    if categories.len() != 1 {
      return Err("@START takes exactly one category".into());
    }
    if !b.set.start.is_empty() {
      return Err("@START specified more than once".into());
    }
    b.set.start = categories[0].to_string();
    b.set.nonterminals.insert(b.set.start.clone());
    return Ok(((), rem));
  }

  for category in categories {
    if b.set.is_terminal(category) {
      return Err(format!("terminal symbol '{}' not allowed in directive {}", category, name).into());
    }
    let category = category.to_string();
    match name {
      "@PRIOR" => {
        b.set.prior.entry(category).or_insert(b.next_prior);
        b.next_prior += 1;
      }
      "@HIDDEN" => {
        b.set.hidden.insert(category);
      }
      "@FLAT" => {
        b.set.flat.insert(category);
      }
      "@NOTOP" => {
        b.set.notop.insert(category);
      }
      "@ONLYTOP" => {
        b.set.onlytop.insert(category);
      }
      _ => return Err(format!("unknown directive {}", name).into()),
    }
  }

  Ok(((), rem))
}

fn parse_rule_set(s: &str, base: &Path) -> Result<RuleSet, Err> {
  let mut b = Builder {
    set: RuleSet::default(),
    base,
    next_prior: 1,
  };

  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      break;
    }
    let ((), s) = if rem.starts_with('@') {
      parse_directive(&mut b, rem)?
    } else {
      parse_rule(&mut b, rem)?
    };
    rem = s;
  }

  let set = b.set;
  if set.start.is_empty() {
    return Err("@START symbol not specified".into());
  }
  if set.hidden.contains(&set.start) {
    tracing::warn!(start = %set.start, "@START symbol cannot be @HIDDEN");
  }
  if set.notop.contains(&set.start) {
    tracing::warn!(start = %set.start, "@START symbol cannot be @NOTOP");
  }
  for c in set.onlytop.iter().filter(|c| set.hidden.contains(*c)) {
    tracing::warn!(category = %c, "@HIDDEN directive overrides @ONLYTOP");
  }

  tracing::debug!(rules = set.len(), "grammar loaded");
  Ok(set)
}

#[cfg(test)]
use crate::grammar::DEFAULT_PRIORITY;

#[cfg(test)]
const GRAMMAR: &str = r#"
  % noun phrases
  sn ==> DT, +NN | +NN | sn, +sp .
  sp ==> +IN, sn .
  verb ==> VMI*<comer> .
  adj ==> JJ(big) .

  @PRIOR sp sn .
  @HIDDEN verb .
  @FLAT sn .
  @NOTOP sp .
  @ONLYTOP adj .
  @START S .
"#;

#[test]
fn test_parse_rules() {
  let g: RuleSet = GRAMMAR.parse().unwrap();

  assert_eq!(g.start_symbol(), "S");
  assert_eq!(g.len(), 6);

  let from_dt = g.rules_with_rhs_starting("DT");
  assert_eq!(from_dt.len(), 1);
  assert_eq!(from_dt[0].head, "sn");
  assert_eq!(from_dt[0].right, vec!["DT", "NN"]);
  assert_eq!(from_dt[0].governor, Governor::Child(1));

  let from_sn = g.rules_with_rhs_starting("sn");
  assert_eq!(from_sn[0].governor, Governor::Child(1));

  let from_in = g.rules_with_rhs_starting("IN");
  assert_eq!(from_in[0].governor, Governor::Child(0));

  assert_eq!(g.rules_with_rhs_starting("JJ(big)").len(), 1);
  assert_eq!(g.wildcard_rules_for_prefix('V').len(), 1);
  assert_eq!(g.wildcard_rules_for_prefix('V')[0].right, vec!["VMI*<comer>"]);
}

#[test]
fn test_parse_directives() {
  let g: RuleSet = GRAMMAR.parse().unwrap();

  assert_eq!(g.priority("sp"), 1);
  assert_eq!(g.priority("sn"), 2);
  assert_eq!(g.priority("verb"), DEFAULT_PRIORITY);
  assert!(g.is_hidden("verb"));
  assert!(g.is_flat("sn"));
  assert!(g.is_notop("sp"));
  assert!(g.is_onlytop("adj"));
  assert!(!g.is_terminal("S"));
  assert!(g.is_terminal("NN"));
}

#[test]
fn test_missing_start() {
  assert!("sn ==> NN .".parse::<RuleSet>().is_err());
}

#[test]
fn test_repeated_start() {
  assert!("sn ==> NN . @START S . @START T .".parse::<RuleSet>().is_err());
}

#[test]
fn test_terminal_in_directive() {
  assert!("sn ==> NN . @HIDDEN NN . @START S .".parse::<RuleSet>().is_err());
}

#[test]
fn test_unterminated_rule() {
  assert!("sn ==> DT, NN @START S .".parse::<RuleSet>().is_err());
}

#[test]
fn test_condition_file() {
  let dir = std::env::temp_dir().join(format!("chunkparse-grammar-{}", std::process::id()));
  fs::create_dir_all(&dir).unwrap();
  fs::write(dir.join("verbs.dat"), "comer\nbeber\n").unwrap();
  fs::write(
    dir.join("test.gram"),
    "verb ==> VMI*<\"verbs.dat\"> .\n@START S .\n",
  )
  .unwrap();

  let g = RuleSet::read_from_file(dir.join("test.gram")).unwrap();
  assert!(g.lookup_literal_condition("<comer>", "<\"verbs.dat\">"));
  assert!(g.lookup_literal_condition("<beber>", "<\"verbs.dat\">"));
  assert!(!g.lookup_literal_condition("<dormir>", "<\"verbs.dat\">"));

  fs::remove_dir_all(&dir).unwrap();
}
