use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// Splits a category into its base tag and its trailing literal condition,
/// which is either a `(form)` or a `<lemma>` (possibly a quoted file reference).
/// A category with no condition returns an empty condition.
///
/// ```
/// use chunkparse::utils::split_condition;
///
/// assert_eq!(split_condition("VMI3SP0<comer>"), ("VMI3SP0", "<comer>"));
/// assert_eq!(split_condition("DT(the)"), ("DT", "(the)"));
/// assert_eq!(split_condition("NN"), ("NN", ""));
/// ```
pub fn split_condition(category: &str) -> (&str, &str) {
  match category.find(['(', '<']) {
    Some(idx) => category.split_at(idx),
    None => (category, ""),
  }
}

/// If the pattern contains a wildcard, returns the literal part before it.
pub fn wildcard_prefix(pattern: &str) -> Option<&str> {
  pattern.find('*').map(|idx| &pattern[..idx])
}

/// True if the condition refers to an external file (`<"file">` or `("file")`)
/// instead of carrying a literal form or lemma.
pub fn is_file_reference(condition: &str) -> bool {
  condition.contains('"')
}

#[test]
fn test_wildcard_prefix() {
  assert_eq!(wildcard_prefix("VMI*<comer>"), Some("VMI"));
  assert_eq!(wildcard_prefix("N*"), Some("N"));
  assert_eq!(wildcard_prefix("NP"), None);
}

#[test]
fn test_file_reference() {
  assert!(is_file_reference("<\"verbs.dat\">"));
  assert!(!is_file_reference("<comer>"));
  assert!(!is_file_reference(""));
}
