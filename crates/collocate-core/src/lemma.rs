//! Lemma dictionaries.
//!
//! A lemma groups a canonical word with its registered alternate surface
//! forms (`go` with `goes`, `went`, `gone`). Lemma folding replaces forms with
//! their lemma inside context windows and adds the forms' corpus frequencies
//! to the lemma's marginal frequency.

use std::collections::HashMap;

/// Lookup interface for a lemma dictionary collaborator.
pub trait LemmaDictionary {
    /// The canonical form registered for `form`, if any.
    fn canonical(&self, form: &str) -> Option<&str>;

    /// The alternate forms registered for `lemma` (empty when unknown).
    fn alternates(&self, lemma: &str) -> &[String];
}

/// In-memory lemma dictionary.
#[derive(Debug, Clone, Default)]
pub struct LemmaList {
    forms: HashMap<String, Vec<String>>,
    canonical: HashMap<String, String>,
    ignore_case: bool,
}

impl LemmaList {
    /// Create an empty lemma list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Match forms regardless of case.
    pub fn ignore_case(mut self, ignore: bool) -> Self {
        self.ignore_case = ignore;
        let entries: Vec<(String, Vec<String>)> = self.forms.drain().collect();
        self.canonical.clear();
        for (lemma, forms) in entries {
            self.insert(lemma, forms);
        }
        self
    }

    /// Register `lemma` with its alternate `forms`.
    ///
    /// Registering the same lemma twice appends the new forms.
    pub fn insert<I, S>(&mut self, lemma: impl Into<String>, forms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lemma = lemma.into();
        let entry = self.forms.entry(lemma.clone()).or_default();
        for form in forms {
            let form = form.into();
            if form == lemma || entry.contains(&form) {
                continue;
            }
            let key = if self.ignore_case {
                form.to_lowercase()
            } else {
                form.clone()
            };
            self.canonical.insert(key, lemma.clone());
            entry.push(form);
        }
    }

    /// Number of lemmas registered.
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Whether no lemma is registered.
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl<L, F, S> FromIterator<(L, F)> for LemmaList
where
    L: Into<String>,
    F: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (L, F)>>(iter: T) -> Self {
        let mut list = Self::new();
        for (lemma, forms) in iter {
            list.insert(lemma, forms);
        }
        list
    }
}

impl LemmaDictionary for LemmaList {
    fn canonical(&self, form: &str) -> Option<&str> {
        let found = if self.ignore_case {
            self.canonical.get(&form.to_lowercase())
        } else {
            self.canonical.get(form)
        };
        found.map(String::as_str)
    }

    fn alternates(&self, lemma: &str) -> &[String] {
        self.forms.get(lemma).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn go() -> LemmaList {
        [("go", vec!["goes", "went", "gone"])].into_iter().collect()
    }

    #[test]
    fn canonical_lookup() {
        let list = go();
        assert_eq!(list.canonical("went"), Some("go"));
        assert_eq!(list.canonical("go"), None);
        assert_eq!(list.canonical("Went"), None);
    }

    #[test]
    fn alternates_lookup() {
        let list = go();
        assert_eq!(list.alternates("go"), ["goes", "went", "gone"]);
        assert!(list.alternates("run").is_empty());
    }

    #[test]
    fn ignore_case_matches_any_case() {
        let list = go().ignore_case(true);
        assert_eq!(list.canonical("WENT"), Some("go"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn duplicate_forms_are_ignored() {
        let mut list = go();
        list.insert("go", ["went", "going", "go"]);
        assert_eq!(list.alternates("go"), ["goes", "went", "gone", "going"]);
    }
}
