//! HTML form harvesting for the site's dialogs and login page.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Form parameters in document order. Setting a name that is already
/// present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Merges `other` over these fields.
    pub fn update<K, V>(&mut self, other: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in other {
            self.set(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        fields.update(iter);
        fields
    }
}

impl IntoIterator for FormFields {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Which inputs [`harvest_form`] collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Harvest {
    /// Text, hidden and checked radio/checkbox inputs, plus textareas.
    Full,
    /// Text inputs and textareas only.
    TextOnly,
}

/// Collects the values a browser would submit for `form`.
///
/// A checked radio or checkbox without a value submits `on`; one with an
/// empty value is skipped.
pub fn harvest_form(form: ElementRef<'_>, harvest: Harvest) -> FormFields {
    let inputs = Selector::parse("input[name]").expect("invalid selector");
    let textareas = Selector::parse("textarea[name]").expect("invalid selector");

    let mut fields = FormFields::new();
    for input in form.select(&inputs) {
        let element = input.value();
        let Some(name) = element.attr("name") else {
            continue;
        };
        let kind = element.attr("type").unwrap_or("text").to_ascii_lowercase();
        match (kind.as_str(), harvest) {
            ("text", _) | ("hidden", Harvest::Full) => {
                fields.set(name, element.attr("value").unwrap_or(""));
            }
            ("radio" | "checkbox", Harvest::Full) if element.attr("checked").is_some() => {
                let value = element.attr("value").unwrap_or("on");
                if !value.is_empty() {
                    fields.set(name, value);
                }
            }
            _ => {}
        }
    }
    for textarea in form.select(&textareas) {
        if let Some(name) = textarea.value().attr("name") {
            fields.set(name, textarea.text().collect::<String>());
        }
    }
    fields
}

/// Harvests the first form in `document`.
pub fn first_form(document: &Html, harvest: Harvest) -> Option<FormFields> {
    let selector = Selector::parse("form").expect("invalid selector");
    document
        .select(&selector)
        .next()
        .map(|form| harvest_form(form, harvest))
}

/// A form whose action resolves to `target` when taken relative to it.
pub struct TargetForm {
    pub action: Url,
    pub fields: FormFields,
}

/// Finds the form posting back to `target`, the way the login page does.
pub fn find_form_posting_to(document: &Html, target: &Url) -> Option<TargetForm> {
    let selector = Selector::parse("form").expect("invalid selector");
    document.select(&selector).find_map(|form| {
        let action = target.join(form.value().attr("action").unwrap_or("")).ok()?;
        (action == *target).then(|| TargetForm {
            action,
            fields: harvest_form(form, Harvest::Full),
        })
    })
}

/// Parses an HTML fragment as the body of an otherwise empty document.
pub fn parse_fragment(fragment: &str) -> Html {
    Html::parse_document(&format!("<html><body>{}</body></html>", fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIALOG: &str = r#"
        <form action="/a/editprofile" method="post">
          <input type="hidden" name="stream" value="g1">
          <input type="text" name="name" value="Rustaceans">
          <input name="nickname" value="rust">
          <input type="password" name="secret" value="x">
          <input type="radio" name="access" value="private">
          <input type="radio" name="access" value="public" checked>
          <input type="checkbox" name="anyoneinvite" checked>
          <input type="checkbox" name="blank" value="" checked>
          <input type="checkbox" name="unchecked" value="1">
          <input type="submit" name="go" value="Save">
          <textarea name="description">All things
Rust</textarea>
        </form>
        <form action="/other"><input type="text" name="other" value="no"></form>
    "#;

    #[test]
    fn harvests_like_a_browser() {
        let document = parse_fragment(DIALOG);
        let fields = first_form(&document, Harvest::Full).unwrap();
        assert_eq!(fields.get("stream"), Some("g1"));
        assert_eq!(fields.get("name"), Some("Rustaceans"));
        assert_eq!(fields.get("nickname"), Some("rust"));
        assert_eq!(fields.get("access"), Some("public"));
        assert_eq!(fields.get("anyoneinvite"), Some("on"));
        assert_eq!(fields.get("description"), Some("All things\nRust"));
        for missing in ["secret", "blank", "unchecked", "go", "other"] {
            assert!(!fields.contains(missing), "{missing} should be skipped");
        }
    }

    #[test]
    fn text_only_skips_hidden_and_choices() {
        let document = parse_fragment(DIALOG);
        let fields = first_form(&document, Harvest::TextOnly).unwrap();
        let names: Vec<&str> = fields.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["name", "nickname", "description"]);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut fields: FormFields = [("stream", "g1"), ("name", "old")].into_iter().collect();
        fields.update([("name", "new"), ("access", "private")]);
        assert_eq!(
            fields.into_pairs(),
            vec![
                ("stream".to_string(), "g1".to_string()),
                ("name".to_string(), "new".to_string()),
                ("access".to_string(), "private".to_string()),
            ]
        );
    }

    #[test]
    fn finds_the_form_posting_to_the_target() {
        let target = Url::parse("https://friendfeed.com/account/login?v=2").unwrap();
        let document = Html::parse_document(
            r#"<form action="/search"><input name="q"></form>
               <form action="/account/login?v=2" method="post">
                 <input type="hidden" name="next" value="/">
                 <input type="text" name="email">
                 <input type="password" name="password">
               </form>"#,
        );
        let form = find_form_posting_to(&document, &target).unwrap();
        assert_eq!(form.action, target);
        assert_eq!(form.fields.get("next"), Some("/"));
        assert_eq!(form.fields.get("email"), Some(""));

        let elsewhere = Url::parse("https://friendfeed.com/account/api").unwrap();
        assert!(find_form_posting_to(&document, &elsewhere).is_none());
    }
}
