use std::sync::LazyLock;

use scraper::{Html, Selector};

/// Sphinx marks cross-references into the same documentation set this way.
static INTERNAL_REF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.reference.internal").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub path: String,
}

/// Strip the scheme from a page URL: `http://pytorch.org/docs/` -> `pytorch.org/docs/`.
pub fn base_path(url: &str) -> Option<&str> {
    url.split("//").nth(1)
}

/// One parsed page. Parsing never fails; broken markup just yields fewer anchors.
pub struct AnchorPage {
    document: Html,
    base_path: String,
}

impl AnchorPage {
    pub fn parse(html: &str, base_path: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            base_path: base_path.to_string(),
        }
    }

    /// Internal references in document order. Anchors without `href` are skipped.
    pub fn candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.document.select(&INTERNAL_REF).filter_map(move |a| {
            let href = a.value().attr("href")?;
            Some(Candidate {
                name: a.text().collect::<String>().trim().to_string(),
                // plain concatenation, matching the mirrored file layout
                path: format!("{}{}", self.base_path, href),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn base_path_strips_scheme() {
        assert_eq!(base_path("http://pytorch.org/docs/"), Some("pytorch.org/docs/"));
        assert_eq!(base_path("https://a.io"), Some("a.io"));
        assert_eq!(base_path("pytorch.org/docs/"), None);
    }

    #[test]
    fn extracts_internal_references_in_order() {
        let page = AnchorPage::parse(&fixture("reference"), "pytorch.org/docs/");
        let got: Vec<Candidate> = page.candidates().collect();
        let names: Vec<&str> = got.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["torch", "torch.Tensor", "torch.nn", "torch.abs"]);
        assert_eq!(got[1].path, "pytorch.org/docs/tensors.html");
        assert_eq!(got[3].path, "pytorch.org/docs/torch.html#torch.abs");
    }

    #[test]
    fn ignores_external_and_unmarked_links() {
        let page = AnchorPage::parse(&fixture("reference"), "pytorch.org/docs/");
        assert!(page.candidates().all(|c| !c.path.contains("github.com")));
        assert!(page.candidates().all(|c| c.name != "Home"));
    }

    #[test]
    fn anchor_without_href_is_skipped() {
        let html = r##"<a class="reference internal">Orphan</a>
                      <a class="reference internal" href="#kept">Kept</a>"##;
        let got: Vec<Candidate> = AnchorPage::parse(html, "site/").candidates().collect();
        assert_eq!(
            got,
            vec![Candidate {
                name: "Kept".into(),
                path: "site/#kept".into()
            }]
        );
    }

    #[test]
    fn malformed_markup_is_best_effort() {
        let html = r#"<div><ul><li><a class="reference internal" href="a.html">  A <em>b</em>
                      </a><li><p><a class="reference internal" href="c.html">C"#;
        let names: Vec<String> = AnchorPage::parse(html, "")
            .candidates()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["A b", "C"]);
    }

    #[test]
    fn no_matches_yields_nothing() {
        let page = AnchorPage::parse("<html><body><p>empty</p>", "site/");
        assert_eq!(page.candidates().count(), 0);
    }

    #[test]
    fn candidates_can_be_walked_again() {
        let page = AnchorPage::parse(&fixture("tutorials"), "pytorch.org/tutorials/");
        let first: Vec<Candidate> = page.candidates().collect();
        let second: Vec<Candidate> = page.candidates().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert_eq!(first[1].path, "pytorch.org/tutorials/beginner/blitz/tensor_tutorial.html");
    }
}
