use crate::models::HNode;

use super::lower::WIKILINK_ATTR;
use super::{RenderContext, flat_map_hnodes};

pub const EXTERNAL_CLASS: &str = "external-link";

const EXTERNAL_SCHEMES: &[&str] = &["http://", "https://", "mailto:"];

/// Whether `href` leaves the vault.
pub fn is_external(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    EXTERNAL_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) || lower.starts_with("//")
}

/// Marks links that leave the vault with `external-link` and, when
/// configured, opens them in a new tab.
pub fn run(nodes: Vec<HNode>, ctx: &mut RenderContext) -> Vec<HNode> {
    let new_tab = ctx.external_links_new_tab;
    flat_map_hnodes(nodes, &mut |node| match node {
        HNode::Element(mut element)
            if element.tag == "a"
                && element.attr(WIKILINK_ATTR).is_none()
                && element.attr("href").is_some_and(is_external) =>
        {
            element.add_class(EXTERNAL_CLASS);
            if new_tab {
                element
                    .attributes
                    .insert("target".into(), "_blank".into());
                element
                    .attributes
                    .insert("rel".into(), "noopener noreferrer".into());
            }
            vec![HNode::Element(element)]
        }
        other => vec![other],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Element;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com", true)]
    #[case("HTTP://EXAMPLE.COM", true)]
    #[case("//cdn.example.com/x", true)]
    #[case("mailto:me@example.com", true)]
    #[case("/Notes/Other", false)]
    #[case("#heading", false)]
    fn classifies_hrefs(#[case] href: &str, #[case] external: bool) {
        assert_eq!(is_external(href), external);
    }

    #[test]
    fn external_links_open_in_new_tab() {
        let tree = vec![Element::new("a").with_attr("href", "https://x.dev").into()];
        let mut ctx = RenderContext {
            external_links_new_tab: true,
            ..RenderContext::default()
        };
        let once = run(tree, &mut ctx);
        insta::assert_snapshot!(
            HNode::fragment(once.clone()).to_html(),
            @r#"<a class="external-link" href="https://x.dev" rel="noopener noreferrer" target="_blank"></a>"#
        );
        assert_eq!(run(once.clone(), &mut ctx), once);
    }

    #[test]
    fn new_tab_can_be_disabled() {
        let tree = vec![Element::new("a").with_attr("href", "https://x.dev").into()];
        let mut ctx = RenderContext {
            external_links_new_tab: false,
            ..RenderContext::default()
        };
        let out = run(tree, &mut ctx);
        let link = out[0].as_element().expect("element");
        assert!(link.has_class(EXTERNAL_CLASS));
        assert_eq!(link.attr("target"), None);
    }
}
