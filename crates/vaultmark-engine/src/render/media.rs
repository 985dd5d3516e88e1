use crate::models::{Element, HNode};
use crate::transform::LinkKind;

use super::lower::EMBED_TAG;
use super::{RenderContext, flat_map_hnodes};

pub const MEDIA_CLASS: &str = "media-embed";

/// Materializes `vault-embed` elements: pdf into an iframe, video and audio
/// into players. Track embeds that no detector claimed become plain links
/// to the file.
pub fn run(nodes: Vec<HNode>, _ctx: &mut RenderContext) -> Vec<HNode> {
    flat_map_hnodes(nodes, &mut |node| match node {
        HNode::Element(element) if element.tag == EMBED_TAG => vec![materialize(&element)],
        other => vec![other],
    })
}

fn materialize(embed: &Element) -> HNode {
    let src = embed.attr("src").unwrap_or_default();
    let target = embed.attr("data-target").unwrap_or(src);
    let kind = embed.attr("data-kind").and_then(LinkKind::from_name);

    let player = match kind {
        Some(LinkKind::Pdf) => Element::new("iframe")
            .with_attr("src", src)
            .with_attr("title", target)
            .with_attr("loading", "lazy"),
        Some(LinkKind::Video) => Element::new("video")
            .with_attr("src", src)
            .with_attr("controls", "")
            .with_attr("preload", "metadata"),
        Some(LinkKind::Audio) => Element::new("audio")
            .with_attr("src", src)
            .with_attr("controls", "")
            .with_attr("preload", "metadata"),
        _ => {
            let mut link = Element::new("a")
                .with_attr("href", src)
                .with_child(HNode::text(target));
            link.add_class("internal-link");
            if let Some(path) = embed.attr("data-path") {
                link = link.with_attr("data-href", path);
            }
            return Element::new("p").with_child(link.into()).into();
        }
    };

    let mut wrapper = Element::new("div").with_attr("data-src", target);
    wrapper.add_class(MEDIA_CLASS);
    if let Some(kind) = kind {
        wrapper.add_class(&format!("{}-embed", kind.as_str()));
    }
    wrapper.with_child(player.into()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn embed(kind: &str, src: &str) -> HNode {
        Element::new(EMBED_TAG)
            .with_attr("data-kind", kind)
            .with_attr("src", src)
            .with_attr("data-path", src.trim_start_matches("/vault"))
            .with_attr("data-target", src.rsplit('/').next().unwrap_or(src))
            .into()
    }

    #[rstest]
    #[case(
        "pdf",
        "/vault/a.pdf",
        r#"<div class="media-embed pdf-embed" data-src="a.pdf"><iframe loading="lazy" src="/vault/a.pdf" title="a.pdf"></iframe></div>"#
    )]
    #[case(
        "video",
        "/vault/v.mp4",
        r#"<div class="media-embed video-embed" data-src="v.mp4"><video controls="" preload="metadata" src="/vault/v.mp4"></video></div>"#
    )]
    #[case(
        "audio",
        "/vault/s.mp3",
        r#"<div class="media-embed audio-embed" data-src="s.mp3"><audio controls="" preload="metadata" src="/vault/s.mp3"></audio></div>"#
    )]
    #[case(
        "track",
        "/vault/r.gpx",
        r#"<p><a class="internal-link" data-href="/r.gpx" href="/vault/r.gpx">r.gpx</a></p>"#
    )]
    fn materializes_by_kind(#[case] kind: &str, #[case] src: &str, #[case] expected: &str) {
        let mut ctx = RenderContext::default();
        let out = run(vec![embed(kind, src)], &mut ctx);
        assert_eq!(HNode::fragment(out).to_html(), expected);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut ctx = RenderContext::default();
        let once = run(vec![embed("pdf", "/vault/a.pdf")], &mut ctx);
        let twice = run(once.clone(), &mut ctx);
        assert_eq!(once, twice);
    }
}
