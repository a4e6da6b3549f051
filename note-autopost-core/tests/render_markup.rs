use note_autopost_core::render::{render, render_with, RenderOptions};

#[test]
fn heading_and_paragraph() {
    assert_eq!(
        render("# Title\n\nBody text"),
        "<h1>Title</h1>\n<p>Body text</p>"
    );
}

#[test]
fn all_heading_levels_convert_per_line() {
    let html = render("### three\n## two\n# one");
    assert_eq!(html, "<h3>three</h3>\n<h2>two</h2>\n<h1>one</h1>");
}

#[test]
fn h1_rule_can_be_disabled() {
    let options = RenderOptions {
        h1: false,
        ..RenderOptions::default()
    };
    assert_eq!(render_with("# kept", &options), "<p># kept</p>");
    assert_eq!(render_with("## still h2", &options), "<h2>still h2</h2>");
}

#[test]
fn list_items_have_no_container() {
    let html = render("- a\n- b");
    assert_eq!(html, "<li>a</li>\n<li>b</li>");
    assert!(!html.contains("<ul>"));
    assert!(!html.contains("<ol>"));
}

#[test]
fn strong_is_non_greedy_and_repeated() {
    assert_eq!(
        render("**bold** and plain"),
        "<p><strong>bold</strong> and plain</p>"
    );
    assert_eq!(
        render("**a** x **b**"),
        "<p><strong>a</strong> x <strong>b</strong></p>"
    );
}

#[test]
fn blocks_led_by_inline_emphasis_are_still_wrapped() {
    assert_eq!(
        render("**Note**: x\nmore"),
        "<p><strong>Note</strong>: x\nmore</p>"
    );
    assert_eq!(
        render("## Head\n\n**lead** text"),
        "<h2>Head</h2>\n<p><strong>lead</strong> text</p>"
    );
}

#[test]
fn fenced_code_spans_newlines() {
    let html = render("```let x = 1;\nlet y = 2;```");
    assert_eq!(html, "<pre><code>let x = 1;\nlet y = 2;</code></pre>");
}

#[test]
fn fenced_code_rule_can_be_disabled() {
    let options = RenderOptions {
        code_blocks: false,
        ..RenderOptions::default()
    };
    assert_eq!(render_with("```x```", &options), "<p>```x```</p>");
}

#[test]
fn single_block_is_wrapped_once() {
    assert_eq!(
        render("  line one\nline two  "),
        "<p>line one\nline two</p>"
    );
}

#[test]
fn tag_led_blocks_pass_through() {
    assert_eq!(render("<div>raw</div>"), "<div>raw</div>");
}

#[test]
fn empty_blocks_are_dropped_by_default() {
    assert_eq!(render("a\n\n\n\nb"), "<p>a</p>\n<p>b</p>");
    assert_eq!(render(""), "");
    assert_eq!(render("   \n\n  "), "");
}

#[test]
fn empty_blocks_can_be_kept() {
    let options = RenderOptions {
        keep_empty_paragraphs: true,
        ..RenderOptions::default()
    };
    assert_eq!(render_with("a\n\n\n\nb", &options), "<p>a</p>\n<p></p>\n<p>b</p>");
}

#[test]
fn crlf_input_is_normalised() {
    assert_eq!(
        render("## Head\r\n\r\nbody"),
        "<h2>Head</h2>\n<p>body</p>"
    );
}

#[test]
fn rendering_is_stable_on_its_own_headings() {
    let once = render("# One\n## Two\n### Three\n\ntext");
    let twice = render(&once);
    assert_eq!(once, twice);
    assert!(twice.lines().all(|line| !line.starts_with('#')));
}

#[test]
fn generated_article_shape() {
    let markup = "## はじめに\n導入です。\n\n## メインコンテンツ\n- **ポイント1**\n- ポイント2\n\n## まとめ\n以上です。";
    let html = render(markup);
    assert_eq!(
        html,
        "<h2>はじめに</h2>\n導入です。\n\
         <h2>メインコンテンツ</h2>\n<li><strong>ポイント1</strong></li>\n<li>ポイント2</li>\n\
         <h2>まとめ</h2>\n以上です。"
    );
}
