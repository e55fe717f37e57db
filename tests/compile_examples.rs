use std::collections::BTreeSet;
use uorigin::compiler::{
    compile, compile_list, parse_line, ParsedLine, ResourceType, RuleAction, RuleIdAllocator,
};

#[test]
fn test_block_rule_with_resource_types() {
    let rule = compile("||ads.example.com^$script,image", 1, false).unwrap();
    let expected: BTreeSet<_> = [ResourceType::Script, ResourceType::Image]
        .into_iter()
        .collect();

    assert_eq!(rule.priority, 1);
    assert_eq!(rule.action_type, RuleAction::Block);
    assert_eq!(rule.url_filter, "||ads.example.com");
    assert_eq!(rule.resource_types, Some(expected));
}

#[test]
fn test_allow_line_through_parser() {
    let ParsedLine::AllowFilter(body) = parse_line("@@||cdn.example.com/lib.js|") else {
        panic!("expected an allow filter");
    };
    let rule = compile(body, 1, true).unwrap();
    assert_eq!(rule.url_filter, "||cdn.example.com/lib.js|");
    assert_eq!(rule.priority, 2);
    assert!(rule.resource_types.is_none());
}

#[test]
fn test_comments_and_headers_consume_no_id() {
    assert_eq!(parse_line("! comment"), ParsedLine::Skip);
    assert_eq!(parse_line("[Adblock Plus 2.0]"), ParsedLine::Skip);

    let mut ids = RuleIdAllocator::new(500);
    let list = compile_list("! comment\n[Adblock Plus 2.0]\n", &mut ids, 30_000);
    assert!(list.rules.is_empty());
    assert_eq!(list.next_id, 500);
}

#[test]
fn test_bare_host_is_wildcarded() {
    let rule = compile("trackers.net", 1, false).unwrap();
    assert_eq!(rule.url_filter, "*://trackers.net/*");
}

#[test]
fn test_realistic_list_excerpt() {
    let text = r#"[Adblock Plus 2.0]
! Title: EasyList excerpt
! Homepage: https://easylist.to/
||doubleclick.net^$third-party
||googlesyndication.com^$script,subdocument
@@||ads.example.org/ads.js$script,domain=example.org
/adserver/*$xhr,image
example.com##.sponsored
example.org#@#.ad-slot
||popunder.example^$popup
|https://track.example/pixel
-ad-banner.
"#;
    let mut ids = RuleIdAllocator::new(1000);
    let list = compile_list(text, &mut ids, 30_000);

    let filters: Vec<&str> = list.rules.iter().map(|r| r.url_filter.as_str()).collect();
    assert_eq!(
        filters,
        vec![
            "||ads.example.org/ads.js",
            "||doubleclick.net",
            "||googlesyndication.com",
            "/adserver/*",
            "|https://track.example/pixel",
            "*://-ad-banner./*",
        ]
    );
    assert_eq!(list.next_id, 1006);
    assert!(list.rules[0].is_allow());
    assert_eq!(
        list.rules[3].resource_types,
        Some(
            [ResourceType::Xmlhttprequest, ResourceType::Image]
                .into_iter()
                .collect()
        )
    );
    assert!(list.rules[1].resource_types.is_none());
}
