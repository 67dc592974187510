use pretty_assertions::assert_eq;
use spider_core::{
    select_seeds, HistoryHandle, HistoryType, HttpMessage, ScanContext, ScanTarget, SiteTree,
    SiteTreeError,
};
use spider_engine::{MemorySiteTree, ResultsLog};
use url::Url;

fn page(uri: &str, content_type: &str) -> HttpMessage {
    HttpMessage::get(Url::parse(uri).unwrap()).with_response(200, Some(content_type))
}

fn names(nodes: Vec<spider_core::NodeRef>) -> Vec<String> {
    nodes.iter().map(|node| node.name().to_string()).collect()
}

#[test]
fn recorded_messages_build_a_path_tree() {
    let tree = MemorySiteTree::new(|_| true);
    tree.record(HistoryType::Proxied, &page("https://example.com/docs/intro?x=1", "text/html"))
        .unwrap();
    tree.record(HistoryType::Proxied, &page("https://example.com/docs/faq", "text/html"))
        .unwrap();

    let site = tree.resolve_start_node("https://example.com/").unwrap();
    assert_eq!(site.name(), "https://example.com");
    assert_eq!(names(site.children()), vec!["https://example.com/docs"]);

    let docs = tree.find("https://example.com/docs").unwrap();
    assert!(docs.resolve_message().unwrap().is_none(), "intermediate node has no history");
    assert_eq!(
        names(docs.children()),
        vec!["https://example.com/docs/intro", "https://example.com/docs/faq"]
    );

    let intro = tree.find("https://example.com/docs/intro").unwrap();
    let message = intro.resolve_message().unwrap().unwrap();
    assert_eq!(message.uri().query(), Some("x=1"));
}

#[test]
fn recording_the_same_path_twice_reuses_the_node() {
    let tree = MemorySiteTree::new(|_| true);
    let first = tree
        .record(HistoryType::Proxied, &page("http://example.com/a", "text/html"))
        .unwrap();
    let second = tree
        .record(HistoryType::Spider, &page("http://example.com/a", "text/html"))
        .unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(tree.history_count(HistoryType::Proxied), 1);
    assert_eq!(tree.history_count(HistoryType::Spider), 1);
}

#[test]
fn scope_and_context_filter_nodes() {
    let tree = MemorySiteTree::scoped_to(vec!["http://example.com".into()]);
    for uri in [
        "http://example.com/",
        "http://example.com/shop/cart",
        "http://other.org/",
    ] {
        tree.record(HistoryType::Proxied, &page(uri, "text/html")).unwrap();
    }

    assert_eq!(
        names(tree.nodes_in_scope()),
        vec![
            "http://example.com",
            "http://example.com/shop",
            "http://example.com/shop/cart"
        ]
    );

    let shop = ScanContext::new("shop").with_prefix("http://example.com/shop");
    assert_eq!(
        names(tree.nodes_in_context(&shop)),
        vec!["http://example.com/shop", "http://example.com/shop/cart"]
    );
}

#[test]
fn unknown_handles_and_schemes_are_rejected() {
    let tree = MemorySiteTree::new(|_| true);
    let message = page("http://example.com/", "text/html");
    assert_eq!(
        tree.add_path(HistoryHandle(99), &message).unwrap_err(),
        SiteTreeError::UnknownHandle(HistoryHandle(99))
    );

    let ftp = page("ftp://example.com/file", "text/plain");
    let err = tree.record(HistoryType::Spider, &ftp).unwrap_err();
    assert!(matches!(err, SiteTreeError::Rejected { .. }));
}

#[test]
fn single_node_seeding_works_over_the_memory_tree() {
    let tree = MemorySiteTree::new(|_| true);
    for (uri, content_type) in [
        ("http://example.com/", "text/html"),
        ("http://example.com/about", "text/html"),
        ("http://example.com/logo.png", "image/png"),
    ] {
        tree.record(HistoryType::Proxied, &page(uri, content_type))
            .unwrap();
    }

    let target = ScanTarget::SingleNode {
        start: tree.resolve_start_node("http://example.com"),
        recurse: true,
    };
    let selection = select_seeds(&target, &tree).unwrap();
    let uris: Vec<String> = selection
        .messages()
        .map(|message| message.uri().to_string())
        .collect();
    assert_eq!(uris, vec!["http://example.com/", "http://example.com/about"]);
}

#[test]
fn results_log_keeps_order_and_duplicates() {
    let log = ResultsLog::new();
    let reader = log.clone();
    log.append("http://example.com/a", "GET", Some("SEED".into()), false);
    log.append("http://example.com/a", "GET", None, false);
    log.append("mailto:x@example.com", "GET", Some("ILLEGAL_PROTOCOL".into()), true);

    let uris: Vec<String> = reader.snapshot().into_iter().map(|r| r.uri).collect();
    assert_eq!(
        uris,
        vec![
            "http://example.com/a",
            "http://example.com/a",
            "mailto:x@example.com"
        ]
    );

    log.clear();
    assert!(reader.is_empty());
}

#[test]
fn results_log_accepts_concurrent_appends() {
    let log = ResultsLog::new();
    let writers: Vec<_> = (0..4)
        .map(|worker| {
            let log = log.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    log.append(format!("http://example.com/{worker}/{i}"), "GET", None, false);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    assert_eq!(log.len(), 200);
}
