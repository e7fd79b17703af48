// tests/entity_fallback.rs
//
// Entity strategies are optional: errors, timeouts and empty answers all degrade to
// pattern-only extraction for that block, and never change block order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use calclik::entities::{Entity, EntityStrategy, FixedEntities, LexiconStrategy, NoEntities};
use calclik::pipeline::DEFAULT_ENTITY_TIMEOUT;
use calclik::Scanner;

const DOC: &str = "Tech Summit 2025\nJoin industry leaders on March 15, 2025 at 2:00 PM at the Grand Convention Center in Austin.\n\nRustConf Workshop\nSeptember 2, 2025 9:00 AM at the Moscone Center. Bring a laptop.\n\nPottery Evening\n2025-10-01 18:00 at the Clay Studio";

/// Fails on every second call.
struct Flaky {
    calls: AtomicUsize,
}

#[async_trait]
impl EntityStrategy for Flaky {
    async fn entities(&self, _text: &str) -> anyhow::Result<Vec<Entity>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n % 2 == 1 {
            anyhow::bail!("upstream 503");
        }
        Ok(vec![Entity::new("B-LOC", "Springfield")])
    }
    fn name(&self) -> &'static str {
        "flaky"
    }
}

#[tokio::test]
async fn none_strategy_equals_pattern_scan() {
    let scanner = Scanner::default();
    let with = scanner.scan_with(DOC, &NoEntities, DEFAULT_ENTITY_TIMEOUT).await;
    assert_eq!(with, scanner.scan(DOC));
    assert_eq!(with.len(), 3);
}

#[tokio::test]
async fn errors_fall_back_per_block() {
    let scanner = Scanner::default();
    let flaky = Flaky {
        calls: AtomicUsize::new(0),
    };
    let events = scanner.scan_with(DOC, &flaky, DEFAULT_ENTITY_TIMEOUT).await;
    let plain = scanner.scan(DOC);

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].record.location, "Springfield");
    // second call failed → identical to pattern-only
    assert_eq!(events[1], plain[1]);
    assert_eq!(events[2].record.location, "Springfield");

    let titles: Vec<_> = events.iter().map(|e| e.record.title.clone()).collect();
    assert_eq!(titles, vec!["Tech Summit 2025", "RustConf Workshop", "Pottery Evening"]);
}

#[tokio::test]
async fn organization_spans_become_titles() {
    let strategy = FixedEntities {
        fixed: vec![Entity::new("B-ORG", "Rust"), Entity::new("I-ORG", "##Conf")],
    };
    let events = Scanner::default()
        .scan_with(DOC, &strategy, Duration::from_secs(1))
        .await;
    assert!(events.iter().all(|e| e.record.title == "RustConf"));
}

#[tokio::test]
async fn lexicon_strategy_tags_known_venues() {
    let lex = LexiconStrategy::from_json_str(
        r#"{"patterns":[{"regex":"\\bMoscone Center\\b","entity_type":"LOC"}]}"#,
        "LOC",
    )
    .expect("lexicon");
    let events = Scanner::default()
        .scan_with(DOC, &lex, DEFAULT_ENTITY_TIMEOUT)
        .await;
    assert_eq!(events[1].record.location, "Moscone Center");
    // no lexicon hit → patterns
    assert_eq!(events[0].record.location, "Grand Convention Center");
}
