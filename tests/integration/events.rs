// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Log events published by the facade.

use crate::common::{config_at, test_logger};
use logcore::logging::EventKind;
use logcore::Severity;
use std::sync::{Arc, Mutex};

#[test]
fn test_panicking_subscriber_does_not_block_the_next() {
    let t = test_logger(config_at(Severity::Trace));
    let seen = Arc::new(Mutex::new(Vec::new()));

    t.logger.events().on(EventKind::Log, |_| panic!("listener bug"));
    let s = Arc::clone(&seen);
    t.logger.events().on(EventKind::Log, move |entry| {
        s.lock().unwrap().push(entry.message.clone());
    });

    t.logger.info("Chat", "first");
    t.logger.warn("Chat", "second");

    assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(
        t.console
            .count_containing("event subscriber for 'log' panicked: listener bug"),
        2
    );
    // The entry still reached the sinks
    assert_eq!(t.console.count_containing("[INFO][Chat] first"), 1);
}

#[test]
fn test_level_events_follow_generic_event() {
    let t = test_logger(config_at(Severity::Trace));
    let order = Arc::new(Mutex::new(Vec::new()));

    let o = Arc::clone(&order);
    t.logger.events().on(EventKind::Level(Severity::Error), move |entry| {
        o.lock().unwrap().push(format!("log:error {}", entry.message));
    });
    let o = Arc::clone(&order);
    t.logger.events().on(EventKind::Log, move |entry| {
        o.lock().unwrap().push(format!("log {}", entry.message));
    });

    t.logger.error("Effects", "broken");
    t.logger.warn("Effects", "no level listener");

    assert_eq!(
        *order.lock().unwrap(),
        vec!["log broken", "log:error broken", "log no level listener"]
    );
}

#[test]
fn test_unsubscribe_through_facade() {
    let t = test_logger(config_at(Severity::Trace));
    let count = Arc::new(Mutex::new(0));

    let c = Arc::clone(&count);
    let id = t.logger.events().on(EventKind::Log, move |_| {
        *c.lock().unwrap() += 1;
    });
    t.logger.info("M", "counted");

    assert!(t.logger.events().off(EventKind::Log, id));
    assert!(!t.logger.events().off(EventKind::Log, id));
    t.logger.info("M", "not counted");

    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn test_subscriber_may_log_again() {
    let t = test_logger(config_at(Severity::Trace));
    let logger = t.logger.clone();
    t.logger
        .events()
        .on(EventKind::Level(Severity::Error), move |entry| {
            logger.info("Alerts", &format!("saw error from {}", entry.module));
        });

    t.logger.error("Chat", "bad");

    assert_eq!(t.console.count_containing("[INFO][Alerts] saw error from Chat"), 1);
    assert_eq!(t.logger.statistics().counters.total_logs, 2);
}
